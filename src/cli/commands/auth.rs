use clap::{Arg, ArgAction, Command, builder::PossibleValuesParser};

use crate::tracker::auth::{MAX_LIFETIME_DAYS, MAX_LIFETIME_MINUTES};

pub const ARG_SECRET_KEY: &str = "secret-key";
pub const ARG_ALGORITHM: &str = "algorithm";
pub const ARG_ACCESS_TOKEN_EXPIRE_MINUTES: &str = "access-token-expire-minutes";
pub const ARG_REFRESH_TOKEN_EXPIRE_DAYS: &str = "refresh-token-expire-days";
pub const ARG_SESSION_LIFETIME_MINUTES: &str = "session-lifetime-minutes";
pub const ARG_COOKIE_SECURE: &str = "cookie-secure";
pub const ARG_BCRYPT_COST: &str = "bcrypt-cost";

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_token_args(command);
    with_session_args(command)
}

fn with_token_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SECRET_KEY)
                .long(ARG_SECRET_KEY)
                .help("Secret used to sign access and refresh tokens")
                .env("TRACKER_SECRET_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_ALGORITHM)
                .long(ARG_ALGORITHM)
                .help("Token signing algorithm")
                .env("TRACKER_ALGORITHM")
                .default_value("HS256")
                .value_parser(PossibleValuesParser::new(["HS256", "HS384", "HS512"])),
        )
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_EXPIRE_MINUTES)
                .long(ARG_ACCESS_TOKEN_EXPIRE_MINUTES)
                .help("Access token TTL in minutes")
                .env("TRACKER_ACCESS_TOKEN_EXPIRE_MINUTES")
                .default_value("30")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_LIFETIME_MINUTES)),
        )
        .arg(
            Arg::new(ARG_REFRESH_TOKEN_EXPIRE_DAYS)
                .long(ARG_REFRESH_TOKEN_EXPIRE_DAYS)
                .help("Refresh token TTL in days")
                .env("TRACKER_REFRESH_TOKEN_EXPIRE_DAYS")
                .default_value("7")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_LIFETIME_DAYS)),
        )
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_LIFETIME_MINUTES)
                .long(ARG_SESSION_LIFETIME_MINUTES)
                .help("Idle timeout of the server-side session in minutes")
                .env("TRACKER_SESSION_LIFETIME_MINUTES")
                .default_value("30")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_LIFETIME_MINUTES)),
        )
        .arg(
            Arg::new(ARG_COOKIE_SECURE)
                .long(ARG_COOKIE_SECURE)
                .help("Mark session and token cookies as Secure")
                .env("TRACKER_COOKIE_SECURE")
                .default_value("true")
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(bool)),
        )
        .arg(
            Arg::new(ARG_BCRYPT_COST)
                .long(ARG_BCRYPT_COST)
                .help("bcrypt work factor for new password hashes")
                .env("TRACKER_BCRYPT_COST")
                .default_value("12")
                .value_parser(clap::value_parser!(u32).range(4..=31)),
        )
}
