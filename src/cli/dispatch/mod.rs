use crate::cli::{
    actions::{Action, server::Args},
    commands::{DEFAULT_DSN, auth},
};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8181);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .unwrap_or_else(|| DEFAULT_DSN.to_string());

    let secret_key = matches
        .get_one::<String>(auth::ARG_SECRET_KEY)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --secret-key")?;

    let algorithm = matches
        .get_one::<String>(auth::ARG_ALGORITHM)
        .cloned()
        .unwrap_or_else(|| "HS256".to_string());

    Ok(Action::Server(Args {
        port,
        dsn,
        secret_key,
        algorithm,
        access_token_expire_minutes: matches
            .get_one::<i64>(auth::ARG_ACCESS_TOKEN_EXPIRE_MINUTES)
            .copied()
            .unwrap_or(30),
        refresh_token_expire_days: matches
            .get_one::<i64>(auth::ARG_REFRESH_TOKEN_EXPIRE_DAYS)
            .copied()
            .unwrap_or(7),
        session_lifetime_minutes: matches
            .get_one::<i64>(auth::ARG_SESSION_LIFETIME_MINUTES)
            .copied()
            .unwrap_or(30),
        cookie_secure: matches
            .get_one::<bool>(auth::ARG_COOKIE_SECURE)
            .copied()
            .unwrap_or(true),
        bcrypt_cost: matches
            .get_one::<u32>(auth::ARG_BCRYPT_COST)
            .copied()
            .unwrap_or(bcrypt::DEFAULT_COST),
    }))
}
