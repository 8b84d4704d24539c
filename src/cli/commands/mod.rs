pub mod auth;
pub mod logging;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const DEFAULT_DSN: &str = "sqlite://exercise-tracker.db?mode=rwc";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("tracker")
        .about("Daily exercise tracker")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8181")
                .env("TRACKER_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .default_value(DEFAULT_DSN)
                .env("TRACKER_DSN"),
        );

    let command = auth::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const ENV_VARS: [&str; 11] = [
        "TRACKER_PORT",
        "TRACKER_DSN",
        "TRACKER_SECRET_KEY",
        "TRACKER_ALGORITHM",
        "TRACKER_ACCESS_TOKEN_EXPIRE_MINUTES",
        "TRACKER_REFRESH_TOKEN_EXPIRE_DAYS",
        "TRACKER_SESSION_LIFETIME_MINUTES",
        "TRACKER_COOKIE_SECURE",
        "TRACKER_BCRYPT_COST",
        "TRACKER_LOG_DIR",
        "TRACKER_LOG_LEVEL",
    ];

    fn clean_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let mut all: Vec<(&str, Option<&str>)> = ENV_VARS.iter().map(|k| (*k, None)).collect();
        for (key, value) in vars {
            all.retain(|(k, _)| k != key);
            all.push((*key, Some(*value)));
        }
        temp_env::with_vars(all, f);
    }

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "tracker");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Daily exercise tracker".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_defaults() {
        clean_env(&[], || {
            let matches = new().get_matches_from(vec!["tracker", "--secret-key", "s3cret"]);

            assert_eq!(matches.get_one::<u16>("port").copied(), Some(8181));
            assert_eq!(
                matches.get_one::<String>("dsn").map(String::as_str),
                Some(DEFAULT_DSN)
            );
            assert_eq!(
                matches
                    .get_one::<String>(auth::ARG_ALGORITHM)
                    .map(String::as_str),
                Some("HS256")
            );
            assert_eq!(
                matches
                    .get_one::<i64>(auth::ARG_ACCESS_TOKEN_EXPIRE_MINUTES)
                    .copied(),
                Some(30)
            );
            assert_eq!(
                matches
                    .get_one::<i64>(auth::ARG_REFRESH_TOKEN_EXPIRE_DAYS)
                    .copied(),
                Some(7)
            );
            assert_eq!(
                matches
                    .get_one::<i64>(auth::ARG_SESSION_LIFETIME_MINUTES)
                    .copied(),
                Some(30)
            );
            assert_eq!(
                matches.get_one::<bool>(auth::ARG_COOKIE_SECURE).copied(),
                Some(true)
            );
            assert_eq!(
                matches.get_one::<u32>(auth::ARG_BCRYPT_COST).copied(),
                Some(12)
            );
            assert!(matches.get_one::<PathBuf>(logging::ARG_LOG_DIR).is_none());
        });
    }

    #[test]
    fn test_secret_key_is_required() {
        clean_env(&[], || {
            let result = new().try_get_matches_from(vec!["tracker"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_unsupported_algorithm_is_rejected() {
        clean_env(&[], || {
            let result = new().try_get_matches_from(vec![
                "tracker",
                "--secret-key",
                "s3cret",
                "--algorithm",
                "RS256",
            ]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_lifetimes_are_bounded() {
        let cases = [
            ("--access-token-expire-minutes", "525601"),
            ("--refresh-token-expire-days", "1000000000"),
            ("--session-lifetime-minutes", "9223372036854775807"),
            ("--access-token-expire-minutes", "0"),
        ];
        for (flag, value) in cases {
            clean_env(&[], || {
                let result =
                    new().try_get_matches_from(vec!["tracker", "--secret-key", "s3cret", flag, value]);
                assert!(result.is_err(), "{flag}={value} should be rejected");
            });
        }

        clean_env(&[("TRACKER_REFRESH_TOKEN_EXPIRE_DAYS", "3651")], || {
            let result = new().try_get_matches_from(vec!["tracker", "--secret-key", "s3cret"]);
            assert!(result.is_err());
        });

        clean_env(&[], || {
            let matches = new().get_matches_from(vec![
                "tracker",
                "--secret-key",
                "s3cret",
                "--access-token-expire-minutes",
                "525600",
                "--refresh-token-expire-days",
                "3650",
            ]);
            assert_eq!(
                matches
                    .get_one::<i64>(auth::ARG_REFRESH_TOKEN_EXPIRE_DAYS)
                    .copied(),
                Some(3650)
            );
        });
    }

    #[test]
    fn test_env() {
        clean_env(
            &[
                ("TRACKER_PORT", "9090"),
                ("TRACKER_DSN", "sqlite::memory:"),
                ("TRACKER_SECRET_KEY", "from-env"),
                ("TRACKER_ALGORITHM", "HS512"),
                ("TRACKER_COOKIE_SECURE", "false"),
                ("TRACKER_BCRYPT_COST", "4"),
                ("TRACKER_LOG_DIR", "/tmp/tracker-logs"),
            ],
            || {
                let matches = new().get_matches_from(vec!["tracker"]);

                assert_eq!(matches.get_one::<u16>("port").copied(), Some(9090));
                assert_eq!(
                    matches.get_one::<String>("dsn").map(String::as_str),
                    Some("sqlite::memory:")
                );
                assert_eq!(
                    matches
                        .get_one::<String>(auth::ARG_SECRET_KEY)
                        .map(String::as_str),
                    Some("from-env")
                );
                assert_eq!(
                    matches
                        .get_one::<String>(auth::ARG_ALGORITHM)
                        .map(String::as_str),
                    Some("HS512")
                );
                assert_eq!(
                    matches.get_one::<bool>(auth::ARG_COOKIE_SECURE).copied(),
                    Some(false)
                );
                assert_eq!(
                    matches.get_one::<u32>(auth::ARG_BCRYPT_COST).copied(),
                    Some(4)
                );
                assert_eq!(
                    matches.get_one::<PathBuf>(logging::ARG_LOG_DIR).cloned(),
                    Some(PathBuf::from("/tmp/tracker-logs"))
                );
            },
        );
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            clean_env(&[], || {
                let mut args = vec![
                    "tracker".to_string(),
                    "--secret-key".to_string(),
                    "s3cret".to_string(),
                ];

                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    matches
                        .get_one::<u8>(logging::ARG_VERBOSITY)
                        .copied(),
                    Some(u8::try_from(index).unwrap())
                );
            });
        }
    }
}
