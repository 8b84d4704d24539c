use crate::tracker::{self, auth};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub secret_key: SecretString,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    pub session_lifetime_minutes: i64,
    pub cookie_secure: bool,
    pub bcrypt_cost: u32,
}

impl Args {
    #[must_use]
    pub fn auth_config(&self) -> auth::AuthConfig {
        auth::AuthConfig::new(self.secret_key.clone())
            .with_algorithm(self.algorithm.clone())
            .with_access_token_ttl_minutes(self.access_token_expire_minutes)
            .with_refresh_token_ttl_days(self.refresh_token_expire_days)
            .with_session_lifetime_minutes(self.session_lifetime_minutes)
            .with_cookie_secure(self.cookie_secure)
            .with_bcrypt_cost(self.bcrypt_cost)
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the token service cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let auth_state = auth::AuthState::new(args.auth_config())
        .context("Invalid token configuration")?;

    tracker::new(args.port, args.dsn, Arc::new(auth_state)).await
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", args.dsn.clone()),
        ("algorithm", args.algorithm.clone()),
        (
            "access_token_ttl",
            format!("{}m", args.access_token_expire_minutes),
        ),
        (
            "refresh_token_ttl",
            format!("{}d", args.refresh_token_expire_days),
        ),
        (
            "session_lifetime",
            format!("{}m", args.session_lifetime_minutes),
        ),
        ("cookie_secure", args.cookie_secure.to_string()),
        ("bcrypt_cost", args.bcrypt_cost.to_string()),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} ({})\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn args() -> Args {
        Args {
            port: 8181,
            dsn: "sqlite::memory:".to_string(),
            secret_key: SecretString::from("s3cret"),
            algorithm: "HS384".to_string(),
            access_token_expire_minutes: 15,
            refresh_token_expire_days: 2,
            session_lifetime_minutes: 45,
            cookie_secure: false,
            bcrypt_cost: 6,
        }
    }

    #[test]
    fn test_auth_config_from_args() {
        let config = args().auth_config();
        assert_eq!(config.secret_key().expose_secret(), "s3cret");
        assert_eq!(config.algorithm(), "HS384");
        assert_eq!(config.access_token_ttl_minutes(), 15);
        assert_eq!(config.refresh_token_ttl_days(), 2);
        assert_eq!(config.session_lifetime_minutes(), 45);
        assert!(!config.cookie_secure());
        assert_eq!(config.bcrypt_cost(), 6);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", args());
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_short_commit() {
        assert_eq!(short_commit("0123456789abcdef"), "0123456");
        assert_eq!(short_commit("abc"), "abc");
    }
}
