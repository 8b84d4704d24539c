//! Auth configuration and the shared state built from it at startup.

use secrecy::SecretString;

use super::{error::TokenError, password::PasswordHasher, token::TokenService};

const DEFAULT_ALGORITHM: &str = "HS256";
const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 30;
const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 7;
const DEFAULT_SESSION_LIFETIME_MINUTES: i64 = 30;

/// Upper bound for lifetimes configured in minutes (one year).
pub const MAX_LIFETIME_MINUTES: i64 = 525_600;
/// Upper bound for lifetimes configured in days (ten years).
pub const MAX_LIFETIME_DAYS: i64 = 3_650;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    secret_key: SecretString,
    algorithm: String,
    access_token_ttl_minutes: i64,
    refresh_token_ttl_days: i64,
    session_lifetime_minutes: i64,
    cookie_secure: bool,
    bcrypt_cost: u32,
}

impl AuthConfig {
    #[must_use]
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            secret_key,
            algorithm: DEFAULT_ALGORITHM.to_string(),
            access_token_ttl_minutes: DEFAULT_ACCESS_TOKEN_TTL_MINUTES,
            refresh_token_ttl_days: DEFAULT_REFRESH_TOKEN_TTL_DAYS,
            session_lifetime_minutes: DEFAULT_SESSION_LIFETIME_MINUTES,
            cookie_secure: true,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    #[must_use]
    pub fn with_algorithm(mut self, algorithm: String) -> Self {
        self.algorithm = algorithm;
        self
    }

    #[must_use]
    pub fn with_access_token_ttl_minutes(mut self, minutes: i64) -> Self {
        self.access_token_ttl_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_refresh_token_ttl_days(mut self, days: i64) -> Self {
        self.refresh_token_ttl_days = days;
        self
    }

    #[must_use]
    pub fn with_session_lifetime_minutes(mut self, minutes: i64) -> Self {
        self.session_lifetime_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[must_use]
    pub fn secret_key(&self) -> &SecretString {
        &self.secret_key
    }

    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    #[must_use]
    pub fn access_token_ttl_minutes(&self) -> i64 {
        self.access_token_ttl_minutes
    }

    #[must_use]
    pub fn refresh_token_ttl_days(&self) -> i64 {
        self.refresh_token_ttl_days
    }

    #[must_use]
    pub fn session_lifetime_minutes(&self) -> i64 {
        self.session_lifetime_minutes
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    #[must_use]
    pub fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }
}

/// Everything the auth handlers and the session gate need, built once.
#[derive(Debug)]
pub struct AuthState {
    config: AuthConfig,
    tokens: TokenService,
    passwords: PasswordHasher,
}

impl AuthState {
    /// # Errors
    /// Returns an error if the signing secret is empty, the algorithm is not
    /// supported or a lifetime is outside its bounds.
    pub fn new(config: AuthConfig) -> Result<Self, TokenError> {
        if !(1..=MAX_LIFETIME_MINUTES).contains(&config.session_lifetime_minutes()) {
            return Err(TokenError::LifetimeOutOfRange("session lifetime"));
        }
        let tokens = TokenService::from_config(&config)?;
        let passwords = PasswordHasher::new(config.bcrypt_cost());
        Ok(Self {
            config,
            tokens,
            passwords,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    #[must_use]
    pub fn passwords(&self) -> PasswordHasher {
        self.passwords
    }
}
