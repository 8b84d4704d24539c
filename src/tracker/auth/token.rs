//! Signed access and refresh tokens.
//!
//! Tokens are HMAC-signed JWTs carrying exactly two claims: `sub` (the
//! username) and `exp` (unix seconds, UTC). Both claims are required on
//! decode and expiration is checked without leeway.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{
    error::TokenError,
    state::{AuthConfig, MAX_LIFETIME_DAYS, MAX_LIFETIME_MINUTES},
};

const SUBJECT_CLAIM: &str = "sub";
const EXPIRATION_CLAIM: &str = "exp";
const TOKEN_TYPE: &str = "bearer";
const ACCESS_LIFETIME: &str = "access token lifetime";
const REFRESH_LIFETIME: &str = "refresh token lifetime";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: String,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub token_type: &'static str,
    pub access_token: String,
    pub refresh_token: String,
}

pub struct TokenService {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("keys", &"***")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenService {
    /// # Errors
    /// Returns an error if the secret is empty or `algorithm` is not an HMAC algorithm.
    pub fn new(
        secret: &SecretString,
        algorithm: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, TokenError> {
        let secret = secret.expose_secret().as_bytes();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        let algorithm = Algorithm::from_str(algorithm)
            .ok()
            .filter(|alg| matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512))
            .ok_or_else(|| TokenError::UnsupportedAlgorithm(algorithm.to_string()))?;

        Ok(Self {
            algorithm,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        })
    }

    /// # Errors
    /// See [`TokenService::new`]; also fails when a configured lifetime is
    /// outside its bounds.
    pub fn from_config(config: &AuthConfig) -> Result<Self, TokenError> {
        let access_ttl = lifetime(
            config.access_token_ttl_minutes(),
            MAX_LIFETIME_MINUTES,
            Duration::try_minutes,
            ACCESS_LIFETIME,
        )?;
        let refresh_ttl = lifetime(
            config.refresh_token_ttl_days(),
            MAX_LIFETIME_DAYS,
            Duration::try_days,
            REFRESH_LIFETIME,
        )?;
        Self::new(
            config.secret_key(),
            config.algorithm(),
            access_ttl,
            refresh_ttl,
        )
    }

    /// Issue an access/refresh pair for `subject`, both expiring relative to now.
    ///
    /// # Errors
    /// Returns an error if an expiry does not fit in a timestamp or signing fails.
    pub fn issue(&self, subject: &str) -> Result<TokenPair, TokenError> {
        let now = Utc::now();

        let access_token = self.sign(&Claims {
            sub: subject.to_string(),
            exp: expires_at(now, self.access_ttl, ACCESS_LIFETIME)?,
        })?;

        let refresh_token = self.sign(&Claims {
            sub: subject.to_string(),
            exp: expires_at(now, self.refresh_ttl, REFRESH_LIFETIME)?,
        })?;

        Ok(TokenPair {
            token_type: TOKEN_TYPE,
            access_token,
            refresh_token,
        })
    }

    /// Verify signature and expiration, returning the embedded subject.
    ///
    /// # Errors
    /// [`TokenError::Expired`] when past `exp`, [`TokenError::MissingSubject`]
    /// when `sub` is absent or empty, [`TokenError::Invalid`] otherwise.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&[EXPIRATION_CLAIM, SUBJECT_CLAIM]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::MissingRequiredClaim(claim) if claim == SUBJECT_CLAIM => {
                    TokenError::MissingSubject
                }
                _ => TokenError::Invalid,
            }
        })?;

        if data.claims.sub.is_empty() {
            return Err(TokenError::MissingSubject);
        }

        Ok(data.claims.sub)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding).map_err(TokenError::Signing)
    }
}

fn lifetime(
    value: i64,
    max: i64,
    unit: fn(i64) -> Option<Duration>,
    name: &'static str,
) -> Result<Duration, TokenError> {
    Some(value)
        .filter(|value| (1..=max).contains(value))
        .and_then(unit)
        .ok_or(TokenError::LifetimeOutOfRange(name))
}

fn expires_at(now: DateTime<Utc>, ttl: Duration, name: &'static str) -> Result<i64, TokenError> {
    now.checked_add_signed(ttl)
        .map(|at| at.timestamp())
        .ok_or(TokenError::LifetimeOutOfRange(name))
}
