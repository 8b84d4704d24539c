//! Session keys and the `token` cookie.

use axum::http::{HeaderMap, HeaderValue, header::InvalidHeaderValue};

use super::state::AuthConfig;

/// Session key holding the logged-in username.
pub const USER_NAME_KEY: &str = "user_name";

pub const TOKEN_COOKIE_NAME: &str = "token";

/// Build the `HttpOnly` cookie carrying the access token.
pub fn token_cookie(config: &AuthConfig, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let max_age = config.access_token_ttl_minutes().saturating_mul(60).max(0);
    let mut cookie = format!(
        "{TOKEN_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
    );
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub fn clear_token_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{TOKEN_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Read the access token from the request cookies, ignoring empty values.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let key = parts.next()?.trim();
            let val = parts.next()?.trim();
            (key == TOKEN_COOKIE_NAME && !val.is_empty()).then(|| val.to_string())
        })
        .next()
}
