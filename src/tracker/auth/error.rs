use thiserror::Error;

/// Failures from configuring, issuing or verifying signed tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
    #[error("Invalid token: No subject found")]
    MissingSubject,
    #[error("signing secret must not be empty")]
    EmptySecret,
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("{0} is out of range")]
    LifetimeOutOfRange(&'static str),
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Reasons a request is refused by the session gate or a login attempt fails.
///
/// The `Display` text is what the user sees in the flash message.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid session: Attempt to access with no session.")]
    NoSession,
    #[error("Invalid token: Attempt to access with no token.")]
    NoToken,
    #[error("Token validation error: {0}")]
    Token(#[from] TokenError),
    #[error("Token mismatch: Attempt to access with invalid token for user {session_user}")]
    SubjectMismatch { session_user: String },
    #[error("malformed password hash")]
    MalformedPasswordHash,
    #[error("failed to hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("Invalid session: {0}")]
    SessionStore(#[from] tower_sessions::session::Error),
}

impl AuthError {
    /// Token decode failures are the only rejection that drops the session user.
    #[must_use]
    pub const fn clears_session(&self) -> bool {
        matches!(self, Self::Token(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_flash_text() {
        assert_eq!(
            AuthError::NoSession.to_string(),
            "Invalid session: Attempt to access with no session."
        );
        assert_eq!(
            AuthError::NoToken.to_string(),
            "Invalid token: Attempt to access with no token."
        );
        assert_eq!(
            AuthError::Token(TokenError::Expired).to_string(),
            "Token validation error: Token has expired"
        );
        assert_eq!(
            AuthError::SubjectMismatch {
                session_user: "alice".to_string()
            }
            .to_string(),
            "Token mismatch: Attempt to access with invalid token for user alice"
        );
    }

    #[test]
    fn only_token_failures_clear_session() {
        assert!(AuthError::Token(TokenError::Invalid).clears_session());
        assert!(!AuthError::NoSession.clears_session());
        assert!(!AuthError::NoToken.clears_session());
        assert!(
            !AuthError::SubjectMismatch {
                session_user: "alice".to_string()
            }
            .clears_session()
        );
    }
}
