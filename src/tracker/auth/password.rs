//! bcrypt password hashing.
//!
//! Every call to [`PasswordHasher::hash`] draws a fresh random salt, so hashing
//! the same password twice yields two different strings. The salt and cost are
//! embedded in the output and reused by [`PasswordHasher::verify`].

use tracing::error;

use super::error::AuthError;

#[derive(Clone, Copy, Debug)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    #[must_use]
    pub const fn new(cost: u32) -> Self {
        Self { cost }
    }

    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password into a `$2b$` modular-crypt string.
    ///
    /// # Errors
    /// Returns an error if the configured cost is outside bcrypt's range.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// Malformed hashes never match.
    #[must_use]
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match bcrypt::verify(password, hash) {
            Ok(valid) => valid,
            Err(err) => {
                error!("{}: {err}", AuthError::MalformedPasswordHash);
                false
            }
        }
    }
}
