//! Authentication: password hashing, signed tokens and the session gate.
//!
//! Login stores the username in the server-side session and the access token
//! in the `token` cookie. Protected routes are wrapped by
//! [`gate::session_gate`], which cross-checks the two on every request.

pub mod error;
pub mod flash;
pub mod gate;
pub mod password;
pub mod session;
mod state;
pub mod token;

pub use error::{AuthError, TokenError};
pub use gate::{CurrentUser, LOGIN_PATH, session_gate};
pub use password::PasswordHasher;
pub use state::{AuthConfig, AuthState, MAX_LIFETIME_DAYS, MAX_LIFETIME_MINUTES};
pub use token::{TokenPair, TokenService};
