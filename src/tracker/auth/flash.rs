//! One-shot messages carried in the session until the next page render.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::error;

const FLASH_KEY: &str = "_flashes";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Success,
    Error,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Error => "Error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: Category,
    pub message: String,
}

/// Queue a message. Store failures are logged, never surfaced to the user.
pub async fn push(session: &Session, category: Category, message: impl Into<String>) {
    let mut flashes = match session.get::<Vec<Flash>>(FLASH_KEY).await {
        Ok(flashes) => flashes.unwrap_or_default(),
        Err(err) => {
            error!("Failed to read flash messages: {err}");
            Vec::new()
        }
    };
    flashes.push(Flash {
        category,
        message: message.into(),
    });
    if let Err(err) = session.insert(FLASH_KEY, flashes).await {
        error!("Failed to store flash message: {err}");
    }
}

/// Drain all pending messages.
pub async fn take(session: &Session) -> Vec<Flash> {
    match session.remove::<Vec<Flash>>(FLASH_KEY).await {
        Ok(flashes) => flashes.unwrap_or_default(),
        Err(err) => {
            error!("Failed to read flash messages: {err}");
            Vec::new()
        }
    }
}
