pub mod dashboard;
pub mod exercise;
pub mod health;
pub mod report;
pub mod root;
pub mod user_login;
pub mod user_logout;
pub mod user_signup;

// common functions for the handlers
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use regex::Regex;
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::error;

use crate::tracker::{
    auth::{
        LOGIN_PATH,
        flash::{self, Category},
        session::USER_NAME_KEY,
    },
    storage::users::{self, User},
    views,
};

pub const DASHBOARD_PATH: &str = "/dashboard";

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Queue a flash message and redirect with `303 See Other`.
pub async fn flash_redirect(
    session: &Session,
    category: Category,
    message: impl Into<String>,
    to: &str,
) -> Response {
    let message = message.into();
    match category {
        Category::Error => error!("{message}"),
        Category::Success => tracing::info!("{message}"),
    }
    flash::push(session, category, message).await;
    Redirect::to(to).into_response()
}

/// Log the failure and answer with a generic 500 page.
pub fn internal_error(err: &anyhow::Error) -> Response {
    error!("{err:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        views::message_page("Error", "Something went wrong, please try again later."),
    )
        .into_response()
}

/// Resolve the user behind an authorized request.
///
/// A session pointing at a user that no longer exists is cleared and sent
/// back to the login page.
///
/// # Errors
/// Returns the response to send instead when the user cannot be loaded.
pub async fn load_user(
    pool: &SqlitePool,
    session: &Session,
    username: &str,
) -> Result<User, Response> {
    match users::find_by_username(pool, username).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            if let Err(err) = session.remove::<String>(USER_NAME_KEY).await {
                error!("Failed to clear session user: {err}");
            }
            Err(flash_redirect(
                session,
                Category::Error,
                format!("User {username} not found."),
                LOGIN_PATH,
            )
            .await)
        }
        Err(err) => Err(internal_error(&err)),
    }
}

/// Fallback for unknown routes.
pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        views::message_page("Not found", "This page does not exist."),
    )
        .into_response()
}
