use axum::response::{IntoResponse, Redirect, Response};
use tower_sessions::Session;
use tracing::error;

use super::DASHBOARD_PATH;
use crate::tracker::auth::{LOGIN_PATH, session::USER_NAME_KEY};

/// Send signed-in users to their dashboard, everybody else to the login form.
pub async fn root(session: Session) -> Response {
    let user_name = session
        .get::<String>(USER_NAME_KEY)
        .await
        .unwrap_or_else(|err| {
            error!("Failed to read session: {err}");
            None
        });

    match user_name {
        Some(name) if !name.is_empty() => Redirect::to(DASHBOARD_PATH).into_response(),
        _ => Redirect::to(LOGIN_PATH).into_response(),
    }
}
