use axum::{
    extract::Extension,
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower_sessions::Session;
use tracing::error;

use super::flash_redirect;
use crate::tracker::auth::{
    AuthState,
    flash::Category,
    session::{USER_NAME_KEY, clear_token_cookie},
};

pub async fn logout(auth: Extension<Arc<AuthState>>, session: Session) -> Response {
    if let Err(err) = session.remove::<String>(USER_NAME_KEY).await {
        error!("Failed to clear session user: {err}");
    }

    let redirect = flash_redirect(&session, Category::Success, "Logged out successfully", "/").await;

    match clear_token_cookie(auth.config()) {
        Ok(cookie) => ([(SET_COOKIE, cookie)], redirect).into_response(),
        Err(err) => {
            error!("Failed to build token cookie: {err}");
            redirect
        }
    }
}
