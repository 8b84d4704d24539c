use axum::{
    extract::{Extension, Form},
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_sessions::Session;
use tracing::{error, info, instrument};

use super::{DASHBOARD_PATH, flash_redirect, internal_error};
use crate::tracker::{
    auth::{
        AuthState, LOGIN_PATH,
        flash::{self, Category},
        session::{USER_NAME_KEY, token_cookie},
    },
    storage::users,
    views,
};

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username_or_email: String,
    #[serde(default)]
    password: String,
}

pub async fn login_form(session: Session) -> Response {
    let flashes = flash::take(&session).await;
    views::login_page(&flashes).into_response()
}

#[instrument(skip_all)]
pub async fn login(
    pool: Extension<SqlitePool>,
    auth: Extension<Arc<AuthState>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let identifier = form.username_or_email.trim();

    if identifier.is_empty() || form.password.is_empty() {
        return flash_redirect(&session, Category::Error, "All fields are required.", LOGIN_PATH)
            .await;
    }

    let user = match users::find_credential(&pool.0, identifier).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return flash_redirect(
                &session,
                Category::Error,
                "Invalid username or email.",
                LOGIN_PATH,
            )
            .await;
        }
        Err(err) => return internal_error(&err),
    };

    // bcrypt is CPU bound
    let hasher = auth.passwords();
    let hash = user.password.clone();
    let password = form.password;
    let verified = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .unwrap_or_else(|err| {
            error!("Password verification task failed: {err}");
            false
        });

    if !verified {
        return flash_redirect(&session, Category::Error, "Invalid password.", LOGIN_PATH).await;
    }

    let tokens = match auth.tokens().issue(&user.username) {
        Ok(tokens) => tokens,
        Err(err) => return internal_error(&anyhow::Error::new(err)),
    };

    if let Err(err) = session.cycle_id().await {
        return internal_error(&anyhow::Error::new(err).context("failed to rotate session id"));
    }

    if let Err(err) = session.insert(USER_NAME_KEY, &user.username).await {
        return internal_error(&anyhow::Error::new(err).context("failed to store session user"));
    }

    let cookie = match token_cookie(auth.config(), &tokens.access_token) {
        Ok(cookie) => cookie,
        Err(err) => {
            return internal_error(&anyhow::Error::new(err).context("failed to build token cookie"));
        }
    };

    info!("User {} logged in successfully.", user.fullname);

    ([(SET_COOKIE, cookie)], Redirect::to(DASHBOARD_PATH)).into_response()
}
