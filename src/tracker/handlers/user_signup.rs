use axum::{
    extract::{Extension, Form},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_sessions::Session;
use tracing::{instrument, warn};

use super::{flash_redirect, internal_error, valid_email};
use crate::tracker::{
    auth::{
        AuthState, LOGIN_PATH,
        flash::{self, Category},
    },
    storage::users::{self, NewUser, SignupOutcome},
    views,
};

const SIGNUP_PATH: &str = "/signup";

#[derive(Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    fullname: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub async fn signup_form(session: Session) -> Response {
    let flashes = flash::take(&session).await;
    views::signup_page(&flashes).into_response()
}

#[instrument(skip_all)]
pub async fn signup(
    pool: Extension<SqlitePool>,
    auth: Extension<Arc<AuthState>>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Response {
    let username = form.username.trim();
    let fullname = form.fullname.trim();
    let email = form.email.trim();

    if username.is_empty() || fullname.is_empty() || email.is_empty() || form.password.is_empty()
    {
        return flash_redirect(&session, Category::Error, "All fields are required.", SIGNUP_PATH)
            .await;
    }

    if !valid_email(email) {
        return flash_redirect(
            &session,
            Category::Error,
            format!("Invalid email address {email}."),
            SIGNUP_PATH,
        )
        .await;
    }

    match users::find_by_username(&pool.0, username).await {
        Ok(Some(_)) => {
            return flash_redirect(
                &session,
                Category::Error,
                format!("Username {username} already exists."),
                SIGNUP_PATH,
            )
            .await;
        }
        Ok(None) => {}
        Err(err) => return internal_error(&err),
    }

    match users::find_by_email(&pool.0, email).await {
        Ok(Some(_)) => {
            return flash_redirect(
                &session,
                Category::Error,
                format!("Email {email} already exists."),
                SIGNUP_PATH,
            )
            .await;
        }
        Ok(None) => {}
        Err(err) => return internal_error(&err),
    }

    let hasher = auth.passwords();
    let password = form.password;
    let hashed = match tokio::task::spawn_blocking(move || hasher.hash(&password)).await {
        Ok(Ok(hash)) => hash,
        Ok(Err(err)) => return internal_error(&anyhow::Error::new(err)),
        Err(err) => return internal_error(&anyhow::Error::new(err)),
    };

    let new_user = NewUser {
        username,
        fullname,
        email,
        password_hash: &hashed,
    };

    match users::insert(&pool.0, &new_user).await {
        Ok(SignupOutcome::Created(_)) => {
            flash_redirect(
                &session,
                Category::Success,
                format!("User {username} signed up successfully."),
                LOGIN_PATH,
            )
            .await
        }
        Ok(SignupOutcome::Conflict) => {
            warn!("Signup for {username} lost a race against a concurrent signup");
            flash_redirect(
                &session,
                Category::Error,
                format!("Username {username} or email {email} already exists."),
                SIGNUP_PATH,
            )
            .await
        }
        Err(err) => internal_error(&err),
    }
}
