//! Session gate for protected routes.
//!
//! A request passes only when all of these hold, checked in order:
//!
//! 1. the session holds a non-empty `user_name`,
//! 2. the request carries a `token` cookie,
//! 3. the token verifies (signature and expiration),
//! 4. the token subject equals the session `user_name`.
//!
//! The first failing check decides the outcome. A token that fails to verify
//! also removes `user_name` from the session; a subject mismatch leaves it.
//! Rejections redirect to the login page with a flash message.

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tower_sessions::Session;
use tracing::{error, info};

use super::{
    error::AuthError,
    flash::{self, Category},
    session::{USER_NAME_KEY, extract_token},
    state::AuthState,
    token::TokenService,
};

pub const LOGIN_PATH: &str = "/login";

/// Username of the request that passed the gate, available to handlers as an extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser(pub String);

/// Run the gate checks against a session and the cookie token.
///
/// # Errors
/// Returns the first failing check as an [`AuthError`].
pub async fn authorize(
    session: &Session,
    token: Option<&str>,
    tokens: &TokenService,
) -> Result<String, AuthError> {
    let user_name = session
        .get::<String>(USER_NAME_KEY)
        .await?
        .filter(|name| !name.is_empty())
        .ok_or(AuthError::NoSession)?;

    let token = token
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::NoToken)?;

    let subject = match tokens.verify(token) {
        Ok(subject) => subject,
        Err(err) => {
            let err = AuthError::from(err);
            if err.clears_session()
                && let Err(store_err) = session.remove::<String>(USER_NAME_KEY).await
            {
                error!("Failed to clear session user: {store_err}");
            }
            return Err(err);
        }
    };

    if subject != user_name {
        return Err(AuthError::SubjectMismatch {
            session_user: user_name,
        });
    }

    Ok(user_name)
}

/// Middleware wrapping every protected route, see module docs.
pub async fn session_gate(
    Extension(auth): Extension<Arc<AuthState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_token(request.headers());

    match authorize(&session, token.as_deref(), auth.tokens()).await {
        Ok(user_name) => {
            info!("Session and token validated successfully for user {user_name}.");
            request.extensions_mut().insert(CurrentUser(user_name));
            next.run(request).await
        }
        Err(err) => {
            error!("{err}");
            flash::push(&session, Category::Error, err.to_string()).await;
            Redirect::to(LOGIN_PATH).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::auth::{AuthConfig, token::Claims};
    use axum::{
        Router,
        body::Body,
        http::{StatusCode, header::COOKIE, header::LOCATION},
        middleware,
        routing::get,
    };
    use chrono::{Duration, Utc};
    use secrecy::SecretString;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    fn auth_state() -> Arc<AuthState> {
        let config = AuthConfig::new(SecretString::from("gate-secret")).with_bcrypt_cost(4);
        Arc::new(AuthState::new(config).unwrap_or_else(|err| panic!("auth state: {err}")))
    }

    fn new_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    async fn session_for(user: &str) -> Session {
        let session = new_session();
        if let Err(err) = session.insert(USER_NAME_KEY, user).await {
            panic!("session insert: {err}");
        }
        session
    }

    fn access_token(auth: &AuthState, subject: &str) -> String {
        auth.tokens()
            .issue(subject)
            .map(|pair| pair.access_token)
            .unwrap_or_else(|err| panic!("issue: {err}"))
    }

    fn expired_token(auth: &AuthState, subject: &str) -> String {
        auth.tokens()
            .sign(&Claims {
                sub: subject.to_string(),
                exp: (Utc::now() - Duration::minutes(1)).timestamp(),
            })
            .unwrap_or_else(|err| panic!("sign: {err}"))
    }

    async fn session_user(session: &Session) -> Option<String> {
        session.get::<String>(USER_NAME_KEY).await.ok().flatten()
    }

    #[tokio::test]
    async fn rejects_missing_session() {
        let auth = auth_state();
        let token = access_token(&auth, "alice");
        let result = authorize(&new_session(), Some(&token), auth.tokens()).await;
        assert!(matches!(result, Err(AuthError::NoSession)));
    }

    #[tokio::test]
    async fn rejects_empty_session_user() {
        let auth = auth_state();
        let session = session_for("").await;
        let token = access_token(&auth, "");
        let result = authorize(&session, Some(&token), auth.tokens()).await;
        assert!(matches!(result, Err(AuthError::NoSession)));
    }

    #[tokio::test]
    async fn rejects_missing_token() {
        let auth = auth_state();
        let session = session_for("alice").await;
        let result = authorize(&session, None, auth.tokens()).await;
        assert!(matches!(result, Err(AuthError::NoToken)));
        assert_eq!(session_user(&session).await.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn expired_token_clears_session() {
        let auth = auth_state();
        let session = session_for("alice").await;
        let token = expired_token(&auth, "alice");
        let result = authorize(&session, Some(&token), auth.tokens()).await;
        assert!(matches!(
            result,
            Err(AuthError::Token(crate::tracker::auth::TokenError::Expired))
        ));
        assert_eq!(session_user(&session).await, None);
    }

    #[tokio::test]
    async fn invalid_token_clears_session() {
        let auth = auth_state();
        let session = session_for("alice").await;
        let result = authorize(&session, Some("garbage"), auth.tokens()).await;
        assert!(matches!(result, Err(AuthError::Token(_))));
        assert_eq!(session_user(&session).await, None);
    }

    #[tokio::test]
    async fn subject_mismatch_keeps_session() {
        let auth = auth_state();
        let session = session_for("alice").await;
        let token = access_token(&auth, "bob");
        let result = authorize(&session, Some(&token), auth.tokens()).await;
        match result {
            Err(AuthError::SubjectMismatch { session_user }) => assert_eq!(session_user, "alice"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(session_user(&session).await.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn matching_pair_passes() {
        let auth = auth_state();
        let session = session_for("alice").await;
        let token = access_token(&auth, "alice");
        let result = authorize(&session, Some(&token), auth.tokens()).await;
        assert_eq!(result.ok().as_deref(), Some("alice"));
    }

    fn protected_router(auth: Arc<AuthState>, hits: Arc<AtomicUsize>) -> Router {
        let handler = move |Extension(user): Extension<CurrentUser>| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                user.0
            }
        };
        Router::new()
            .route("/protected", get(handler.clone()).post(handler))
            .route_layer(middleware::from_fn(session_gate))
            .layer(Extension(auth))
    }

    fn request(method: &str, session: &Session, token: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder()
            .method(method)
            .uri("/protected");
        if let Some(token) = token {
            builder = builder.header(COOKIE, format!("token={token}"));
        }
        let mut request = builder
            .body(Body::empty())
            .unwrap_or_else(|err| panic!("request: {err}"));
        request.extensions_mut().insert(session.clone());
        request
    }

    #[tokio::test]
    async fn middleware_invokes_handler_once_for_valid_pair() {
        let auth = auth_state();
        let hits = Arc::new(AtomicUsize::new(0));
        let session = session_for("alice").await;
        let token = access_token(&auth, "alice");

        let response = protected_router(auth, hits.clone())
            .oneshot(request("GET", &session, Some(&token)))
            .await;

        assert_eq!(response.ok().map(|r| r.status()), Some(StatusCode::OK));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn middleware_redirects_without_session() {
        let auth = auth_state();
        let hits = Arc::new(AtomicUsize::new(0));
        let session = new_session();
        let token = access_token(&auth, "alice");

        let response = protected_router(auth, hits.clone())
            .oneshot(request("POST", &session, Some(&token)))
            .await
            .unwrap_or_else(|err| panic!("oneshot: {err}"));

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
            Some(LOGIN_PATH)
        );
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let flashes = flash::take(&session).await;
        assert_eq!(flashes.len(), 1);
        assert!(flashes[0].message.starts_with("Invalid session"));
    }

    #[tokio::test]
    async fn middleware_rejects_same_way_for_every_method() {
        let auth = auth_state();
        for method in ["GET", "POST"] {
            let hits = Arc::new(AtomicUsize::new(0));
            let session = session_for("alice").await;
            let response = protected_router(auth.clone(), hits.clone())
                .oneshot(request(method, &session, None))
                .await
                .unwrap_or_else(|err| panic!("oneshot: {err}"));
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(hits.load(Ordering::SeqCst), 0);
            let flashes = flash::take(&session).await;
            assert!(flashes[0].message.starts_with("Invalid token"));
        }
    }

    #[tokio::test]
    async fn middleware_clears_session_on_expired_token() {
        let auth = auth_state();
        let hits = Arc::new(AtomicUsize::new(0));
        let session = session_for("alice").await;
        let token = expired_token(&auth, "alice");

        let response = protected_router(auth, hits.clone())
            .oneshot(request("GET", &session, Some(&token)))
            .await
            .unwrap_or_else(|err| panic!("oneshot: {err}"));

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(session_user(&session).await, None);
        let flashes = flash::take(&session).await;
        assert_eq!(
            flashes[0].message,
            "Token validation error: Token has expired"
        );
    }

    #[tokio::test]
    async fn middleware_keeps_session_on_subject_mismatch() {
        let auth = auth_state();
        let hits = Arc::new(AtomicUsize::new(0));
        let session = session_for("alice").await;
        let token = access_token(&auth, "bob");

        let response = protected_router(auth, hits.clone())
            .oneshot(request("GET", &session, Some(&token)))
            .await
            .unwrap_or_else(|err| panic!("oneshot: {err}"));

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(session_user(&session).await.as_deref(), Some("alice"));
        let flashes = flash::take(&session).await;
        assert!(flashes[0].message.ends_with("for user alice"));
    }
}
