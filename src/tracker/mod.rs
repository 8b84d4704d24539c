//! Web application: routes, layers and server startup.

pub mod auth;
pub mod handlers;
pub mod storage;
pub mod views;

use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::get,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tower_sessions::{
    Expiry, ExpiredDeletion, SessionManagerLayer, SessionStore, cookie::SameSite,
};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::{Span, error, info, info_span};
use ulid::Ulid;

use self::{
    auth::{AuthState, session_gate},
    handlers::{dashboard, exercise, health, report, root, user_login, user_logout, user_signup},
};

const EXPIRED_SESSION_SWEEP_SECS: u64 = 60;

/// Build the application router.
///
/// Routes that read or change exercise data sit behind [`session_gate`].
pub fn app<S>(pool: SqlitePool, auth_state: Arc<AuthState>, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(auth_state.config().cookie_secure())
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            auth_state.config().session_lifetime_minutes(),
        )));

    let protected = Router::new()
        .route("/dashboard", get(dashboard::dashboard))
        .route(
            "/add_exercise_tracker",
            get(exercise::add_form).post(exercise::add),
        )
        .route("/report/{action}", get(report::report))
        .route(
            "/update_exercise_tracker/{id}",
            get(exercise::update_form).post(exercise::update),
        )
        .route("/delete_exercise_tracker/{id}", get(exercise::delete))
        .route_layer(middleware::from_fn(session_gate));

    Router::new()
        .route("/", get(root::root))
        .route("/health", get(health::health))
        .route(
            "/login",
            get(user_login::login_form).post(user_login::login),
        )
        .route(
            "/signup",
            get(user_signup::signup_form).post(user_signup::signup),
        )
        .route("/logout", get(user_logout::logout))
        .merge(protected)
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(session_layer)
                .layer(Extension(auth_state))
                .layer(Extension(pool)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, auth_state: Arc<AuthState>) -> Result<()> {
    let pool = storage::connect(&dsn, 5).await?;

    storage::apply_schema(&pool)
        .await
        .context("Failed to apply database schema")?;

    let session_store = SqliteStore::new(pool.clone());
    session_store
        .migrate()
        .await
        .context("Failed to create session table")?;

    let deletion_task = tokio::task::spawn(session_store.clone().continuously_delete_expired(
        tokio::time::Duration::from_secs(EXPIRED_SESSION_SWEEP_SECS),
    ));

    let app = app(pool, auth_state, session_store);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    deletion_task.abort();

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
