use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tower_sessions::Session;

use super::{internal_error, load_user};
use crate::tracker::{
    auth::{CurrentUser, flash},
    storage::exercises,
    views,
};

/// Days of history shown on the dashboard and in reports.
pub const RECENT_DAYS: i64 = 7;

pub async fn dashboard(
    pool: Extension<SqlitePool>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    session: Session,
) -> Response {
    let user = match load_user(&pool.0, &session, &username).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let now = Utc::now();
    let exercises =
        match exercises::recent_for_user(&pool.0, user.id, now - Duration::days(RECENT_DAYS), now)
            .await
        {
            Ok(exercises) => exercises,
            Err(err) => return internal_error(&err),
        };

    let flashes = flash::take(&session).await;
    views::dashboard_page(&flashes, &user.fullname, &exercises).into_response()
}
