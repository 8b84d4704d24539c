use axum::{
    extract::{Extension, Path},
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use std::str::FromStr;
use tower_sessions::Session;

use super::{DASHBOARD_PATH, dashboard::RECENT_DAYS, flash_redirect, internal_error, load_user};
use crate::tracker::{
    auth::{
        CurrentUser,
        flash::{self, Category},
    },
    storage::exercises::{self, Exercise},
    views,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportKind {
    Steps,
    Distance,
    Calories,
    HeartRate,
    Duration,
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(action: &str) -> Result<Self, Self::Err> {
        match action {
            "by_steps" => Ok(Self::Steps),
            "by_distance" => Ok(Self::Distance),
            "by_calories" => Ok(Self::Calories),
            "by_heart_rate" => Ok(Self::HeartRate),
            "by_duration" => Ok(Self::Duration),
            other => Err(format!("unknown report action: {other}")),
        }
    }
}

impl ReportKind {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Steps => "Steps report",
            Self::Distance => "Distance report",
            Self::Calories => "Calories report",
            Self::HeartRate => "Heart rate report",
            Self::Duration => "Duration report",
        }
    }

    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Steps => &["Steps taken"],
            Self::Distance => &["Distance"],
            Self::Calories => &["Calories burned"],
            Self::HeartRate => &["Min heart rate", "Max heart rate", "Avg heart rate"],
            Self::Duration => &["Exercise duration"],
        }
    }

    #[must_use]
    pub fn values(self, exercise: &Exercise) -> Vec<String> {
        match self {
            Self::Steps => vec![exercise.steps_taken.to_string()],
            Self::Distance => vec![exercise.distance.to_string()],
            Self::Calories => vec![exercise.calories_burned.to_string()],
            Self::HeartRate => vec![
                exercise.min_heart_rate.to_string(),
                exercise.max_heart_rate.to_string(),
                exercise.avg_heart_rate.to_string(),
            ],
            Self::Duration => vec![exercise.exercise_duration.to_string()],
        }
    }
}

pub async fn report(
    pool: Extension<SqlitePool>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    session: Session,
    Path(action): Path<String>,
) -> Response {
    let Ok(kind) = action.parse::<ReportKind>() else {
        return flash_redirect(
            &session,
            Category::Error,
            "Invalid report action.",
            DASHBOARD_PATH,
        )
        .await;
    };

    let user = match load_user(&pool.0, &session, &username).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let now = Utc::now();
    let rows = match exercises::recent_for_user(
        &pool.0,
        user.id,
        now - Duration::days(RECENT_DAYS),
        now,
    )
    .await
    {
        Ok(exercises) => exercises
            .iter()
            .map(|exercise| (exercise.date, kind.values(exercise)))
            .collect::<Vec<_>>(),
        Err(err) => return internal_error(&err),
    };

    let flashes = flash::take(&session).await;
    views::report_page(&flashes, kind.title(), kind.columns(), &rows).into_response()
}
