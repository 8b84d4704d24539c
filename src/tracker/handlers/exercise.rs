use axum::{
    extract::{Extension, Form, Path},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use super::{DASHBOARD_PATH, flash_redirect, internal_error, load_user};
use crate::tracker::{
    auth::{
        CurrentUser,
        flash::{self, Category},
    },
    storage::exercises::{self, Exercise, ExerciseInput},
    views,
};

const ADD_PATH: &str = "/add_exercise_tracker";
const ALL_FIELDS_REQUIRED: &str = "All fields are required.";

/// Raw form fields; anything missing, unparsable, not positive or beyond a
/// plausible upper bound is rejected.
#[derive(Debug, Default, Deserialize)]
pub struct ExerciseForm {
    #[serde(default)]
    steps_taken: String,
    #[serde(default)]
    distance: String,
    #[serde(default)]
    calories_burned: String,
    #[serde(default)]
    max_heart_rate: String,
    #[serde(default)]
    min_heart_rate: String,
    #[serde(default)]
    exercise_duration: String,
}

const MAX_STEPS: i64 = 1_000_000;
const MAX_DISTANCE: f64 = 1_000.0;
const MAX_CALORIES: f64 = 100_000.0;
const MAX_HEART_RATE: i64 = 300;
// One day, in minutes.
const MAX_DURATION: i64 = 1_440;

fn bounded_int(value: &str, max: i64) -> Option<i64> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|v| (1..=max).contains(v))
}

fn bounded_float(value: &str, max: f64) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0 && *v <= max)
}

impl ExerciseForm {
    #[must_use]
    pub fn parse(&self) -> Option<ExerciseInput> {
        Some(ExerciseInput {
            steps_taken: bounded_int(&self.steps_taken, MAX_STEPS)?,
            distance: bounded_float(&self.distance, MAX_DISTANCE)?,
            calories_burned: bounded_float(&self.calories_burned, MAX_CALORIES)?,
            max_heart_rate: bounded_int(&self.max_heart_rate, MAX_HEART_RATE)?,
            min_heart_rate: bounded_int(&self.min_heart_rate, MAX_HEART_RATE)?,
            exercise_duration: bounded_int(&self.exercise_duration, MAX_DURATION)?,
        })
    }
}

/// Load an exercise and make sure it belongs to `user_id`.
async fn owned_exercise(
    pool: &SqlitePool,
    session: &Session,
    user_id: i64,
    id: i64,
    verb: &str,
) -> Result<Exercise, Response> {
    match exercises::find(pool, id).await {
        Ok(Some(exercise)) if exercise.user_id == user_id => Ok(exercise),
        Ok(Some(_)) => Err(flash_redirect(
            session,
            Category::Error,
            format!("You are not authorized to {verb} this exercise."),
            DASHBOARD_PATH,
        )
        .await),
        Ok(None) => Err(flash_redirect(
            session,
            Category::Error,
            format!("Exercise with ID {id} not found."),
            DASHBOARD_PATH,
        )
        .await),
        Err(err) => Err(internal_error(&err)),
    }
}

pub async fn add_form(session: Session) -> Response {
    let flashes = flash::take(&session).await;
    views::add_exercise_page(&flashes).into_response()
}

pub async fn add(
    pool: Extension<SqlitePool>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    session: Session,
    Form(form): Form<ExerciseForm>,
) -> Response {
    let user = match load_user(&pool.0, &session, &username).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let Some(input) = form.parse() else {
        return flash_redirect(&session, Category::Error, ALL_FIELDS_REQUIRED, ADD_PATH).await;
    };

    match exercises::insert(&pool.0, user.id, Utc::now(), &input).await {
        Ok(_) => {
            flash_redirect(
                &session,
                Category::Success,
                "Tracker added successfully.",
                DASHBOARD_PATH,
            )
            .await
        }
        Err(err) => internal_error(&err),
    }
}

pub async fn update_form(
    pool: Extension<SqlitePool>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    session: Session,
    Path(id): Path<i64>,
) -> Response {
    let user = match load_user(&pool.0, &session, &username).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match owned_exercise(&pool.0, &session, user.id, id, "update").await {
        Ok(exercise) => {
            let flashes = flash::take(&session).await;
            views::update_exercise_page(&flashes, &exercise).into_response()
        }
        Err(response) => response,
    }
}

pub async fn update(
    pool: Extension<SqlitePool>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<ExerciseForm>,
) -> Response {
    let user = match load_user(&pool.0, &session, &username).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    if let Err(response) = owned_exercise(&pool.0, &session, user.id, id, "update").await {
        return response;
    }

    let Some(input) = form.parse() else {
        return flash_redirect(
            &session,
            Category::Error,
            ALL_FIELDS_REQUIRED,
            &format!("/update_exercise_tracker/{id}"),
        )
        .await;
    };

    match exercises::update(&pool.0, id, &input).await {
        Ok(()) => {
            flash_redirect(
                &session,
                Category::Success,
                "Exercise tracker updated successfully.",
                DASHBOARD_PATH,
            )
            .await
        }
        Err(err) => internal_error(&err),
    }
}

pub async fn delete(
    pool: Extension<SqlitePool>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    session: Session,
    Path(id): Path<i64>,
) -> Response {
    let user = match load_user(&pool.0, &session, &username).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    if let Err(response) = owned_exercise(&pool.0, &session, user.id, id, "delete").await {
        return response;
    }

    match exercises::delete(&pool.0, id).await {
        Ok(()) => {
            flash_redirect(
                &session,
                Category::Success,
                "Exercise deleted successfully.",
                DASHBOARD_PATH,
            )
            .await
        }
        Err(err) => internal_error(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ExerciseForm {
        ExerciseForm {
            steps_taken: "8000".to_string(),
            distance: "5.5".to_string(),
            calories_burned: "320".to_string(),
            max_heart_rate: "150".to_string(),
            min_heart_rate: "71".to_string(),
            exercise_duration: "45".to_string(),
        }
    }

    #[test]
    fn test_parse_valid_form() {
        let input = form().parse();
        assert_eq!(
            input,
            Some(ExerciseInput {
                steps_taken: 8000,
                distance: 5.5,
                calories_burned: 320.0,
                max_heart_rate: 150,
                min_heart_rate: 71,
                exercise_duration: 45,
            })
        );
        assert_eq!(input.map(|i| i.avg_heart_rate()), Some(110));
    }

    #[test]
    fn test_parse_rejects_missing_zero_negative_and_garbage() {
        assert!(ExerciseForm::default().parse().is_none());

        let zero = ExerciseForm {
            steps_taken: "0".to_string(),
            ..form()
        };
        assert!(zero.parse().is_none());

        let zero_distance = ExerciseForm {
            distance: "0.0".to_string(),
            ..form()
        };
        assert!(zero_distance.parse().is_none());

        let negative = ExerciseForm {
            min_heart_rate: "-60".to_string(),
            ..form()
        };
        assert!(negative.parse().is_none());

        let garbage = ExerciseForm {
            exercise_duration: "forty".to_string(),
            ..form()
        };
        assert!(garbage.parse().is_none());

        let not_a_number = ExerciseForm {
            calories_burned: "NaN".to_string(),
            ..form()
        };
        assert!(not_a_number.parse().is_none());
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        let huge_heart_rate = ExerciseForm {
            max_heart_rate: i64::MAX.to_string(),
            ..form()
        };
        assert!(huge_heart_rate.parse().is_none());

        let heart_rate = ExerciseForm {
            max_heart_rate: "301".to_string(),
            ..form()
        };
        assert!(heart_rate.parse().is_none());

        let duration = ExerciseForm {
            exercise_duration: "1441".to_string(),
            ..form()
        };
        assert!(duration.parse().is_none());

        let distance = ExerciseForm {
            distance: "1e300".to_string(),
            ..form()
        };
        assert!(distance.parse().is_none());

        let infinite = ExerciseForm {
            calories_burned: "inf".to_string(),
            ..form()
        };
        assert!(infinite.parse().is_none());

        let upper_edges = ExerciseForm {
            steps_taken: "1000000".to_string(),
            max_heart_rate: "300".to_string(),
            exercise_duration: "1440".to_string(),
            ..form()
        };
        assert!(upper_edges.parse().is_some());
    }
}
