//! Daily exercise records.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::Instrument;

#[derive(Clone, Debug, PartialEq, FromRow)]
pub struct Exercise {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub steps_taken: i64,
    pub distance: f64,
    pub calories_burned: f64,
    pub max_heart_rate: i64,
    pub min_heart_rate: i64,
    pub avg_heart_rate: i64,
    pub exercise_duration: i64,
    pub user_id: i64,
}

/// Validated metrics submitted through the add/update forms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExerciseInput {
    pub steps_taken: i64,
    pub distance: f64,
    pub calories_burned: f64,
    pub max_heart_rate: i64,
    pub min_heart_rate: i64,
    pub exercise_duration: i64,
}

impl ExerciseInput {
    /// Midpoint of the max and min heart rate, rounded down.
    #[must_use]
    pub fn avg_heart_rate(&self) -> i64 {
        let sum = i128::from(self.max_heart_rate) + i128::from(self.min_heart_rate);
        // The midpoint of two i64 values always fits in an i64.
        i64::try_from(sum.div_euclid(2)).unwrap_or(i64::MAX)
    }
}

const EXERCISE_COLUMNS: &str = "id, date, steps_taken, distance, calories_burned, max_heart_rate, \
     min_heart_rate, avg_heart_rate, exercise_duration, user_id";

fn query_span(operation: &str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = operation,
        db.statement = statement
    )
}

/// # Errors
/// Returns an error if the insert fails.
pub async fn insert(
    pool: &SqlitePool,
    user_id: i64,
    date: DateTime<Utc>,
    input: &ExerciseInput,
) -> Result<i64> {
    let query = r"
        INSERT INTO daily_exercise_tracker
            (date, steps_taken, distance, calories_burned, max_heart_rate,
             min_heart_rate, avg_heart_rate, exercise_duration, user_id)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ";
    let done = sqlx::query(query)
        .bind(date)
        .bind(input.steps_taken)
        .bind(input.distance)
        .bind(input.calories_burned)
        .bind(input.max_heart_rate)
        .bind(input.min_heart_rate)
        .bind(input.avg_heart_rate())
        .bind(input.exercise_duration)
        .bind(user_id)
        .execute(pool)
        .instrument(query_span("INSERT", query))
        .await
        .context("failed to insert exercise")?;

    Ok(done.last_insert_rowid())
}

/// # Errors
/// Returns an error if the query fails.
pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<Exercise>> {
    let query = format!("SELECT {EXERCISE_COLUMNS} FROM daily_exercise_tracker WHERE id = ?1");
    sqlx::query_as::<_, Exercise>(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", &query))
        .await
        .context("failed to lookup exercise")
}

/// Overwrite the metrics of an exercise, recomputing the average heart rate.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn update(pool: &SqlitePool, id: i64, input: &ExerciseInput) -> Result<()> {
    let query = r"
        UPDATE daily_exercise_tracker
        SET steps_taken = ?1,
            distance = ?2,
            calories_burned = ?3,
            max_heart_rate = ?4,
            min_heart_rate = ?5,
            avg_heart_rate = ?6,
            exercise_duration = ?7,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?8
    ";
    sqlx::query(query)
        .bind(input.steps_taken)
        .bind(input.distance)
        .bind(input.calories_burned)
        .bind(input.max_heart_rate)
        .bind(input.min_heart_rate)
        .bind(input.avg_heart_rate())
        .bind(input.exercise_duration)
        .bind(id)
        .execute(pool)
        .instrument(query_span("UPDATE", query))
        .await
        .context("failed to update exercise")?;

    Ok(())
}

/// # Errors
/// Returns an error if the delete fails.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<()> {
    let query = "DELETE FROM daily_exercise_tracker WHERE id = ?1";
    sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(query_span("DELETE", query))
        .await
        .context("failed to delete exercise")?;

    Ok(())
}

/// Exercises of `user_id` dated within `[since, until]`, newest first.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn recent_for_user(
    pool: &SqlitePool,
    user_id: i64,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<Exercise>> {
    let query = format!(
        "SELECT {EXERCISE_COLUMNS} FROM daily_exercise_tracker \
         WHERE user_id = ?1 AND date >= ?2 AND date <= ?3 \
         ORDER BY date DESC"
    );
    sqlx::query_as::<_, Exercise>(&query)
        .bind(user_id)
        .bind(since)
        .bind(until)
        .fetch_all(pool)
        .instrument(query_span("SELECT", &query))
        .await
        .context("failed to list exercises")
}
