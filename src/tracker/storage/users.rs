//! Credential records.

use anyhow::{Context, Result};
use sqlx::{FromRow, SqlitePool};
use tracing::Instrument;

use super::is_unique_violation;

#[derive(Clone, Debug, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub fullname: String,
    pub email: String,
    /// bcrypt hash
    pub password: String,
    pub is_active: bool,
}

#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub fullname: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SignupOutcome {
    Created(i64),
    Conflict,
}

const USER_COLUMNS: &str = "id, username, fullname, email, password, is_active";

fn query_span(operation: &str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "sqlite",
        db.operation = operation,
        db.statement = statement
    )
}

/// Look up a user by exact username.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
    sqlx::query_as::<_, User>(&query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", &query))
        .await
        .context("failed to lookup user by username")
}

/// Look up a user by exact email.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
    sqlx::query_as::<_, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", &query))
        .await
        .context("failed to lookup user by email")
}

/// Resolve a login identifier, which may be either a username or an email.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn find_credential(pool: &SqlitePool, identifier: &str) -> Result<Option<User>> {
    let query =
        format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1 OR email = ?2 LIMIT 1");
    sqlx::query_as::<_, User>(&query)
        .bind(identifier)
        .bind(identifier)
        .fetch_optional(pool)
        .instrument(query_span("SELECT", &query))
        .await
        .context("failed to lookup credential")
}

/// Insert a user; a unique-constraint race on username or email yields `Conflict`.
///
/// # Errors
/// Returns an error for any database failure other than a unique violation.
pub async fn insert(pool: &SqlitePool, user: &NewUser<'_>) -> Result<SignupOutcome> {
    let query = r"
        INSERT INTO users
            (username, fullname, email, password)
        VALUES (?1, ?2, ?3, ?4)
    ";
    let result = sqlx::query(query)
        .bind(user.username)
        .bind(user.fullname)
        .bind(user.email)
        .bind(user.password_hash)
        .execute(pool)
        .instrument(query_span("INSERT", query))
        .await;

    match result {
        Ok(done) => Ok(SignupOutcome::Created(done.last_insert_rowid())),
        Err(err) if is_unique_violation(&err) => Ok(SignupOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}
