//! # Tracker (Daily Exercise Tracker)
//!
//! `tracker` is a small server-rendered web application for recording daily
//! exercise metrics: steps, distance, calories, heart rate and duration.
//!
//! ## Authentication
//!
//! Passwords are stored as bcrypt hashes. A successful login issues a signed
//! access token (kept in an `HttpOnly` cookie named `token`) and writes the
//! username into the server-side session.
//!
//! Every protected route runs behind the session gate, which only lets a
//! request through when the session holds a username, the token cookie is
//! present, the token verifies, and the token subject matches the session.
//! Any failure redirects to `/login` with a flash message.
//!
//! ## Storage
//!
//! Users and exercise records live in SQLite (via `sqlx`). Server-side
//! sessions are stored in the same database and expire after an idle timeout.

pub mod cli;
pub mod tracker;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
