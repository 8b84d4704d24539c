//! Server-rendered HTML pages.
//!
//! Every user-supplied value goes through `html-escape` before it lands in
//! markup.

use axum::response::Html;
use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

use super::{auth::flash::Flash, storage::exercises::Exercise};

const STYLE: &str = "body{font-family:sans-serif;max-width:60em;margin:2em auto;padding:0 1em}\
table{border-collapse:collapse;width:100%}th,td{border:1px solid #ccc;padding:.3em .6em}\
.flash-Success{color:#155724;background:#d4edda;padding:.5em}\
.flash-Error{color:#721c24;background:#f8d7da;padding:.5em}\
form label{display:block;margin:.4em 0}";

fn date(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

fn layout(title: &str, flashes: &[Flash], signed_in: bool, body: &str) -> Html<String> {
    let mut page = String::with_capacity(body.len() + 1024);
    let _ = write!(
        page,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{} | Exercise Tracker</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<nav>",
        encode_text(title)
    );
    if signed_in {
        page.push_str(
            "<a href=\"/dashboard\">Dashboard</a> | \
             <a href=\"/add_exercise_tracker\">Add exercise</a> | \
             <a href=\"/logout\">Logout</a>",
        );
    } else {
        page.push_str("<a href=\"/login\">Login</a> | <a href=\"/signup\">Sign up</a>");
    }
    page.push_str("</nav>\n");

    for flash in flashes {
        let _ = writeln!(
            page,
            "<p class=\"flash-{}\">{}</p>",
            flash.category.as_str(),
            encode_text(&flash.message)
        );
    }

    let _ = write!(page, "<h1>{}</h1>\n{body}\n</body>\n</html>\n", encode_text(title));
    Html(page)
}

fn input(page: &mut String, label: &str, name: &str, kind: &str, value: &str) {
    let _ = writeln!(
        page,
        "<label>{label} <input type=\"{kind}\" name=\"{name}\" value=\"{}\" required></label>",
        encode_double_quoted_attribute(value)
    );
}

#[must_use]
pub fn login_page(flashes: &[Flash]) -> Html<String> {
    let mut body = String::from("<form method=\"post\" action=\"/login\">\n");
    input(&mut body, "Username or email", "username_or_email", "text", "");
    input(&mut body, "Password", "password", "password", "");
    body.push_str("<button type=\"submit\">Login</button>\n</form>");
    layout("Login", flashes, false, &body)
}

#[must_use]
pub fn signup_page(flashes: &[Flash]) -> Html<String> {
    let mut body = String::from("<form method=\"post\" action=\"/signup\">\n");
    input(&mut body, "Username", "username", "text", "");
    input(&mut body, "Full name", "fullname", "text", "");
    input(&mut body, "Email", "email", "email", "");
    input(&mut body, "Password", "password", "password", "");
    body.push_str("<button type=\"submit\">Sign up</button>\n</form>");
    layout("Sign up", flashes, false, &body)
}

#[must_use]
pub fn dashboard_page(flashes: &[Flash], fullname: &str, exercises: &[Exercise]) -> Html<String> {
    let mut body = format!(
        "<p>Welcome, {}!</p>\n<p>Reports: \
         <a href=\"/report/by_steps\">steps</a> \
         <a href=\"/report/by_distance\">distance</a> \
         <a href=\"/report/by_calories\">calories</a> \
         <a href=\"/report/by_heart_rate\">heart rate</a> \
         <a href=\"/report/by_duration\">duration</a></p>\n",
        encode_text(fullname)
    );

    if exercises.is_empty() {
        body.push_str("<p>No exercises recorded in the last 7 days.</p>");
        return layout("Dashboard", flashes, true, &body);
    }

    body.push_str(
        "<table>\n<tr><th>Date</th><th>Steps</th><th>Distance</th><th>Calories</th>\
         <th>Max HR</th><th>Min HR</th><th>Avg HR</th><th>Duration</th><th></th></tr>\n",
    );
    for exercise in exercises {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td>{}</td><td><a href=\"/update_exercise_tracker/{id}\">Edit</a> \
             <a href=\"/delete_exercise_tracker/{id}\">Delete</a></td></tr>",
            date(&exercise.date),
            exercise.steps_taken,
            exercise.distance,
            exercise.calories_burned,
            exercise.max_heart_rate,
            exercise.min_heart_rate,
            exercise.avg_heart_rate,
            exercise.exercise_duration,
            id = exercise.id,
        );
    }
    body.push_str("</table>");
    layout("Dashboard", flashes, true, &body)
}

fn exercise_form(body: &mut String, action: &str, current: Option<&Exercise>) {
    let value = |f: fn(&Exercise) -> String| current.map(f).unwrap_or_default();
    let _ = writeln!(
        body,
        "<form method=\"post\" action=\"{}\">",
        encode_double_quoted_attribute(action)
    );
    input(body, "Steps taken", "steps_taken", "number", &value(|e| e.steps_taken.to_string()));
    input(body, "Distance", "distance", "text", &value(|e| e.distance.to_string()));
    input(
        body,
        "Calories burned",
        "calories_burned",
        "text",
        &value(|e| e.calories_burned.to_string()),
    );
    input(
        body,
        "Max heart rate",
        "max_heart_rate",
        "number",
        &value(|e| e.max_heart_rate.to_string()),
    );
    input(
        body,
        "Min heart rate",
        "min_heart_rate",
        "number",
        &value(|e| e.min_heart_rate.to_string()),
    );
    input(
        body,
        "Duration (minutes)",
        "exercise_duration",
        "number",
        &value(|e| e.exercise_duration.to_string()),
    );
    body.push_str("<button type=\"submit\">Save</button>\n</form>");
}

#[must_use]
pub fn add_exercise_page(flashes: &[Flash]) -> Html<String> {
    let mut body = String::new();
    exercise_form(&mut body, "/add_exercise_tracker", None);
    layout("Add exercise", flashes, true, &body)
}

#[must_use]
pub fn update_exercise_page(flashes: &[Flash], exercise: &Exercise) -> Html<String> {
    let mut body = format!("<p>Recorded on {}</p>\n", date(&exercise.date));
    exercise_form(
        &mut body,
        &format!("/update_exercise_tracker/{}", exercise.id),
        Some(exercise),
    );
    layout("Update exercise", flashes, true, &body)
}

/// Date column followed by one column per metric.
#[must_use]
pub fn report_page(
    flashes: &[Flash],
    title: &str,
    columns: &[&str],
    rows: &[(DateTime<Utc>, Vec<String>)],
) -> Html<String> {
    let mut body = String::from("<table>\n<tr><th>Date</th>");
    for column in columns {
        let _ = write!(body, "<th>{}</th>", encode_text(column));
    }
    body.push_str("</tr>\n");
    for (when, values) in rows {
        let _ = write!(body, "<tr><td>{}</td>", date(when));
        for value in values {
            let _ = write!(body, "<td>{}</td>", encode_text(value));
        }
        body.push_str("</tr>\n");
    }
    body.push_str("</table>");
    layout(title, flashes, true, &body)
}

#[must_use]
pub fn message_page(title: &str, message: &str) -> Html<String> {
    let body = format!("<p>{}</p>\n<p><a href=\"/\">Home</a></p>", encode_text(message));
    layout(title, &[], false, &body)
}
