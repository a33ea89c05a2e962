use crate::ipc::error::err;
use rusqlite::{Connection, OptionalExtension};

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<rusqlite::Error> for HandlerErr {
    fn from(e: rusqlite::Error) -> Self {
        HandlerErr::new("db_query_failed", e.to_string())
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

pub fn get_opt_str(params: &serde_json::Value, key: &str) -> String {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Lenient numeric intake: accepts a JSON number or a numeric string.
/// Blank, missing, or unparseable input counts as 0 rather than failing.
pub fn lenient_f64(params: &serde_json::Value, key: &str) -> f64 {
    match params.get(key) {
        Some(v) => {
            if let Some(n) = v.as_f64() {
                n
            } else if let Some(s) = v.as_str() {
                s.trim().parse::<f64>().unwrap_or(0.0)
            } else {
                0.0
            }
        }
        None => 0.0,
    }
}

pub fn student_exists(conn: &Connection, student_id: &str) -> Result<bool, HandlerErr> {
    let found = conn
        .query_row("SELECT 1 FROM students WHERE id = ?", [student_id], |r| {
            r.get::<_, i64>(0)
        })
        .optional()?;
    Ok(found.is_some())
}

/// Today's local calendar date as YYYY-MM-DD, the default for attendance
/// operations that omit a date.
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

pub fn date_or_today(params: &serde_json::Value, key: &str) -> String {
    let given = get_opt_str(params, key);
    if given.is_empty() {
        today()
    } else {
        given
    }
}
