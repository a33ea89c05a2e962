use crate::db;
use crate::ipc::error::ok;
use crate::ipc::helpers::{date_or_today, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    let total = db::count_students(&state.db).unwrap_or(0);
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "totalStudents": total
        }),
    )
}

// The sidebar stat panel: roster size plus one day's attendance rate.
fn stats_overview(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let date = date_or_today(params, "date");
    let total_students = db::count_students(conn)?;
    let (present, total, percent) = db::daily_attendance(conn, &date)?;
    Ok(json!({
        "totalStudents": total_students,
        "attendance": {
            "date": date,
            "present": present,
            "total": total,
            "percent": percent
        }
    }))
}

fn handle_stats_overview(state: &mut AppState, req: &Request) -> serde_json::Value {
    match stats_overview(&state.db, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "stats.overview" => Some(handle_stats_overview(state, req)),
        _ => None,
    }
}
