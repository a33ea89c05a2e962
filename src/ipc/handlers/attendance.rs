use crate::db;
use crate::ipc::error::ok;
use crate::ipc::helpers::{date_or_today, get_opt_str, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

const STATUSES: &[&str] = &["Present", "Absent", "Leave"];

fn check_status(status: &str) -> Result<(), HandlerErr> {
    if STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(HandlerErr {
            code: "bad_params",
            message: "status must be Present, Absent, or Leave".to_string(),
            details: Some(json!({ "status": status })),
        })
    }
}

fn upsert_row(conn: &Connection, date: &str, student_id: &str, status: &str) -> Result<(), HandlerErr> {
    // No roster check here: the store accepts attendance for any studentId,
    // unlike fees and marks, and listings resolve the student at read time.
    conn.execute(
        "INSERT INTO attendance(id, date, student_id, status)
         VALUES(?, ?, ?, ?)
         ON CONFLICT(date, student_id) DO UPDATE SET
           status = excluded.status",
        (Uuid::new_v4().to_string(), date, student_id, status),
    )
    .map_err(|e| HandlerErr {
        code: "db_update_failed",
        message: e.to_string(),
        details: Some(json!({ "table": "attendance" })),
    })?;
    Ok(())
}

fn attendance_set(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let date = date_or_today(params, "date");
    let student_id = get_required_str(params, "studentId")?;
    let status = get_required_str(params, "status")?;
    if student_id.is_empty() {
        return Err(HandlerErr::new("bad_params", "studentId must not be empty"));
    }
    check_status(&status)?;
    upsert_row(conn, &date, &student_id, &status)?;
    Ok(json!({ "date": date }))
}

/// Saves a whole day's sheet in one transaction. Rows the shell left on
/// "--" arrive with an empty status and are skipped, matching the form.
fn attendance_sheet_save(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = date_or_today(params, "date");
    let Some(entries) = params.get("entries").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::new("bad_params", "missing entries"));
    };

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_tx_failed", e.to_string()))?;
    let mut saved = 0i64;
    for entry in entries {
        let student_id = get_opt_str(entry, "studentId");
        let status = get_opt_str(entry, "status");
        if student_id.is_empty() || status.is_empty() {
            continue;
        }
        check_status(&status)?;
        upsert_row(&tx, &date, &student_id, &status)?;
        saved += 1;
    }
    tx.commit()
        .map_err(|e| HandlerErr::new("db_commit_failed", e.to_string()))?;

    Ok(json!({ "date": date, "saved": saved }))
}

fn attendance_list(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let date = get_opt_str(params, "date");
    // Student name/class are resolved per row at read time; an orphaned
    // studentId lists with nulls rather than breaking the log.
    let mut stmt = conn.prepare(
        "SELECT a.date, a.student_id, a.status, s.name, s.class_name
         FROM attendance a
         LEFT JOIN students s ON s.id = a.student_id
         WHERE ?1 = '' OR a.date = ?1
         ORDER BY a.date, a.student_id",
    )?;
    let records = stmt
        .query_map([&date], |r| {
            Ok(json!({
                "date": r.get::<_, String>(0)?,
                "studentId": r.get::<_, String>(1)?,
                "status": r.get::<_, String>(2)?,
                "studentName": r.get::<_, Option<String>>(3)?,
                "className": r.get::<_, Option<String>>(4)?,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(json!({ "records": records }))
}

fn attendance_daily_rate(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = date_or_today(params, "date");
    let (present, total, percent) = db::daily_attendance(conn, &date)?;
    Ok(json!({
        "date": date,
        "present": present,
        "total": total,
        "percent": percent
    }))
}

fn dispatch(
    state: &mut AppState,
    req: &Request,
    f: fn(&Connection, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    match f(&state.db, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.set" => Some(dispatch(state, req, attendance_set)),
        "attendance.sheetSave" => Some(dispatch(state, req, attendance_sheet_save)),
        "attendance.list" => Some(dispatch(state, req, attendance_list)),
        "attendance.dailyRate" => Some(dispatch(state, req, attendance_daily_rate)),
        _ => None,
    }
}
