use crate::ipc::error::ok;
use crate::ipc::helpers::{get_opt_str, lenient_f64, student_exists, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

/// One fee record per student, overwritten wholesale on every save.
/// Unlike attendance, fees insist the student exists first.
fn fees_upsert(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_opt_str(params, "studentId");
    if student_id.is_empty() {
        return Err(HandlerErr::new("validation_failed", "studentId is required"));
    }
    if !student_exists(conn, &student_id)? {
        return Err(HandlerErr {
            code: "student_not_found",
            message: "student not found; add the student first".to_string(),
            details: Some(json!({ "studentId": student_id })),
        });
    }

    let total = lenient_f64(params, "total");
    let paid = lenient_f64(params, "paid");
    let mut status = get_opt_str(params, "status");
    if status.is_empty() {
        status = "Pending".to_string();
    }
    let remarks = get_opt_str(params, "remarks");

    conn.execute(
        "INSERT INTO fees(id, student_id, total, paid, status, remarks)
         VALUES(?, ?, ?, ?, ?, ?)
         ON CONFLICT(student_id) DO UPDATE SET
           total = excluded.total,
           paid = excluded.paid,
           status = excluded.status,
           remarks = excluded.remarks",
        (
            Uuid::new_v4().to_string(),
            &student_id,
            total,
            paid,
            &status,
            &remarks,
        ),
    )
    .map_err(|e| HandlerErr {
        code: "db_update_failed",
        message: e.to_string(),
        details: Some(json!({ "table": "fees" })),
    })?;

    Ok(json!({
        "fee": {
            "studentId": student_id,
            "total": total,
            "paid": paid,
            "status": status,
            "remarks": remarks
        }
    }))
}

fn fees_list(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let search = get_opt_str(params, "search");
    let mut stmt = conn.prepare(
        "SELECT f.student_id, s.name, s.class_name, f.total, f.paid, f.status, f.remarks
         FROM fees f
         LEFT JOIN students s ON s.id = f.student_id
         WHERE f.student_id LIKE '%' || ?1 || '%'
            OR IFNULL(s.name, '') LIKE '%' || ?1 || '%'
            OR f.status LIKE '%' || ?1 || '%'
         ORDER BY f.student_id",
    )?;
    let fees = stmt
        .query_map([&search], |r| {
            Ok(json!({
                "studentId": r.get::<_, String>(0)?,
                "studentName": r.get::<_, Option<String>>(1)?,
                "className": r.get::<_, Option<String>>(2)?,
                "total": r.get::<_, f64>(3)?,
                "paid": r.get::<_, f64>(4)?,
                "status": r.get::<_, String>(5)?,
                "remarks": r.get::<_, Option<String>>(6)?,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(json!({ "fees": fees }))
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
        "fees.upsert" => Some(dispatch(state, req, fees_upsert)),
        "fees.list" => Some(dispatch(state, req, fees_list)),
        _ => None,
    }
}
