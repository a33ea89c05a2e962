use crate::ipc::error::ok;
use crate::ipc::helpers::{get_opt_str, lenient_f64, student_exists, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

/// Upsert keyed by (studentId, subject, exam), all three folded for case.
/// A repeat save changes obtained/total only, so the key keeps the casing
/// it was first entered with.
fn marks_upsert(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_opt_str(params, "studentId");
    let subject = get_opt_str(params, "subject");
    let exam = get_opt_str(params, "exam");
    if student_id.is_empty() || subject.is_empty() || exam.is_empty() {
        return Err(HandlerErr::new(
            "validation_failed",
            "studentId, subject, and exam are required",
        ));
    }
    if !student_exists(conn, &student_id)? {
        return Err(HandlerErr {
            code: "student_not_found",
            message: "student not found; add the student first".to_string(),
            details: Some(json!({ "studentId": student_id })),
        });
    }

    let obtained = lenient_f64(params, "obtained");
    let total = lenient_f64(params, "total");

    conn.execute(
        "INSERT INTO marks(id, student_id, subject, exam, obtained, total)
         VALUES(?, ?, ?, ?, ?, ?)
         ON CONFLICT(student_id, subject, exam) DO UPDATE SET
           obtained = excluded.obtained,
           total = excluded.total",
        (
            Uuid::new_v4().to_string(),
            &student_id,
            &subject,
            &exam,
            obtained,
            total,
        ),
    )
    .map_err(|e| HandlerErr {
        code: "db_update_failed",
        message: e.to_string(),
        details: Some(json!({ "table": "marks" })),
    })?;

    Ok(json!({
        "mark": {
            "studentId": student_id,
            "subject": subject,
            "exam": exam,
            "obtained": obtained,
            "total": total
        }
    }))
}

fn marks_list(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let search = get_opt_str(params, "search");
    let mut stmt = conn.prepare(
        "SELECT m.student_id, s.name, s.class_name, m.subject, m.exam, m.obtained, m.total
         FROM marks m
         LEFT JOIN students s ON s.id = m.student_id
         WHERE m.student_id LIKE '%' || ?1 || '%'
            OR IFNULL(s.name, '') LIKE '%' || ?1 || '%'
            OR m.subject LIKE '%' || ?1 || '%'
         ORDER BY m.student_id, m.subject, m.exam",
    )?;
    let marks = stmt
        .query_map([&search], |r| {
            Ok(json!({
                "studentId": r.get::<_, String>(0)?,
                "studentName": r.get::<_, Option<String>>(1)?,
                "className": r.get::<_, Option<String>>(2)?,
                "subject": r.get::<_, String>(3)?,
                "exam": r.get::<_, String>(4)?,
                "obtained": r.get::<_, f64>(5)?,
                "total": r.get::<_, f64>(6)?,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(json!({ "marks": marks }))
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
        "marks.upsert" => Some(dispatch(state, req, marks_upsert)),
        "marks.list" => Some(dispatch(state, req, marks_list)),
        _ => None,
    }
}
