use crate::ipc::error::ok;
use crate::ipc::helpers::{get_opt_str, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;

fn student_row_json(r: &rusqlite::Row<'_>) -> rusqlite::Result<serde_json::Value> {
    Ok(json!({
        "id": r.get::<_, String>(0)?,
        "name": r.get::<_, String>(1)?,
        "className": r.get::<_, String>(2)?,
        "phone": r.get::<_, Option<String>>(3)?,
        "email": r.get::<_, Option<String>>(4)?,
        "status": r.get::<_, String>(5)?,
        "notes": r.get::<_, Option<String>>(6)?,
    }))
}

const STUDENT_COLUMNS: &str = "id, name, class_name, phone, email, status, notes";

fn fetch_student(conn: &Connection, id: &str) -> Result<Option<serde_json::Value>, HandlerErr> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM students WHERE id = ?", STUDENT_COLUMNS),
            [id],
            |r| student_row_json(r),
        )
        .optional()?;
    Ok(row)
}

/// addOrUpdateStudent. `editingId` is the edit-mode token the shell carries
/// while a row is loaded into the form: when it matches `id`
/// case-insensitively the student's mutable fields are updated in place.
/// Any other save is an insert, rejected on a duplicate id.
fn students_save(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_opt_str(params, "id");
    let name = get_opt_str(params, "name");
    let class_name = get_opt_str(params, "className");
    if id.is_empty() || name.is_empty() || class_name.is_empty() {
        return Err(HandlerErr::new(
            "validation_failed",
            "id, name, and className are required",
        ));
    }

    let phone = get_opt_str(params, "phone");
    let email = get_opt_str(params, "email");
    let mut status = get_opt_str(params, "status");
    if status.is_empty() {
        status = "Active".to_string();
    }
    let notes = get_opt_str(params, "notes");

    let editing_id = get_opt_str(params, "editingId");
    let editing = !editing_id.is_empty() && editing_id.eq_ignore_ascii_case(&id);

    if editing {
        let changed = conn
            .execute(
                "UPDATE students
                 SET name = ?, class_name = ?, phone = ?, email = ?, status = ?, notes = ?
                 WHERE id = ?",
                (&name, &class_name, &phone, &email, &status, &notes, &editing_id),
            )
            .map_err(|e| HandlerErr::new("db_update_failed", e.to_string()))?;
        if changed == 0 {
            return Err(HandlerErr::new("not_found", "student not found"));
        }
    } else {
        if fetch_student(conn, &id)?.is_some() {
            return Err(HandlerErr {
                code: "duplicate_id",
                message: "student id already exists".to_string(),
                details: Some(json!({ "id": id })),
            });
        }
        conn.execute(
            "INSERT INTO students(id, name, class_name, phone, email, status, notes)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (&id, &name, &class_name, &phone, &email, &status, &notes),
        )
        .map_err(|e| HandlerErr::new("db_insert_failed", e.to_string()))?;
    }

    let student = fetch_student(conn, &id)?
        .ok_or_else(|| HandlerErr::new("db_query_failed", "saved student missing"))?;
    Ok(json!({ "student": student }))
}

/// Removes the student and every dependent attendance, fee, and mark row.
/// One transaction; partial cascades never survive.
fn students_delete(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(params, "id")?;

    if fetch_student(conn, &id)?.is_none() {
        return Err(HandlerErr::new("not_found", "student not found"));
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_tx_failed", e.to_string()))?;

    let attendance_removed = tx
        .execute("DELETE FROM attendance WHERE student_id = ?", [&id])
        .map_err(|e| HandlerErr::new("db_delete_failed", e.to_string()))?;
    let fees_removed = tx
        .execute("DELETE FROM fees WHERE student_id = ?", [&id])
        .map_err(|e| HandlerErr::new("db_delete_failed", e.to_string()))?;
    let marks_removed = tx
        .execute("DELETE FROM marks WHERE student_id = ?", [&id])
        .map_err(|e| HandlerErr::new("db_delete_failed", e.to_string()))?;
    tx.execute("DELETE FROM students WHERE id = ?", [&id])
        .map_err(|e| HandlerErr::new("db_delete_failed", e.to_string()))?;

    tx.commit()
        .map_err(|e| HandlerErr::new("db_commit_failed", e.to_string()))?;

    Ok(json!({
        "ok": true,
        "removedAttendance": attendance_removed,
        "removedFees": fees_removed,
        "removedMarks": marks_removed
    }))
}

fn students_get(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    // Not-found is a sentinel, not an error: callers probe ids routinely.
    Ok(json!({ "student": fetch_student(conn, &id)? }))
}

fn students_list(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let search = get_opt_str(params, "search");
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM students
         WHERE id LIKE '%' || ?1 || '%'
            OR name LIKE '%' || ?1 || '%'
            OR class_name LIKE '%' || ?1 || '%'
         ORDER BY id",
        STUDENT_COLUMNS
    ))?;
    let students = stmt
        .query_map([&search], |r| student_row_json(r))
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(json!({ "students": students }))
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
        "students.save" => Some(dispatch(state, req, students_save)),
        "students.delete" => Some(dispatch(state, req, students_delete)),
        "students.get" => Some(dispatch(state, req, students_get)),
        "students.list" => Some(dispatch(state, req, students_list)),
        _ => None,
    }
}
