use crate::ipc::error::ok;
use crate::ipc::helpers::{get_opt_str, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;

fn event_row_json(r: &rusqlite::Row<'_>) -> rusqlite::Result<serde_json::Value> {
    Ok(json!({
        "id": r.get::<_, String>(0)?,
        "title": r.get::<_, String>(1)?,
        "date": r.get::<_, Option<String>>(2)?,
        "venue": r.get::<_, Option<String>>(3)?,
        "description": r.get::<_, Option<String>>(4)?,
    }))
}

fn fetch_event(conn: &Connection, id: &str) -> Result<Option<serde_json::Value>, HandlerErr> {
    let row = conn
        .query_row(
            "SELECT id, title, date, venue, description FROM events WHERE id = ?",
            [id],
            |r| event_row_json(r),
        )
        .optional()?;
    Ok(row)
}

// Same save shape as students, minus any cascade targets: events have an
// independent lifecycle.
fn events_save(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_opt_str(params, "id");
    let title = get_opt_str(params, "title");
    if id.is_empty() || title.is_empty() {
        return Err(HandlerErr::new(
            "validation_failed",
            "id and title are required",
        ));
    }
    let date = get_opt_str(params, "date");
    let venue = get_opt_str(params, "venue");
    let description = get_opt_str(params, "description");

    let editing_id = get_opt_str(params, "editingId");
    let editing = !editing_id.is_empty() && editing_id.eq_ignore_ascii_case(&id);

    if editing {
        let changed = conn
            .execute(
                "UPDATE events SET title = ?, date = ?, venue = ?, description = ? WHERE id = ?",
                (&title, &date, &venue, &description, &editing_id),
            )
            .map_err(|e| HandlerErr::new("db_update_failed", e.to_string()))?;
        if changed == 0 {
            return Err(HandlerErr::new("not_found", "event not found"));
        }
    } else {
        if fetch_event(conn, &id)?.is_some() {
            return Err(HandlerErr {
                code: "duplicate_id",
                message: "event id already exists".to_string(),
                details: Some(json!({ "id": id })),
            });
        }
        conn.execute(
            "INSERT INTO events(id, title, date, venue, description) VALUES(?, ?, ?, ?, ?)",
            (&id, &title, &date, &venue, &description),
        )
        .map_err(|e| HandlerErr::new("db_insert_failed", e.to_string()))?;
    }

    let event = fetch_event(conn, &id)?
        .ok_or_else(|| HandlerErr::new("db_query_failed", "saved event missing"))?;
    Ok(json!({ "event": event }))
}

fn events_delete(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let removed = conn
        .execute("DELETE FROM events WHERE id = ?", [&id])
        .map_err(|e| HandlerErr::new("db_delete_failed", e.to_string()))?;
    if removed == 0 {
        return Err(HandlerErr::new("not_found", "event not found"));
    }
    Ok(json!({ "ok": true }))
}

fn events_list(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let search = get_opt_str(params, "search");
    let mut stmt = conn.prepare(
        "SELECT id, title, date, venue, description FROM events
         WHERE id LIKE '%' || ?1 || '%'
            OR title LIKE '%' || ?1 || '%'
            OR IFNULL(date, '') LIKE '%' || ?1 || '%'
         ORDER BY date, id",
    )?;
    let events = stmt
        .query_map([&search], |r| event_row_json(r))
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())?;
    Ok(json!({ "events": events }))
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
        "events.save" => Some(dispatch(state, req, events_save)),
        "events.delete" => Some(dispatch(state, req, events_delete)),
        "events.list" => Some(dispatch(state, req, events_list)),
        _ => None,
    }
}
