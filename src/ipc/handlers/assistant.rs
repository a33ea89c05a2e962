use crate::assistant;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_ask(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(question) = req.params.get("question").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing question", None);
    };
    if question.trim().is_empty() {
        return err(&req.id, "bad_params", "question must not be empty", None);
    }
    match assistant::answer(&state.db, question) {
        Ok(reply) => ok(&req.id, json!({ "reply": reply })),
        Err(e) => err(&req.id, "assistant_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "assistant.ask" => Some(handle_ask(state, req)),
        _ => None,
    }
}
