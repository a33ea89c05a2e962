use crate::export::{print_html, write_table_xlsx, TableView};
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_opt_str, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

/// Pulls the materialized table out of params: a header list plus rows of
/// cells. The shell sends whatever it currently renders; the store is not
/// consulted.
fn table_from_params(params: &serde_json::Value) -> Result<TableView, HandlerErr> {
    let Some(columns_json) = params.get("columns").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::new("bad_params", "missing columns"));
    };
    let columns: Vec<String> = columns_json
        .iter()
        .map(|v| v.as_str().map(|s| s.to_string()))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| HandlerErr::new("bad_params", "columns must be strings"))?;
    if columns.is_empty() {
        return Err(HandlerErr::new("bad_params", "columns must not be empty"));
    }

    let Some(rows_json) = params.get("rows").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::new("bad_params", "missing rows"));
    };
    let mut rows = Vec::with_capacity(rows_json.len());
    for row in rows_json {
        let Some(cells) = row.as_array() else {
            return Err(HandlerErr::new("bad_params", "each row must be an array"));
        };
        rows.push(cells.clone());
    }

    let mut title = get_opt_str(params, "title");
    if title.is_empty() {
        title = "Table".to_string();
    }

    Ok(TableView {
        title,
        columns,
        rows,
    })
}

fn export_table_xlsx(params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let table = table_from_params(params)?;
    let out_path = PathBuf::from(get_required_str(params, "outPath")?);
    let row_count = write_table_xlsx(&table, &out_path).map_err(|e| HandlerErr {
        code: "export_failed",
        message: format!("{e:?}"),
        details: None,
    })?;
    Ok(json!({
        "path": out_path.to_string_lossy(),
        "rowCount": row_count
    }))
}

fn export_table_print_html(params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let table = table_from_params(params)?;
    Ok(json!({ "html": print_html(&table) }))
}

fn dispatch(
    req: &Request,
    f: fn(&serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    match f(&req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "export.tableXlsx" => Some(dispatch(req, export_table_xlsx)),
        "export.tablePrintHtml" => Some(dispatch(req, export_table_print_html)),
        _ => None,
    }
}
