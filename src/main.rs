mod assistant;
mod db;
mod export;
mod ipc;

use std::io::{self, BufRead, Write};

fn main() {
    // The record store lives in memory for the lifetime of the process.
    // Nothing is persisted: closing the sidecar drops every record.
    let conn = match db::open_store() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to initialize record store: {e:?}");
            std::process::exit(1);
        }
    };
    let mut state = ipc::AppState { db: conn };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply with an id; emit a best-effort error line.
                let _ = writeln!(
                    stdout,
                    "{{\"ok\":false,\"error\":{{\"code\":\"bad_json\",\"message\":\"{}\"}}}}",
                    e
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
