use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_campushubd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn campushubd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn upsert_requires_an_existing_student() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "fees.upsert",
        json!({ "studentId": "STU1", "total": 5000 }),
    );
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["error"]["code"].as_str(), Some("student_not_found"));

    let fees = request_ok(&mut stdin, &mut reader, "2", "fees.list", json!({}));
    assert_eq!(fees["fees"].as_array().map(|a| a.len()), Some(0));
}

#[test]
fn second_upsert_overwrites_instead_of_accumulating() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.save",
        json!({ "id": "STU1", "name": "Asha", "className": "10A" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "fees.upsert",
        json!({ "studentId": "STU1", "total": 5000, "paid": 2000, "status": "Pending", "remarks": "first term" }),
    );
    // Different casing of the student id still lands on the same row.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "fees.upsert",
        json!({ "studentId": "stu1", "total": 6000, "paid": 6000, "status": "Paid" }),
    );

    let fees = request_ok(&mut stdin, &mut reader, "4", "fees.list", json!({}));
    let rows = fees["fees"].as_array().expect("fees array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["total"], 6000.0);
    assert_eq!(rows[0]["paid"], 6000.0);
    assert_eq!(rows[0]["status"], "Paid");
    assert_eq!(rows[0]["studentName"], "Asha");
}

#[test]
fn non_numeric_amounts_fall_back_to_zero() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.save",
        json!({ "id": "STU1", "name": "Asha", "className": "10A" }),
    );
    let fee = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "fees.upsert",
        json!({ "studentId": "STU1", "total": "abc", "paid": "" }),
    );
    assert_eq!(fee["fee"]["total"], 0.0);
    assert_eq!(fee["fee"]["paid"], 0.0);
    assert_eq!(fee["fee"]["status"], "Pending");

    // Numeric strings do parse.
    let fee = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "fees.upsert",
        json!({ "studentId": "STU1", "total": "4500.5", "paid": "1000" }),
    );
    assert_eq!(fee["fee"]["total"], 4500.5);
    assert_eq!(fee["fee"]["paid"], 1000.0);
}

#[test]
fn list_filters_by_student_name_and_status() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.save",
        json!({ "id": "STU1", "name": "Asha", "className": "10A" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.save",
        json!({ "id": "STU2", "name": "Ravi", "className": "9B" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "fees.upsert",
        json!({ "studentId": "STU1", "total": 5000, "paid": 5000, "status": "Paid" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "fees.upsert",
        json!({ "studentId": "STU2", "total": 5000, "paid": 0, "status": "Pending" }),
    );

    let by_name = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "fees.list",
        json!({ "search": "ravi" }),
    );
    let rows = by_name["fees"].as_array().expect("fees array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["studentId"], "STU2");

    let by_status = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "fees.list",
        json!({ "search": "paid" }),
    );
    assert_eq!(by_status["fees"].as_array().map(|a| a.len()), Some(1));
}
