use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar(extra: &[&str]) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_feedeskd");
    let mut child = Command::new(exe)
        .args(["--today", "2024-02-20"])
        .args(extra)
        .env_remove("FEEDESK_PAGE_SIZE")
        .env_remove("FEEDESK_DEFAULTER_THRESHOLD_DAYS")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn feedeskd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn read_response(reader: &mut BufReader<ChildStdout>, what: &str) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", what);
    serde_json::from_str(line.trim()).expect("parse response json")
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
    let value = read_response(reader, method);
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
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded",
        method
    );
    value.get("error").cloned().expect("error object")
}

fn code(error: &serde_json::Value) -> &str {
    error.get("code").and_then(|v| v.as_str()).unwrap_or("")
}

#[test]
fn reports_total_their_rows_and_reject_unknown_kinds() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    let daily = request_ok(&mut stdin, &mut reader, "1", "reports.get", json!({ "kind": "daily" }));
    assert_eq!(daily["title"], "Daily Collection");
    assert_eq!(daily["rows"].as_array().map(|a| a.len()), Some(3));
    assert_eq!(daily["totalAmount"], 75000.0);
    assert_eq!(daily["totalStudents"], 31);

    let class_wise = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "reports.get",
        json!({ "kind": "class-wise" }),
    );
    assert_eq!(class_wise["kind"], "class-wise");
    assert_eq!(class_wise["totalAmount"], 247000.0);

    let err = request_err(&mut stdin, &mut reader, "3", "reports.get", json!({ "kind": "weekly" }));
    assert_eq!(code(&err), "bad_params");
    assert_eq!(err["details"]["kinds"].as_array().map(|a| a.len()), Some(5));

    let err = request_err(&mut stdin, &mut reader, "4", "reports.get", json!({}));
    assert_eq!(code(&err), "bad_params");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn dashboard_reflects_todays_payments() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    let dash = request_ok(&mut stdin, &mut reader, "1", "dashboard.get", json!({}));
    assert_eq!(dash["totalStudents"], 5);
    assert_eq!(dash["totalPending"], 66000.0);
    assert_eq!(dash["totalCollectedToday"], 0.0);
    assert_eq!(dash["defaulterCount"], 4);
    assert_eq!(dash["recentPayments"].as_array().map(|a| a.len()), Some(0));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "payments.record",
        json!({ "studentId": "5", "amount": 8000, "mode": "cheque", "reference": "CHQ-1182" }),
    );
    // Back-dated payments count toward pending but not today's collection.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "payments.record",
        json!({ "studentId": "4", "amount": 3000, "mode": "cash", "date": "2024-02-19" }),
    );

    let dash = request_ok(&mut stdin, &mut reader, "4", "dashboard.get", json!({}));
    assert_eq!(dash["totalPending"], 55000.0);
    assert_eq!(dash["totalCollectedToday"], 8000.0);
    assert_eq!(dash["defaulterCount"], 3);
    assert_eq!(dash["recentPayments"][0]["receiptNumber"], "RCPT-2");
    assert_eq!(dash["recentPayments"][1]["receiptNumber"], "RCPT-1");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn school_details_can_be_edited() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    let school = request_ok(&mut stdin, &mut reader, "1", "school.get", json!({}));
    assert_eq!(school["name"], "St Marry Champion Public School");

    let err = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "school.update",
        json!({ "form": { "name": "", "email": "office" } }),
    );
    assert_eq!(code(&err), "validation_failed");

    let school = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "school.update",
        json!({ "form": { "name": "Sunrise Public School", "email": "office@sunrise.edu" } }),
    );
    assert_eq!(school["name"], "Sunrise Public School");
    assert_eq!(school["principal"], "Dr. Jagdish Sharma");

    // Reminders and receipts pick up the new name.
    let msg = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "recovery.compose",
        json!({ "defaulterId": "2", "templateId": "2" }),
    );
    assert!(msg["body"].as_str().unwrap_or("").ends_with("Sunrise Public School"));

    drop(stdin);
    let _ = child.wait();
}
