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
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["today"], "2024-02-20");
    assert_eq!(health["signedIn"], false);

    let cfg = request_ok(&mut stdin, &mut reader, "2", "config.get", json!({}));
    assert_eq!(cfg["pageSize"], 50);
    assert_eq!(cfg["defaulterThresholdDays"], 30);
    assert_eq!(cfg["today"], "2024-02-20");

    // One method from every handler family must route somewhere.
    let methods = [
        ("students.view", json!({})),
        ("buses.assignStudent", json!({})),
        ("staff.toggleActive", json!({})),
        ("fees.status", json!({})),
        ("recovery.templates", json!({})),
        ("payments.receipt", json!({})),
        ("reports.get", json!({})),
        ("dashboard.get", json!({})),
        ("school.get", json!({})),
        ("auth.session", json!({})),
        ("notifications.unreadCount", json!({})),
        ("whatsapp.get", json!({})),
        ("profile.get", json!({})),
    ];
    for (i, (method, params)) in methods.iter().enumerate() {
        let value = request(&mut stdin, &mut reader, &format!("m{}", i), method, params.clone());
        if value["ok"] == false {
            assert_ne!(value["error"]["code"], "not_implemented", "{} not routed", method);
        }
    }

    let err = request_err(&mut stdin, &mut reader, "3", "students.teleport", json!({}));
    assert_eq!(code(&err), "not_implemented");
    let err = request_err(&mut stdin, &mut reader, "4", "feeAccounts.create", json!({}));
    assert_eq!(code(&err), "not_implemented");

    writeln!(stdin, "this is not json").expect("write garbage");
    stdin.flush().expect("flush");
    let bad = read_response(&mut reader, "garbage");
    assert_eq!(bad["ok"], false);
    assert_eq!(bad["error"]["code"], "bad_json");

    // The daemon keeps serving after a bad line.
    let _ = request_ok(&mut stdin, &mut reader, "5", "health", json!({}));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn login_checks_credentials_and_logout_closes_screens() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    let err = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "username": "admin" }),
    );
    assert_eq!(code(&err), "validation_failed");
    assert_eq!(err["details"]["errors"][0]["field"], "password");

    let err = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "username": "admin", "password": "wrong" }),
    );
    assert_eq!(code(&err), "unauthorized");

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "auth.login",
        json!({ "username": "admin", "password": "password" }),
    );
    assert_eq!(res["session"]["username"], "admin");
    assert!(res["session"]["token"]
        .as_str()
        .unwrap_or("")
        .starts_with("demo-"));

    let _ = request_ok(&mut stdin, &mut reader, "4", "students.open", json!({}));
    let res = request_ok(&mut stdin, &mut reader, "5", "auth.logout", json!({}));
    assert_eq!(res["signedOut"], true);
    let session = request_ok(&mut stdin, &mut reader, "6", "auth.session", json!({}));
    assert!(session["session"].is_null());

    let err = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "students.search",
        json!({ "search": "a" }),
    );
    assert_eq!(code(&err), "not_loaded");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn fee_status_rule_is_exposed_for_single_sessions() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "fees.status",
        json!({ "amount": 15000, "paid": 5000, "dueDate": "2023-10-15" }),
    );
    assert_eq!(res["status"], "PartialOverdue");
    assert_eq!(res["label"], "Partial (Overdue)");
    assert_eq!(res["balance"], 10000.0);
    assert_eq!(res["overdueMonths"], 4);
    assert_eq!(res["dueFor"], "4 months");

    // On the due date itself the session is not yet overdue.
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "fees.status",
        json!({ "amount": 15000, "paid": 5000, "dueDate": "2023-10-15", "today": "2023-10-15" }),
    );
    assert_eq!(res["status"], "Partial");
    assert_eq!(res["overdue"], false);
    assert!(res["dueFor"].is_null());

    let err = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "fees.status",
        json!({ "amount": 100, "dueDate": "15/10/2023" }),
    );
    assert_eq!(code(&err), "bad_params");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn failing_source_surfaces_error_states() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&["--demo-failure", "offline"]);

    let err = request_err(&mut stdin, &mut reader, "1", "students.open", json!({}));
    assert_eq!(code(&err), "load_failed");
    assert_eq!(err["details"]["load"]["state"], "failed");
    assert_eq!(err["details"]["rows"].as_array().map(|a| a.len()), Some(0));
    assert_eq!(err["details"]["empty"], false);

    let view = request_ok(&mut stdin, &mut reader, "2", "students.view", json!({}));
    assert_eq!(view["load"]["state"], "failed");

    let err = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "students.search",
        json!({ "search": "jai" }),
    );
    assert_eq!(code(&err), "not_loaded");

    let err = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "reports.get",
        json!({ "kind": "daily" }),
    );
    assert_eq!(code(&err), "source_failed");
    assert_eq!(err["details"]["kind"], "source_unavailable");

    let err = request_err(&mut stdin, &mut reader, "5", "dashboard.get", json!({}));
    assert_eq!(code(&err), "load_failed");

    drop(stdin);
    let _ = child.wait();
}
