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

fn error_fields(err: &serde_json::Value) -> Vec<String> {
    err["details"]["errors"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .filter_map(|e| e.get("field").and_then(|v| v.as_str()).map(str::to_string))
        .collect()
}
fn ids(view: &serde_json::Value) -> Vec<String> {
    view["rows"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .filter_map(|r| r.get("id").and_then(|v| v.as_str()).map(str::to_string))
        .collect()
}

#[test]
fn inbox_tracks_unread_notifications() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    let err = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "notifications.markAsRead",
        json!({ "id": "1" }),
    );
    assert_eq!(code(&err), "not_loaded");

    // The badge count loads the inbox on demand.
    let res = request_ok(&mut stdin, &mut reader, "2", "notifications.unreadCount", json!({}));
    assert_eq!(res["unread"], 4);

    let view = request_ok(&mut stdin, &mut reader, "3", "notifications.open", json!({}));
    assert_eq!(view["page"]["totalItems"], 7);

    let view = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "notifications.select",
        json!({ "field": "read", "value": "false" }),
    );
    assert_eq!(ids(&view), vec!["1", "3", "5", "6"]);

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "notifications.markAsRead",
        json!({ "id": "1" }),
    );
    assert_eq!(res["record"]["read"], true);
    assert_eq!(res["unread"], 3);
    assert_eq!(ids(&res["view"]), vec!["3", "5", "6"]);

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "notifications.delete",
        json!({ "id": "3" }),
    );
    assert_eq!(res["record"]["title"], "Holiday Notice");
    assert_eq!(res["unread"], 2);

    let err = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "notifications.delete",
        json!({ "id": "3" }),
    );
    assert_eq!(code(&err), "not_found");

    let res = request_ok(&mut stdin, &mut reader, "8", "notifications.markAllAsRead", json!({}));
    assert_eq!(res["marked"], 2);
    assert_eq!(res["unread"], 0);
    assert_eq!(res["view"]["empty"], true);

    let res = request_ok(&mut stdin, &mut reader, "9", "notifications.unreadCount", json!({}));
    assert_eq!(res["unread"], 0);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn payments_post_a_notice_to_the_open_inbox() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    let _ = request_ok(&mut stdin, &mut reader, "1", "notifications.open", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "notifications.sort",
        json!({ "field": "date", "dir": "desc" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "payments.record",
        json!({ "studentId": "1", "amount": 5000, "mode": "cash" }),
    );

    let view = request_ok(&mut stdin, &mut reader, "4", "notifications.view", json!({}));
    assert_eq!(view["page"]["totalItems"], 8);
    let notice = &view["rows"][0];
    assert_eq!(notice["id"], "RCPT-1");
    assert_eq!(notice["type"], "fee");
    assert_eq!(notice["read"], false);
    assert!(notice["message"]
        .as_str()
        .unwrap_or("")
        .contains("Rs. 5,000"));

    let res = request_ok(&mut stdin, &mut reader, "5", "notifications.unreadCount", json!({}));
    assert_eq!(res["unread"], 5);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn whatsapp_settings_are_validated_and_redacted() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    let res = request_ok(&mut stdin, &mut reader, "1", "whatsapp.get", json!({}));
    assert_eq!(res["enabled"], true);
    assert_eq!(res["apiKey"], "wha_***********cdef");
    assert_eq!(res["apiKeySet"], true);

    let err = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "whatsapp.update",
        json!({ "form": { "apiKey": "short" } }),
    );
    assert_eq!(code(&err), "validation_failed");
    assert_eq!(error_fields(&err), vec!["apiKey"]);

    let err = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "whatsapp.update",
        json!({ "form": { "defaultTemplate": "Dear [GUARDIAN], fees are due." } }),
    );
    assert_eq!(error_fields(&err), vec!["defaultTemplate"]);

    let err = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "whatsapp.update",
        json!({ "form": { "enabled": true, "apiKey": "" } }),
    );
    assert_eq!(error_fields(&err), vec!["apiKey"]);

    // Rejected updates leave the stored settings alone.
    let res = request_ok(&mut stdin, &mut reader, "5", "whatsapp.get", json!({}));
    assert_eq!(res["apiKey"], "wha_***********cdef");

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "whatsapp.update",
        json!({ "form": {
            "enabled": false,
            "apiKey": "",
            "defaultTemplate": "Dear [PARENT_NAME], fees for [STUDENT_NAME] are due."
        } }),
    );
    assert_eq!(res["enabled"], false);
    assert_eq!(res["apiKeySet"], false);
    assert_eq!(
        res["defaultTemplate"],
        "Dear [PARENT_NAME], fees for [STUDENT_NAME] are due."
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn profile_needs_a_session_and_updates_the_header_name() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);

    let err = request_err(&mut stdin, &mut reader, "1", "profile.get", json!({}));
    assert_eq!(code(&err), "unauthorized");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "auth.login",
        json!({ "username": "admin", "password": "password" }),
    );
    let res = request_ok(&mut stdin, &mut reader, "3", "profile.get", json!({}));
    assert_eq!(res["name"], "Admin User");
    assert_eq!(res["role"], "Administrator");
    assert_eq!(res["joinedDate"], "2022-01-15");

    let err = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "profile.update",
        json!({ "form": { "name": "", "email": "admin-at-school", "phone": "12" } }),
    );
    assert_eq!(code(&err), "validation_failed");
    assert_eq!(error_fields(&err), vec!["name", "email", "phone"]);

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "profile.update",
        json!({ "form": { "name": "Anita Rao", "email": "anita@schoolmgmt.com" } }),
    );
    assert_eq!(res["name"], "Anita Rao");
    assert_eq!(res["phone"], "+91 9876543210");
    assert_eq!(res["department"], "Administration");

    let session = request_ok(&mut stdin, &mut reader, "6", "auth.session", json!({}));
    assert_eq!(session["session"]["name"], "Anita Rao");

    let _ = request_ok(&mut stdin, &mut reader, "7", "auth.logout", json!({}));
    let err = request_err(&mut stdin, &mut reader, "8", "profile.get", json!({}));
    assert_eq!(code(&err), "unauthorized");

    drop(stdin);
    let _ = child.wait();
}
