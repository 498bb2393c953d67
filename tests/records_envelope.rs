use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_schoold");
    let mut child = Command::new(exe)
        .env("SCHOOLD_LOG", "warn")
        .env("SCHOOLD_SEARCH_DEBOUNCE_MS", "0")
        .env_remove("SCHOOLD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn schoold");
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
    assert!(!line.trim().is_empty(), "empty response for {}", method);
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
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or(serde_json::Value::Null)
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

#[test]
fn nested_and_flat_envelopes_import_the_same_way() {
    let workspace = temp_dir("schoold-records");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let nested = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "stakeholders.import",
        json!({ "payload": { "data": { "data": [
            { "id": "t1", "type": "staff", "first_name": "Ifeoma", "last_name": "Nwosu", "email": "ifeoma@school.test" },
        ], "total": 1, "page": 1 } } }),
    );
    assert_eq!(nested["imported"], 1);
    assert_eq!(nested["meta"]["total"], 1);

    let flat = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "stakeholders.import",
        json!({ "payload": { "data": [
            { "id": "p1", "kind": "parent", "firstName": "Yusuf", "lastName": "Bello" },
            { "id": "t1", "type": "staff", "first_name": "Ifeoma", "last_name": "Nwosu-Obi" },
        ] } }),
    );
    assert_eq!(flat["imported"], 2);

    let single = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "stakeholders.import",
        json!({ "payload": { "data": { "id": "s1", "type": "student", "first_name": "Tobi", "last_name": "Ade", "class_name": "JSS 3" } } }),
    );
    assert_eq!(single["imported"], 1);

    let all = request_ok(&mut stdin, &mut reader, "5", "stakeholders.list", json!({}));
    assert_eq!(all["stakeholders"].as_array().map(|a| a.len()), Some(3));

    let staff = request_ok(&mut stdin, &mut reader, "6", "stakeholders.list", json!({ "kind": "staff" }));
    assert_eq!(staff["stakeholders"][0]["lastName"], "Nwosu-Obi");
    assert!(staff["stakeholders"][0]["email"].is_null());

    let bad_shape = request(
        &mut stdin,
        &mut reader,
        "7",
        "stakeholders.import",
        json!({ "payload": { "items": [] } }),
    );
    assert_eq!(error_code(&bad_shape), "bad_envelope");

    let bad_record = request(
        &mut stdin,
        &mut reader,
        "8",
        "stakeholders.import",
        json!({ "payload": [{ "id": "x" }] }),
    );
    assert_eq!(error_code(&bad_record), "bad_params");

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "products.create",
        json!({ "name": "Puff Puff", "priceCents": 200 }),
    );
    assert_eq!(created["product"]["available"], true);
    let negative = request(
        &mut stdin,
        &mut reader,
        "10",
        "products.create",
        json!({ "name": "Refund", "priceCents": -5 }),
    );
    assert_eq!(error_code(&negative), "bad_params");

    let negative_import = request(
        &mut stdin,
        &mut reader,
        "11",
        "products.import",
        json!({ "payload": { "data": [
            { "id": "ok", "name": "Water", "priceCents": 100 },
            { "id": "refund", "name": "Refund", "priceCents": -5 },
        ] } }),
    );
    assert_eq!(error_code(&negative_import), "bad_params");
    let products = request_ok(&mut stdin, &mut reader, "12", "products.list", json!({}));
    assert!(products["products"]
        .as_array()
        .expect("products")
        .iter()
        .all(|p| p["id"] != "ok" && p["id"] != "refund"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn configured_workspace_opens_at_startup() {
    let workspace = temp_dir("schoold-env-workspace");
    let exe = env!("CARGO_BIN_EXE_schoold");
    let mut child = Command::new(exe)
        .env("SCHOOLD_LOG", "warn")
        .env("SCHOOLD_WORKSPACE", &workspace)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn schoold");
    let mut stdin = child.stdin.take().expect("child stdin");
    let mut reader = BufReader::new(child.stdout.take().expect("child stdout"));

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(
        health["workspacePath"].as_str(),
        Some(workspace.to_string_lossy().as_ref())
    );
    request_ok(&mut stdin, &mut reader, "2", "products.list", json!({}));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
