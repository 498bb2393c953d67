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

fn names(view: &serde_json::Value) -> Vec<i64> {
    view["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|v| v["n"].as_i64().expect("n"))
        .collect()
}

fn numbered(range: std::ops::RangeInclusive<i64>) -> serde_json::Value {
    serde_json::Value::Array(
        range
            .map(|n| json!({ "n": n, "name": format!("Student {}", n) }))
            .collect(),
    )
}

#[test]
fn load_more_grows_window_until_exhausted() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "pager.open",
        json!({ "pagerId": "results", "items": numbered(1..=10), "initialItemsPerPage": 4, "itemsPerPage": 4 }),
    );
    assert_eq!(names(&opened), vec![1, 2, 3, 4]);
    assert_eq!(opened["window"]["hasMore"], true);

    let second = request_ok(&mut stdin, &mut reader, "2", "pager.loadMore", json!({ "pagerId": "results" }));
    assert_eq!(names(&second), (1..=8i64).collect::<Vec<_>>());
    assert_eq!(second["window"]["hasMore"], true);

    let third = request_ok(&mut stdin, &mut reader, "3", "pager.loadMore", json!({ "pagerId": "results" }));
    assert_eq!(names(&third), (1..=10i64).collect::<Vec<_>>());
    assert_eq!(third["window"]["hasMore"], false);

    let again = request_ok(&mut stdin, &mut reader, "4", "pager.loadMore", json!({ "pagerId": "results" }));
    assert_eq!(again["window"]["displayedCount"], 10);

    let reset = request_ok(&mut stdin, &mut reader, "5", "pager.reset", json!({ "pagerId": "results" }));
    assert_eq!(names(&reset), vec![1, 2, 3, 4]);

    let closed = request_ok(&mut stdin, &mut reader, "6", "pager.close", json!({ "pagerId": "results" }));
    assert_eq!(closed["closed"], true);
    let gone = request(&mut stdin, &mut reader, "7", "pager.get", json!({ "pagerId": "results" }));
    assert_eq!(error_code(&gone), "not_found");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn replacing_data_or_filtering_resets_and_clamps() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "pager.open",
        json!({ "pagerId": "p", "items": numbered(1..=30), "initialItemsPerPage": 5, "itemsPerPage": 10, "searchKeys": ["name"] }),
    );
    request_ok(&mut stdin, &mut reader, "2", "pager.loadMore", json!({ "pagerId": "p" }));
    let grown = request_ok(&mut stdin, &mut reader, "3", "pager.loadMore", json!({ "pagerId": "p" }));
    assert_eq!(grown["window"]["displayedCount"], 25);

    let shorter = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "pager.replace",
        json!({ "pagerId": "p", "items": numbered(1..=3) }),
    );
    assert_eq!(names(&shorter), vec![1, 2, 3]);
    assert_eq!(shorter["window"]["hasMore"], false);

    request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "pager.replace",
        json!({ "pagerId": "p", "items": numbered(1..=30) }),
    );
    request_ok(&mut stdin, &mut reader, "6", "pager.loadMore", json!({ "pagerId": "p" }));

    // "Student 1", "Student 10".."Student 19"
    let searched = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "pager.search",
        json!({ "pagerId": "p", "query": "student 1" }),
    );
    assert_eq!(searched["query"], "student 1");
    assert_eq!(searched["window"]["total"], 11);
    assert_eq!(names(&searched), vec![1, 10, 11, 12, 13]);

    let cleared = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "pager.search",
        json!({ "pagerId": "p", "query": "" }),
    );
    assert_eq!(cleared["window"]["total"], 30);
    assert_eq!(cleared["window"]["displayedCount"], 5);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn search_waits_for_quiet_period_unless_immediate() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "pager.open",
        json!({ "pagerId": "slow", "items": numbered(1..=12), "debounceMs": 60000 }),
    );
    let pending = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "pager.search",
        json!({ "pagerId": "slow", "query": "student 2" }),
    );
    assert_eq!(pending["searchPending"], true);
    assert_eq!(pending["query"], "");
    assert_eq!(pending["window"]["total"], 12);

    let forced = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "pager.search",
        json!({ "pagerId": "slow", "query": "student 12", "immediate": true }),
    );
    assert_eq!(forced["searchPending"], false);
    assert_eq!(names(&forced), vec![12]);

    let bad = request(
        &mut stdin,
        &mut reader,
        "4",
        "pager.open",
        json!({ "pagerId": "zero", "items": [], "itemsPerPage": 0 }),
    );
    assert_eq!(error_code(&bad), "invalid_page_size");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn oversized_page_step_clamps_to_the_list() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "pager.open",
        json!({ "pagerId": "big", "items": numbered(1..=3), "initialItemsPerPage": 1, "itemsPerPage": u64::MAX }),
    );
    let grown = request_ok(&mut stdin, &mut reader, "2", "pager.loadMore", json!({ "pagerId": "big" }));
    assert_eq!(names(&grown), vec![1, 2, 3]);
    assert_eq!(grown["window"]["hasMore"], false);

    let again = request_ok(&mut stdin, &mut reader, "3", "pager.loadMore", json!({ "pagerId": "big" }));
    assert_eq!(again["window"]["displayedCount"], 3);

    drop(stdin);
    let _ = child.wait();
}
