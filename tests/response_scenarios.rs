use std::{hint::black_box, thread, time::Duration};

use magickit::{Response, ResponseRecord};
use serde_json::Value;

fn add(a: i32, b: i32) -> i32 {
    a + b
}

fn divide_by_zero() -> i32 {
    let zero = black_box(0);
    1 / zero
}

fn checked_divide(a: i32, b: i32) -> Result<i32, String> {
    a.checked_div(b).ok_or_else(|| "division by zero".to_string())
}

#[test]
fn add_succeeds() {
    let response = Response::call_with(add, (10, 20));
    assert!(response.success());
    assert_eq!(response.result(), Some(&30));
    assert!(response.error_message().is_none());
    assert!(response.execution_time() >= 0.0);
}

#[test]
fn integer_division_by_zero_is_captured() {
    let response = Response::call(divide_by_zero);
    assert!(!response.success());
    assert!(response.result().is_none());
    let message = response.error_message().unwrap();
    assert!(message.contains("divide by zero"), "{message}");
    assert!(response.execution_time() >= 0.0);
}

#[test]
fn returned_error_is_captured() {
    let response = Response::execute_with(checked_divide, (1, 0));
    assert!(response.has_error());
    assert_eq!(response.error_message(), Some("division by zero"));
    assert_eq!(response.error_name(), Some("String"));
}

#[test]
fn sleep_is_reflected_in_execution_time() {
    let response = Response::call(|| {
        thread::sleep(Duration::from_millis(50));
        "done"
    });
    assert!(response.success());
    assert!(response.execution_time() >= 0.05, "{}", response.execution_time());
}

#[test]
fn indented_json_has_four_fields() {
    let response = Response::call_with(add, (10, 20));
    let text = response.to_json(Some(2)).unwrap();

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.first(), Some(&"{"));
    assert_eq!(lines.last(), Some(&"}"));
    assert_eq!(lines.len(), 6);
    for line in &lines[1..5] {
        assert!(line.starts_with("  \""), "{line:?}");
        assert!(!line.starts_with("   "), "{line:?}");
    }
    assert_eq!(lines[1], "  \"success\": true,");
    assert_eq!(lines[2], "  \"result\": 30,");
    assert_eq!(lines[3], "  \"error_message\": null,");
    assert!(lines[4].starts_with("  \"execution_time\": "));

    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value.as_object().unwrap().len(), 4);
}

#[test]
fn serialization_is_deterministic_and_round_trips() {
    let response = Response::call_with(add, (10, 20));
    let first = response.to_json(None).unwrap();
    assert_eq!(first, response.to_json(None).unwrap());

    let record: ResponseRecord<i32> = ResponseRecord::from_json(&first).unwrap();
    assert!(record.success);
    assert_eq!(record.result, Some(30));
    assert_eq!(record.error_message, None);
    assert_eq!(record.execution_time, response.execution_time());

    let failed = Response::call(divide_by_zero);
    let record: ResponseRecord<i32> = ResponseRecord::from_json(&failed.to_json(Some(4)).unwrap()).unwrap();
    assert!(!record.success);
    assert_eq!(record.result, None);
    assert_eq!(record.error_message.as_deref(), failed.error_message());
}

/// Re-run one test of this binary in a child process and return its stderr.
fn child_stderr(test: &str) -> String {
    let out = std::process::Command::new(std::env::current_exe().unwrap())
        .args([test, "--exact", "--nocapture", "--test-threads=1"])
        .env("MAGICKIT_PANIC_CHILD", "1")
        .output()
        .unwrap();
    assert!(out.status.success(), "{test} failed in child process");
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn in_child() -> bool {
    std::env::var_os("MAGICKIT_PANIC_CHILD").is_some()
}

#[test]
fn captured_panic_prints_nothing_to_stderr() {
    if in_child() {
        let response = Response::call(divide_by_zero);
        assert!(!response.success());
        return;
    }
    let stderr = child_stderr("captured_panic_prints_nothing_to_stderr");
    assert!(!stderr.contains("panicked"), "{stderr}");
}

#[test]
fn panics_outside_capture_still_reach_the_hook() {
    if in_child() {
        let _ = Response::call(divide_by_zero);
        let outside = thread::spawn(|| panic!("outside capture")).join();
        assert!(outside.is_err());
        return;
    }
    let stderr = child_stderr("panics_outside_capture_still_reach_the_hook");
    assert!(stderr.contains("outside capture"), "{stderr}");
    assert!(!stderr.contains("divide by zero"), "{stderr}");
}
