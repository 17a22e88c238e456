use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[pins]
clock = 6
data = 5

[acquisition]
poll_interval_ms = 5
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn last_json_line(bytes: &[u8]) -> serde_json::Value {
    let text = String::from_utf8_lossy(bytes);
    let line = text
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .expect("some output");
    serde_json::from_str(line).expect("last line is JSON")
}

/// Every stdout line of a JSON read is one reading object.
#[rstest]
fn jsonl_reading_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = Command::cargo_bin("hx711")
        .unwrap()
        .arg("--json")
        .arg("--log-level")
        .arg("warn")
        .arg("--config")
        .arg(&cfg)
        .args(["read", "--count", "3"])
        .env("HX711_SIM_COUNTS", "-512")
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines.len(), 3);
    let mut last_ts = None;
    for line in lines {
        let v: serde_json::Value = serde_json::from_str(line).expect("reading JSON");
        for key in ["timestamp_ms", "raw", "smoothed", "counts", "net", "value"] {
            assert!(v.get(key).is_some(), "missing {key} in {line}");
        }
        assert_eq!(v["counts"], -512);
        assert_eq!(v["raw"], -512 * 256);
        assert_eq!(v["value"], -512);
        let ts = v["timestamp_ms"].as_u64().expect("timestamp");
        if let Some(prev) = last_ts {
            assert!(ts > prev, "timestamps must increase");
        }
        last_ts = Some(ts);
    }
}

/// Errors in JSON mode are a single object on stderr.
#[rstest]
fn jsonl_error_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = Command::cargo_bin("hx711")
        .unwrap()
        .arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .env("HX711_SIM_DISCONNECTED", "1")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));

    let status = last_json_line(&out.stdout);
    assert_eq!(status["status"], "timed_out");

    let err = last_json_line(&out.stderr);
    assert_eq!(err["reason"], "NotResponding");
    assert_eq!(err["details"]["busy_timeout_ms"], 500);
    assert!(err["message"].is_string());
}
