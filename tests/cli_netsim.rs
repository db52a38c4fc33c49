use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "dvnet-sim-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

const CASE: &str = r#"
{
  "hosts": ["H1", "H2"],
  "routers": ["R1"],
  "links": [
    { "name": "L1", "a": "H1", "b": "R1", "rate_mbps": 10, "delay_ms": 5, "buffer_kb": 64 },
    { "name": "L2", "a": "R1", "b": "H2", "rate_mbps": 10, "delay_ms": 5, "buffer_kb": 64 }
  ],
  "flows": [
    { "name": "F1", "src": "H1", "dst": "H2", "data_mb": 0.1, "start_s": 0.1, "tla": { "kind": "go_back_n", "window": 16 } }
  ]
}
"#;

#[test]
fn netsim_writes_metrics_and_summary_json() {
    let dir = unique_temp_dir("netsim");
    let case = write_file(&dir, "case.json", CASE);
    let metrics = dir.join("metrics.json");
    let summary = dir.join("summary.json");

    let output = Command::new(env!("CARGO_BIN_EXE_netsim"))
        .args([
            "--case",
            case.to_str().unwrap(),
            "--metrics-json",
            metrics.to_str().unwrap(),
            "--summary-json",
            summary.to_str().unwrap(),
        ])
        .env("RUST_LOG", "warn")
        .output()
        .expect("run netsim");
    assert!(
        output.status.success(),
        "netsim failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let flow_lines: Vec<&str> = stdout.lines().filter(|l| l.starts_with("flow ")).collect();
    assert_eq!(flow_lines.len(), 1);
    assert!(flow_lines[0].starts_with("flow F1 tla=go_back_n packets=98 acked=98"));

    let events: Value = serde_json::from_str(&fs::read_to_string(&metrics).expect("metrics")).expect("json");
    let events = events.as_array().expect("array");
    assert_eq!(events[0]["kind"], "meta");
    assert_eq!(events[0]["t_ns"], 0);
    assert_eq!(events[0]["links"].as_array().expect("links").len(), 4);
    assert_eq!(events[0]["links"][0]["name"], "L1a");
    assert!(events.iter().any(|e| e["kind"] == "window_size"));
    assert!(events.iter().any(|e| e["kind"] == "packet_delay"));
    assert!(events.iter().any(|e| e["kind"] == "link_rate"));
    let mut last = 0;
    for e in events {
        let t = e["t_ns"].as_u64().expect("t_ns");
        assert!(t >= last, "metrics not in time order");
        last = t;
    }

    let summary: Value = serde_json::from_str(&fs::read_to_string(&summary).expect("summary")).expect("json");
    assert_eq!(summary["flows"][0]["name"], "F1");
    assert_eq!(summary["flows"][0]["done"], true);
    assert!(summary["flows"][0]["done_ms"].as_f64().expect("done_ms") > 100.0);
}

#[test]
fn netsim_until_ms_stops_before_flow_start() {
    let dir = unique_temp_dir("netsim-until");
    let case = write_file(&dir, "case.json", CASE);

    let output = Command::new(env!("CARGO_BIN_EXE_netsim"))
        .args(["--case", case.to_str().unwrap(), "--until-ms", "50"])
        .env("RUST_LOG", "warn")
        .output()
        .expect("run netsim");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("flow F1 tla=go_back_n packets=98 acked=0 done_ms=-"));
    assert!(stdout.contains("end_ms=50.000"));
}

#[test]
fn netsim_reports_config_errors() {
    let dir = unique_temp_dir("netsim-bad");
    let case = write_file(
        &dir,
        "case.json",
        r#"{ "hosts": ["H1"], "links": [ { "name": "L1", "a": "H1", "b": "R7", "rate_mbps": 1, "delay_ms": 1, "buffer_kb": 1 } ] }"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_netsim"))
        .args(["--case", case.to_str().unwrap()])
        .env("RUST_LOG", "off")
        .output()
        .expect("run netsim");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("R7"), "stderr: {stderr}");
}
