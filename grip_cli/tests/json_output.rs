use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[pins]
button = 17
led_primary = 27
led_secondary = 22
pwm_channel = 0
adc_channel = 0

[loop]
period_ms = 10
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn json_cmd(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("grip").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(cfg);
    cmd
}

/// The run summary is a single JSON object on stdout.
#[rstest]
fn run_summary_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);

    let out = json_cmd(&cfg)
        .args(["run", "--ticks", "5"])
        .env("GRIP_SIM_VOLTS", "1.0")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);
    let line = stdout
        .lines()
        .find(|l| l.contains("\"ticks\""))
        .unwrap_or_else(|| panic!("no summary line; stdout was: {stdout}"));
    let v: serde_json::Value = serde_json::from_str(line).expect("valid JSON");

    assert_eq!(v["ticks"], 5);
    assert_eq!(v["toggles"], 0);
    assert_eq!(v["final_mode"], "on");
    assert!(v["error_ticks"].is_u64());
    assert!(v["faults"].is_u64());
    let duty = v["last_duty"].as_f64().expect("duty recorded");
    assert!((0.05..=0.10).contains(&duty), "duty {duty} outside servo range");
}

#[rstest]
fn probe_lines_are_json() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);

    let out = json_cmd(&cfg)
        .args(["probe", "--samples", "3"])
        .env("GRIP_SIM_VOLTS", "0.5,1.0,2.0")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);
    let rows: Vec<serde_json::Value> = stdout
        .lines()
        .filter(|l| l.contains("\"sample\""))
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(rows.len(), 3);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row["sample"], i as u64);
        assert!(row["level"].is_u64());
        assert!(row["volts"].is_f64());
    }
}

/// Errors in JSON mode carry a machine-readable reason on stderr.
#[rstest]
fn config_error_is_structured() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);

    let out = json_cmd(&cfg)
        .args(["run", "--ticks", "1", "--period-ms", "5000"])
        .assert()
        .code(4)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&out);
    let line = stderr
        .lines()
        .find(|l| l.contains("\"reason\""))
        .unwrap_or_else(|| panic!("no error object; stderr was: {stderr}"));
    let v: serde_json::Value = serde_json::from_str(line).unwrap();

    assert_eq!(v["reason"], "Config");
    assert!(v["message"].as_str().unwrap().contains("--period-ms"));
}
