use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("perfquery"))
}

/// Runs the command, asserts success and parses stdout as JSON.
pub fn run_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().expect("run perfquery");
    assert!(
        output.status.success(),
        "perfquery failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[allow(dead_code)]
pub fn unique_config_path() -> PathBuf {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("perfquery-{}-{}.yaml", std::process::id(), ts))
}
