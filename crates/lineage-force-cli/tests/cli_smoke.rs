use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn fixture() -> PathBuf {
    let path = repo_root()
        .join("fixtures")
        .join("lineage")
        .join("customer.json");
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn cli_lays_out_customer_lineage() {
    let exe = assert_cmd::cargo_bin!("lineage-force-cli");
    let output = Command::new(exe)
        .current_dir(repo_root())
        .args(["layout", fixture().to_string_lossy().as_ref()])
        .output()
        .expect("run cli");
    assert!(output.status.success(), "{output:?}");

    let doc = stdout_json(&output);
    assert_eq!(doc["state"], "stopped");
    assert!(doc["ticks"].as_u64().unwrap() <= 302);

    let nodes = doc["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 5);
    assert_eq!(nodes[0]["label"], "Customer_Raw");
    assert_eq!(nodes[0]["steward"], "John Doe");
    assert!(nodes[1].get("steward").is_none());
    assert_eq!(nodes[1]["category"], "system");
    for n in nodes {
        assert!(n["x"].as_f64().unwrap().is_finite());
        assert!(n["y"].as_f64().unwrap().is_finite());
    }
}

#[test]
fn cli_pins_hold_their_coordinates() {
    let exe = assert_cmd::cargo_bin!("lineage-force-cli");
    let output = Command::new(exe)
        .current_dir(repo_root())
        .args([
            "--pin",
            "1=50,60",
            "--max-ticks",
            "40",
            fixture().to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success(), "{output:?}");

    let doc = stdout_json(&output);
    assert_eq!(doc["ticks"], 40);
    assert_eq!(doc["state"], "running");
    let first = &doc["nodes"][0];
    assert_eq!(first["x"].as_f64(), Some(50.0));
    assert_eq!(first["y"].as_f64(), Some(60.0));
    assert_eq!(first["fx"].as_f64(), Some(50.0));
}

#[test]
fn cli_reads_stdin_and_validates() {
    let input = fs::read_to_string(fixture()).expect("read fixture");
    let exe = assert_cmd::cargo_bin!("lineage-force-cli");
    let assert = assert_cmd::Command::new(exe)
        .args(["validate", "-"])
        .write_stdin(input)
        .assert()
        .success();
    assert_eq!(
        String::from_utf8_lossy(&assert.get_output().stdout).trim(),
        "ok"
    );
}

#[test]
fn cli_rejects_dangling_edges() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("dangling.json");
    fs::write(
        &path,
        r#"{
            "nodes": [{ "id": "1", "name": "Customer_Raw", "type": "table" }],
            "edges": [{ "source": "1", "target": "99", "type": "flows-to" }]
        }"#,
    )
    .expect("write input");

    let exe = assert_cmd::cargo_bin!("lineage-force-cli");
    let output = Command::new(exe)
        .args(["validate", path.to_string_lossy().as_ref()])
        .output()
        .expect("run cli");
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("99"));
}

#[test]
fn cli_streams_frames_until_convergence() {
    let exe = assert_cmd::cargo_bin!("lineage-force-cli");
    let output = Command::new(exe)
        .current_dir(repo_root())
        .args(["frames", "--every", "50", fixture().to_string_lossy().as_ref()])
        .output()
        .expect("run cli");
    assert!(output.status.success(), "{output:?}");

    let lines: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|l| serde_json::from_str(l).expect("frame is JSON"))
        .collect();
    assert!(lines.len() >= 2);

    let (last, ticks) = lines.split_last().unwrap();
    assert_eq!(last["event"], "stopped");
    assert_eq!(last["reason"], "converged");
    for frame in ticks {
        assert_eq!(frame["event"], "tick");
        assert_eq!(frame["step"].as_u64().unwrap() % 50, 0);
        assert_eq!(frame["nodes"].as_array().unwrap().len(), 5);
    }
}

#[test]
fn cli_usage_errors_exit_with_code_2() {
    let exe = assert_cmd::cargo_bin!("lineage-force-cli");
    let output = Command::new(exe)
        .args(["frames", "--every", "zero"])
        .output()
        .expect("run cli");
    assert_eq!(output.status.code(), Some(2));
}
