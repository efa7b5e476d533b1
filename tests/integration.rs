use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn landscape_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("landscape");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[storage]
dir = "{}/data"

[intelligence]
provider = "disabled"

[server]
bind = "127.0.0.1:7341"

[logging]
level = "warn"
"#,
        root.display()
    );

    let config_path = config_dir.join("landscape.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn blob_path(tmp: &TempDir) -> PathBuf {
    tmp.path().join("data").join("arctern_landscape_data.json")
}

fn read_blob(tmp: &TempDir) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(blob_path(tmp)).unwrap()).unwrap()
}

fn run_landscape(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = landscape_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run landscape binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_first_run_seeds_defaults() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_landscape(&config_path, &["segments"]);
    assert!(success, "segments failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("13 segments, 13 with research"));
    assert!(stdout.contains("Emerging Physics"));
    assert!(stdout.contains("si-wafer"));

    let blob = read_blob(&tmp);
    assert_eq!(blob.as_object().unwrap().len(), 13);
}

#[test]
fn test_segments_category_filter() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) =
        run_landscape(&config_path, &["segments", "--category", "emerging-physics"]);
    assert!(success);
    assert!(stdout.contains("ep-photonic"));
    assert!(!stdout.contains("gp-monolithic"));
    assert!(stdout.contains("3 segments"));

    let (_, stderr, success) = run_landscape(&config_path, &["segments", "--category", "quantum"]);
    assert!(!success);
    assert!(stderr.contains("unknown category"));
}

#[test]
fn test_show_segment() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_landscape(&config_path, &["show", "si-wafer"]);
    assert!(success);
    assert!(stdout.contains("Wafer Scale"));
    assert!(stdout.contains("--- Companies"));

    let (_, stderr, success) = run_landscape(&config_path, &["show", "no-such-segment"]);
    assert!(!success);
    assert!(stderr.contains("segment not found"));
}

#[test]
fn test_set_then_clear() {
    let (tmp, config_path) = setup_test_env();

    let analysis = tmp.path().join("analysis.json");
    fs::write(
        &analysis,
        r#"{"companies":[{"name":"NVIDIA","specialization":"Hopper","description":"..."}],"summary":"dominant","trends":["2nm"]}"#,
    )
    .unwrap();

    let (stdout, stderr, success) = run_landscape(
        &config_path,
        &["set", "gp-monolithic", "--file", analysis.to_str().unwrap()],
    );
    assert!(success, "set failed: stdout={}, stderr={}", stdout, stderr);

    let blob = read_blob(&tmp);
    assert_eq!(blob["gp-monolithic"]["summary"], "dominant");
    assert_eq!(blob["gp-monolithic"]["companies"][0]["name"], "NVIDIA");

    let (stdout, _, success) = run_landscape(&config_path, &["clear", "gp-monolithic"]);
    assert!(success);
    assert!(stdout.contains("Cleared"));

    let blob = read_blob(&tmp);
    assert!(blob.get("gp-monolithic").is_none());
    assert_eq!(blob.as_object().unwrap().len(), 12);

    let (stdout, _, _) = run_landscape(&config_path, &["show", "gp-monolithic"]);
    assert!(stdout.contains("No research yet"));

    let (stdout, _, success) = run_landscape(&config_path, &["clear", "gp-monolithic"]);
    assert!(success);
    assert!(stdout.contains("No research stored"));
}

#[test]
fn test_set_rejects_incomplete_analysis() {
    let (tmp, config_path) = setup_test_env();
    run_landscape(&config_path, &["segments"]);
    let before = fs::read_to_string(blob_path(&tmp)).unwrap();

    let analysis = tmp.path().join("partial.json");
    fs::write(&analysis, r#"{"summary":"only a summary"}"#).unwrap();

    let (_, _, success) = run_landscape(
        &config_path,
        &["set", "si-wafer", "--file", analysis.to_str().unwrap()],
    );
    assert!(!success);
    assert_eq!(fs::read_to_string(blob_path(&tmp)).unwrap(), before);
}

#[test]
fn test_corrupt_blob_is_replaced_by_defaults() {
    let (tmp, config_path) = setup_test_env();

    fs::create_dir_all(tmp.path().join("data")).unwrap();
    fs::write(blob_path(&tmp), "{not json").unwrap();

    let (stdout, stderr, success) = run_landscape(&config_path, &["segments"]);
    assert!(success, "segments failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("13 with research"));

    let blob = read_blob(&tmp);
    assert_eq!(blob.as_object().unwrap().len(), 13);

    let backup = tmp
        .path()
        .join("data")
        .join("arctern_landscape_data.corrupt.json");
    assert_eq!(fs::read_to_string(backup).unwrap(), "{not json");
}

#[test]
fn test_reset_restores_defaults() {
    let (tmp, config_path) = setup_test_env();

    run_landscape(&config_path, &["clear", "ep-analog"]);
    assert!(read_blob(&tmp).get("ep-analog").is_none());

    let (stdout, _, success) = run_landscape(&config_path, &["reset"]);
    assert!(success);
    assert!(stdout.contains("13 segments"));
    assert!(read_blob(&tmp).get("ep-analog").is_some());
}

#[test]
fn test_export_import_round_trip() {
    let (tmp, config_path) = setup_test_env();
    let export = tmp.path().join("export.json");

    let (stdout, _, success) = run_landscape(
        &config_path,
        &["export", "--output", export.to_str().unwrap()],
    );
    assert!(success);
    assert!(stdout.contains("Exported 13 segments"));

    let envelope: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&export).unwrap()).unwrap();
    assert!(envelope["exportedAt"].is_string());
    assert_eq!(envelope["research"].as_object().unwrap().len(), 13);

    run_landscape(&config_path, &["clear", "si-wafer"]);
    let (stdout, stderr, success) = run_landscape(
        &config_path,
        &["import", export.to_str().unwrap(), "--replace"],
    );
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("applied:         13"));
    assert_eq!(read_blob(&tmp), envelope["research"]);
}

#[test]
fn test_plain_import_restores_export() {
    let (tmp, config_path) = setup_test_env();
    run_landscape(&config_path, &["segments"]);

    let empty = tmp.path().join("empty.json");
    fs::write(&empty, r#"{"companies":[],"summary":"","trends":[]}"#).unwrap();
    let (_, _, success) = run_landscape(
        &config_path,
        &["set", "ep-analog", "--file", empty.to_str().unwrap()],
    );
    assert!(success);
    let source = read_blob(&tmp);

    let export = tmp.path().join("export.json");
    run_landscape(&config_path, &["export", "--output", export.to_str().unwrap()]);
    run_landscape(&config_path, &["clear", "ep-analog"]);
    run_landscape(&config_path, &["clear", "si-wafer"]);

    let (stdout, stderr, success) =
        run_landscape(&config_path, &["import", export.to_str().unwrap()]);
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("applied:         13"));
    assert_eq!(read_blob(&tmp), source);
    assert_eq!(
        read_blob(&tmp)["ep-analog"],
        serde_json::json!({"companies": [], "summary": "", "trends": []})
    );
}

#[test]
fn test_import_by_name_does_not_duplicate() {
    let (tmp, config_path) = setup_test_env();
    run_landscape(&config_path, &["segments"]);
    let before = read_blob(&tmp)["si-wafer"]["companies"]
        .as_array()
        .unwrap()
        .len();

    let export = tmp.path().join("export.json");
    run_landscape(&config_path, &["export", "--output", export.to_str().unwrap()]);

    let (_, _, success) = run_landscape(
        &config_path,
        &["import", export.to_str().unwrap(), "--dedup", "by-name"],
    );
    assert!(success);
    let after = read_blob(&tmp)["si-wafer"]["companies"]
        .as_array()
        .unwrap()
        .len();
    assert_eq!(before, after);
}

#[test]
fn test_overview() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_landscape(&config_path, &["overview"]);
    assert!(success);
    assert!(stdout.contains("13/13 segments researched"));
    assert!(stdout.contains("Segment 01"));
    assert!(stdout.contains("Segment 05"));
    assert!(stdout.contains("[priority]"));
}

#[test]
fn test_analyze_without_provider_writes_nothing() {
    let (tmp, config_path) = setup_test_env();
    run_landscape(&config_path, &["segments"]);
    let before = fs::read_to_string(blob_path(&tmp)).unwrap();

    let notes = tmp.path().join("notes.md");
    fs::write(&notes, "Cerebras shipped WSE-3.").unwrap();

    let (_, stderr, success) = run_landscape(
        &config_path,
        &["analyze", "si-wafer", "--notes", notes.to_str().unwrap()],
    );
    assert!(!success);
    assert!(stderr.contains("not configured"), "stderr: {}", stderr);
    assert_eq!(fs::read_to_string(blob_path(&tmp)).unwrap(), before);

    let (_, stderr, success) = run_landscape(&config_path, &["search", "who leads photonics?"]);
    assert!(!success);
    assert!(stderr.contains("not configured"));
}

#[test]
fn test_invalid_config_rejected() {
    let (tmp, _) = setup_test_env();
    let bad = tmp.path().join("bad.toml");
    fs::write(&bad, "[intelligence]\nprovider = \"oracle\"\n").unwrap();

    let (_, stderr, success) = run_landscape(&bad, &["segments"]);
    assert!(!success);
    assert!(stderr.contains("Unknown intelligence provider"));
}

#[test]
fn test_missing_config_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("absent.toml");

    let output = Command::new(landscape_binary())
        .current_dir(tmp.path())
        .arg("--config")
        .arg(&missing)
        .arg("segments")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(tmp.path().join("data").join("arctern_landscape_data.json").exists());
}
