use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const SETTINGS: &str = r#"
[global_style]
master_prompt = "flat vector mascot"

[style_engine]
master_style_prompt = "bold outlines"

[categories.eyes]
trait_count = 12
generation_mode = "ai"

[categories.hat]
trait_count = 4
"#;

/// Workspace with a config pointing every path into the temp dir
fn workspace(dir: &TempDir) -> PathBuf {
    workspace_with_backend(dir, "auto")
}

fn workspace_with_backend(dir: &TempDir, backend: &str) -> PathBuf {
    let root = dir.path();
    fs::write(root.join("generation.toml"), SETTINGS).expect("write settings");

    let config = format!(
        r#"
[general]
settings_path = '{root}/generation.toml'
store_backend = "{backend}"
state_db_path = '{root}/state/fingerprints.sqlite'
fallback_state_path = '{root}/state/fingerprints.json'
cache_dir = '{root}/assets'

[tracking]
categories = ["eyes", "hat"]

[providers]
active = "openai"
"#,
        root = root.display(),
        backend = backend
    );
    let config_path = root.join("asset-regen.toml");
    fs::write(&config_path, config).expect("write config");
    config_path
}

fn run_json(config: &PathBuf, args: &[&str]) -> Value {
    let output = cargo_bin_cmd!("asset-regen")
        .arg("--config")
        .arg(config)
        .args(args)
        .arg("--json")
        .output()
        .expect("run command");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("asset-regen.toml");

    let mut cmd = cargo_bin_cmd!("asset-regen");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.contains("store_backend"));
    assert!(content.contains("[[providers.costs]]"));

    let mut again = cargo_bin_cmd!("asset-regen");
    again
        .args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn second_regenerate_is_a_no_op() {
    let dir = TempDir::new().expect("temp dir");
    let config = workspace(&dir);

    let first = run_json(&config, &["regenerate"]);
    assert_eq!(first["regenerated"].as_array().unwrap().len(), 2);
    assert_eq!(first["message"], "Regenerated 2 categories");

    cargo_bin_cmd!("asset-regen")
        .arg("--config")
        .arg(&config)
        .arg("regenerate")
        .assert()
        .success()
        .stdout(predicate::str::contains("No configuration changes detected"));
}

#[test]
fn detect_reports_edited_category() {
    let dir = TempDir::new().expect("temp dir");
    let config = workspace(&dir);
    run_json(&config, &["regenerate"]);

    let edited = SETTINGS.replace("trait_count = 12", "trait_count = 13");
    fs::write(dir.path().join("generation.toml"), edited).expect("edit settings");

    let report = run_json(&config, &["detect"]);
    assert_eq!(report["changedCount"], 1);

    let eyes = report["categories"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["category"] == "eyes")
        .expect("eyes entry");
    assert_eq!(eyes["hasChanged"], true);
    assert_eq!(eyes["isNew"], false);
}

#[test]
fn force_category_marks_it_new() {
    let dir = TempDir::new().expect("temp dir");
    let config = workspace(&dir);
    run_json(&config, &["regenerate"]);

    cargo_bin_cmd!("asset-regen")
        .arg("--config")
        .arg(&config)
        .args(["force", "--category", "hat"])
        .assert()
        .success();

    let report = run_json(&config, &["detect"]);
    assert_eq!(report["changedCount"], 1);
    let hat = report["categories"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["category"] == "hat")
        .expect("hat entry");
    assert_eq!(hat["isNew"], true);
}

#[test]
fn force_unknown_category_fails() {
    let dir = TempDir::new().expect("temp dir");
    let config = workspace(&dir);

    cargo_bin_cmd!("asset-regen")
        .arg("--config")
        .arg(&config)
        .args(["force", "--category", "wings"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("wings"));
}

#[test]
fn force_requires_a_target() {
    cargo_bin_cmd!("asset-regen")
        .arg("force")
        .assert()
        .failure();
}

#[test]
fn estimate_prices_changed_categories() {
    let dir = TempDir::new().expect("temp dir");
    let config = workspace(&dir);

    let cached = dir.path().join("assets").join("eyes");
    fs::create_dir_all(&cached).expect("cache dir");
    for i in 0..5 {
        fs::write(cached.join(format!("{i}.png")), b"png").expect("cached asset");
    }

    let estimate = run_json(&config, &["estimate"]);
    assert_eq!(estimate["cost"]["provider"], "openai");

    // 12 ai traits at 0.080, hat is procedural
    let total = estimate["cost"]["total"].as_f64().unwrap();
    assert!((total - 0.96).abs() < 1e-9);
    assert_eq!(estimate["time"]["formatted"], "36s");
    assert_eq!(estimate["cacheSavings"]["reusableAssets"], 5);
}

#[test]
fn reset_clears_stored_fingerprints() {
    let dir = TempDir::new().expect("temp dir");
    let config = workspace(&dir);
    run_json(&config, &["regenerate"]);

    let status = run_json(&config, &["status"]);
    assert_eq!(status["storedHashes"].as_object().unwrap().len(), 2);

    cargo_bin_cmd!("asset-regen")
        .arg("--config")
        .arg(&config)
        .arg("reset")
        .assert()
        .success();

    let status = run_json(&config, &["status"]);
    assert!(status["storedHashes"].as_object().unwrap().is_empty());
}

#[test]
fn reset_and_force_recover_corrupt_store() {
    let dir = TempDir::new().expect("temp dir");
    let config = workspace_with_backend(&dir, "file");
    let state = dir.path().join("state");
    fs::create_dir_all(&state).expect("state dir");
    let blob = state.join("fingerprints.json");

    fs::write(&blob, "{not json").expect("corrupt blob");
    cargo_bin_cmd!("asset-regen")
        .arg("--config")
        .arg(&config)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load stored fingerprints"));

    cargo_bin_cmd!("asset-regen")
        .arg("--config")
        .arg(&config)
        .arg("reset")
        .assert()
        .success();
    let status = run_json(&config, &["status"]);
    assert!(status["storedHashes"].as_object().unwrap().is_empty());

    fs::write(&blob, "{not json").expect("corrupt blob again");
    cargo_bin_cmd!("asset-regen")
        .arg("--config")
        .arg(&config)
        .args(["force", "--all"])
        .assert()
        .success();
    let report = run_json(&config, &["detect"]);
    assert_eq!(report["changedCount"], 2);
}

#[test]
fn config_log_level_applies_without_flag() {
    let dir = TempDir::new().expect("temp dir");
    let config = workspace(&dir);
    let content = fs::read_to_string(&config).expect("read config");
    let content = content.replace("[general]\n", "[general]\nlog_level = \"debug\"\n");
    fs::write(&config, content).expect("write config");

    cargo_bin_cmd!("asset-regen")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config)
        .arg("status")
        .assert()
        .success()
        .stderr(predicate::str::contains("Change tracker ready"));

    cargo_bin_cmd!("asset-regen")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config)
        .args(["--log-level", "warn", "status"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Change tracker ready").not());
}
