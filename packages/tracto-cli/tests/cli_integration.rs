use assert_cmd::Command;
use predicates::prelude::*;

fn tracto() -> Command {
    Command::cargo_bin("tracto").unwrap()
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_no_args_shows_help() {
    tracto()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    tracto()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tracto"));
}

#[test]
fn test_help_flag() {
    tracto()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("reconstruction"));
}

// =============================================================================
// INFO SUBCOMMAND
// =============================================================================

#[test]
fn test_info_subcommand() {
    tracto()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("tracto CLI v"))
        .stdout(predicate::str::contains("Platform:"))
        .stdout(predicate::str::contains("Diffusion Toolkit"))
        .stdout(predicate::str::contains("MITK Diffusion"));
}

#[test]
fn test_info_json() {
    let output = tracto().arg("info").arg("--json").assert().success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed.is_object());
    assert!(parsed.get("cli_version").is_some());
    assert!(parsed.get("platform").is_some());
    assert!(parsed.get("arch").is_some());

    let toolchains = parsed.get("toolchains").unwrap().as_array().unwrap();
    assert_eq!(toolchains.len(), 5);
    let names: Vec<&str> = toolchains
        .iter()
        .map(|t| t.get("toolchain").unwrap().as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["dtk", "mrtrix", "camino", "dtb", "mitk"]);
}

// =============================================================================
// VALIDATE SUBCOMMAND
// =============================================================================

#[test]
fn test_validate_valid_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("recon.json");
    std::fs::write(&config, r#"{"backend": "gibbs"}"#).unwrap();

    tracto()
        .arg("validate")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"))
        .stdout(predicate::str::contains("gibbs"));
}

#[test]
fn test_validate_semantic_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("recon.json");
    std::fs::write(
        &config,
        r#"{"backend": "camino", "number_of_tensors": "2", "local_model": "dt"}"#,
    )
    .unwrap();

    tracto()
        .arg("validate")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not valid"));
}

#[test]
fn test_validate_unparseable_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("recon.json");
    std::fs::write(&config, "{ not json").unwrap();

    tracto()
        .arg("validate")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_validate_missing_file() {
    tracto()
        .arg("validate")
        .arg("--config")
        .arg("/no/such/config.json")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_validate_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("recon.json");
    std::fs::write(&config, r#"{"backend": "mrtrix", "local_model": true}"#).unwrap();

    let output = tracto()
        .arg("validate")
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed.get("parsed").unwrap().as_bool(), Some(true));
    assert_eq!(parsed.get("valid").unwrap().as_bool(), Some(true));
    assert_eq!(parsed.get("backend").unwrap().as_str(), Some("mrtrix"));
    // tensor chain + CSD chain + boundary nodes
    assert_eq!(parsed.get("nodes").unwrap().as_u64(), Some(10));
}

// =============================================================================
// GRAPH SUBCOMMAND
// =============================================================================

#[test]
fn test_graph_tensor_only_topology() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("recon.json");
    std::fs::write(&config, r#"{"backend": "mrtrix"}"#).unwrap();

    tracto()
        .arg("graph")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("digraph reconstruction"))
        .stdout(predicate::str::contains("mrtrix_make_tensor"))
        .stdout(predicate::str::contains(
            "\"inputnode\" -> \"outputnode\" [label=\"diffusion_resampled -> DWI\"]",
        ))
        .stdout(predicate::str::contains("mrtrix_CSD").not());
}

#[test]
fn test_graph_csd_topology() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("recon.json");
    std::fs::write(&config, r#"{"backend": "mrtrix", "local_model": true}"#).unwrap();

    tracto()
        .arg("graph")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("mrtrix_CSD"))
        .stdout(predicate::str::contains("mrtrix_rf"))
        .stdout(predicate::str::contains(
            "\"mrtrix_rf\" -> \"mrtrix_CSD\" [label=\"response -> response_file\"]",
        ));
}

#[test]
fn test_graph_dsi_requires_matrix_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("recon.json");
    std::fs::write(&config, r#"{"backend": "dtk", "imaging_model": "DSI"}"#).unwrap();

    tracto()
        .arg("graph")
        .arg("--config")
        .arg(&config)
        .env_remove("DSI_PATH")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("DSI_PATH"));

    tracto()
        .arg("graph")
        .arg("--config")
        .arg(&config)
        .env("DSI_PATH", dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("dtk_odfrecon"));
}

#[test]
fn test_graph_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("recon.json");
    let dot = dir.path().join("flow.dot");
    std::fs::write(&config, r#"{"backend": "camino"}"#).unwrap();

    tracto()
        .arg("graph")
        .arg("--config")
        .arg(&config)
        .arg("--output")
        .arg(&dot)
        .assert()
        .success();

    let contents = std::fs::read_to_string(&dot).unwrap();
    assert!(contents.contains("camino_ModelFit"));
    assert!(contents.contains("camino_eigenvectors"));
}
