use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const WORKSPACE: &str = "5f0c1c7e-8a4b-4c3e-9a61-2b7d0e4f9a10";
const POINTS: &str = "EAST,NORTH,RL,AU\n100,200,50,0.12\n101,201,bad,0.4\n102,202,52,\n";

fn geobuild() -> Command {
    let mut cmd = Command::cargo_bin("geobuild").unwrap();
    cmd.env_remove("GEOBUILD_DATA_DIR")
        .env_remove("GEOBUILD_STORE_DIR");
    cmd
}

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("points.csv"), POINTS).unwrap();
    dir
}

fn build_args<'a>(data_dir: &'a str, store_dir: &'a str) -> Vec<&'a str> {
    vec![
        "build",
        "--type",
        "pointset",
        "--workspace",
        WORKSPACE,
        "--path",
        "/samples/au.json",
        "--name",
        "au samples",
        "--sources",
        r#"{"points": "points.csv"}"#,
        "--columns",
        r#"{"x": "EAST", "y": "NORTH", "z": "RL"}"#,
        "--data-dir",
        data_dir,
        "--store-dir",
        store_dir,
    ]
}

#[test]
fn test_schemas_lists_object_types() {
    geobuild()
        .arg("schemas")
        .assert()
        .success()
        .stdout(predicate::str::contains("pointset"))
        .stdout(predicate::str::contains("downhole-collection"))
        .stdout(predicate::str::contains("Planned"));
}

#[test]
fn test_dry_run_prints_payload_and_stores_nothing() {
    let data = fixture();
    let store = TempDir::new().unwrap();
    let data_dir = data.path().to_str().unwrap();
    let store_dir = store.path().to_str().unwrap();

    let mut args = build_args(data_dir, store_dir);
    args.extend(["--dry-run", "--json"]);
    let output = geobuild().args(&args).output().unwrap();
    assert!(output.status.success());

    let response: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response["status"], "validated");
    assert_eq!(response["payload"]["points"].as_array().unwrap().len(), 2);
    assert_eq!(response["payload"]["attributes"]["AU"][1], Value::Null);
    assert_eq!(response["messages"].as_array().unwrap().len(), 1);
    assert_eq!(response["messages"][0]["locator"]["row"], 1);

    assert!(!store.path().join(WORKSPACE).exists());
}

#[test]
fn test_build_then_show() {
    let data = fixture();
    let store = TempDir::new().unwrap();
    let data_dir = data.path().to_str().unwrap();
    let store_dir = store.path().to_str().unwrap();

    geobuild()
        .args(build_args(data_dir, store_dir))
        .assert()
        .success()
        .stdout(predicate::str::contains("Created /samples/au.json"))
        .stdout(predicate::str::contains("row 1 dropped"));

    let output = geobuild()
        .args([
            "show",
            "--workspace",
            WORKSPACE,
            "--path",
            "/samples/au.json",
            "--store-dir",
            store_dir,
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let object: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(object["metadata"]["version_id"], "1");
    assert_eq!(object["content"]["name"], "au samples");
    assert_eq!(object["content"]["crs"], "unspecified");
}

#[test]
fn test_missing_column_fails() {
    let data = fixture();
    let store = TempDir::new().unwrap();

    geobuild()
        .args([
            "build",
            "--type",
            "pointset",
            "--workspace",
            WORKSPACE,
            "--path",
            "/p.json",
            "--name",
            "p",
            "--sources",
            r#"{"points": "points.csv"}"#,
            "--columns",
            r#"{"x": "EAST", "y": "NORTH", "z": "ELEV"}"#,
            "--data-dir",
            data.path().to_str().unwrap(),
            "--store-dir",
            store.path().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Required columns are missing"))
        .stderr(predicate::str::contains("ELEV"));
}

#[test]
fn test_workspace_must_be_a_uuid() {
    let data = fixture();
    let store = TempDir::new().unwrap();
    let data_dir = data.path().to_str().unwrap();
    let store_dir = store.path().join("root");
    let store_dir = store_dir.to_str().unwrap();

    for workspace in ["../../outside", "/etc/evil"] {
        let mut args = build_args(data_dir, store_dir);
        args[4] = workspace;
        geobuild()
            .args(&args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("--workspace"));
    }
    assert_eq!(fs::read_dir(store.path()).unwrap().count(), 0);

    geobuild()
        .args(["show", "--workspace", "../x", "--id", "nope", "--store-dir", store_dir])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--workspace"));
}

#[test]
fn test_unknown_type_fails() {
    geobuild()
        .args([
            "build", "--type", "mesh", "--workspace", "ws", "--path", "/m.json", "--name", "m",
            "--sources", "{}", "--columns", "{}",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn test_missing_source_file_fails() {
    let data = TempDir::new().unwrap();
    let store = TempDir::new().unwrap();

    geobuild()
        .args(build_args(
            data.path().to_str().unwrap(),
            store.path().to_str().unwrap(),
        ))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not load source table"))
        .stderr(predicate::str::contains("--data-dir"));
}

#[test]
fn test_preview_shows_columns() {
    let data = fixture();

    geobuild()
        .args(["preview", "points.csv", "--max-rows", "2", "--data-dir"])
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Rows: 3"))
        .stdout(predicate::str::contains("NORTH"))
        .stdout(predicate::str::contains("numeric"));
}

#[test]
fn test_show_unknown_object_fails() {
    let store = TempDir::new().unwrap();

    geobuild()
        .args(["show", "--workspace", WORKSPACE, "--id", "nope", "--store-dir"])
        .arg(store.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Object not found"));
}
