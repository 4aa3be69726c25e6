//! End-to-end tests for the `stacker` binary.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::process::{Command, Output};

fn stacker(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stacker"))
        .current_dir(dir)
        .env_remove("STACKER_CONFIG")
        .args(args)
        .output()
        .expect("run stacker")
}

const COMPOSE: &str = "\
version: '3.8'
services:
  web:
    image: ${IMAGE}
    ports:
      - \"${PORT:-8080}:80\"
    restart: always
";

#[test]
fn parse_prints_properties() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("docker-compose.yml"), COMPOSE).expect("write");

    let out = stacker(dir.path(), &["parse"]);
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(json["property_values"], serde_json::json!(["IMAGE", "PORT=8080"]));
}

#[test]
fn convert_prints_spec_and_warnings() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("stack.yml"), COMPOSE).expect("write");

    let out = stacker(
        dir.path(),
        &["convert", "-c", "stack.yml", "--name", "shop", "-p", "IMAGE=nginx"],
    );
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(json["metadata"]["name"], "shop");
    assert_eq!(json["services"][0]["image"], "nginx");
    assert_eq!(json["services"][0]["ports"][0]["published"], 8080);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Ignoring unsupported options: restart"));
}

#[test]
fn strict_convert_fails_without_value() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("docker-compose.yml"), COMPOSE).expect("write");

    let out = stacker(dir.path(), &["convert", "--strict"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("IMAGE"));
}

#[test]
fn missing_file_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = stacker(dir.path(), &["parse", "-c", "absent.yml"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("absent.yml"));
}
