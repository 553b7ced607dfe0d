use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

fn cubesearch(config_dir: &std::path::Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cubesearch"))
        .env("CUBESEARCH_CONFIG_DIR", config_dir)
        .env_remove("SHADERTOY_API_KEY")
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .expect("failed to run cubesearch")
}

#[test]
fn config_where_reports_override_dir() {
    let root = TempDir::new().unwrap();
    let output = cubesearch(root.path(), &["config", "where"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&root.path().display().to_string()));
    assert!(stdout.contains("config.toml (missing)"));
}

#[test]
fn config_show_prints_defaults_without_file() {
    let root = TempDir::new().unwrap();
    let output = cubesearch(root.path(), &["config", "show"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[shadertoy]"));
    assert!(stdout.contains("mslfWr"));
    assert!(stdout.contains("{query}"));
    assert!(!stdout.contains("api_key"));
}

#[test]
fn config_show_reflects_file_and_masks_key() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("config.toml"),
        r#"
[shadertoy]
api_key = "super-secret"
shaders = ["XsXXDn"]

[search]
url = "https://duckduckgo.com/?q={query}"
"#,
    )
    .unwrap();

    let output = cubesearch(root.path(), &["--fullscreen", "config", "show"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("XsXXDn"));
    assert!(stdout.contains("duckduckgo.com"));
    assert!(stdout.contains("fullscreen = true"));
    assert!(stdout.contains("<redacted>"));
    assert!(!stdout.contains("super-secret"));

    let where_output = cubesearch(root.path(), &["config", "where"]);
    assert!(String::from_utf8_lossy(&where_output.stdout).contains("config.toml (present)"));
}

#[test]
fn invalid_config_fails() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("config.toml"),
        "[search]\nurl = \"https://example.com/search\"\n",
    )
    .unwrap();

    let output = cubesearch(root.path(), &["config", "show"]);
    assert!(!output.status.success());
}

#[test]
fn run_without_api_key_fails_before_opening_window() {
    let root = TempDir::new().unwrap();
    let output = cubesearch(root.path(), &["mslfWr"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("API key"));
}
