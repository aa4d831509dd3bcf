//! End-to-end checks of `vuln-bridge test` against a fake scanner script.

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::tempdir;

fn bin() -> Command {
    Command::cargo_bin("vuln-bridge-cli").expect("binary builds")
}

#[cfg(unix)]
fn install_fake_scanner(dir: &std::path::Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("vulnscan");
    std::fs::write(&path, body).expect("write fake scanner");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("mark fake scanner executable");
}

// Every test pins PATH to the fake-tools dir, so the scripts must stick to
// shell builtins.
#[cfg(unix)]
const CLEAN_SCANNER: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "1.4.2"
  exit 0
fi
printf '{"ok": true, "vulnerabilities": [], "summary": "scanned %s"}\n' "$PWD"
"#;

#[cfg(unix)]
const FINDINGS_SCANNER: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "1.4.2"
  exit 0
fi
printf '%s\n' '{
  "ok": true,
  "vulnerabilities": [
    {
      "id": "VULN-JS-LODASH-2021-0023",
      "title": "Command Injection",
      "severity": "high",
      "packageName": "lodash",
      "version": "4.17.15",
      "description": "Template compilation lets crafted input run shell commands."
    }
  ],
  "summary": "1 issue in 42 dependencies"
}'
"#;

#[cfg(unix)]
const AUTH_FAILURE_SCANNER: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "1.4.2"
  exit 0
fi
echo '{"ok": false, "error": "Authentication error, run `vulnscan auth`"}'
"#;

#[cfg(unix)]
const BROKEN_SCANNER: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "1.4.2"
  exit 0
fi
echo "FATAL: no supported manifest found" >&2
exit 3
"#;

#[cfg(unix)]
const NOISY_SCANNER: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "1.4.2"
  exit 0
fi
echo "<html>proxy login required</html>"
"#;

#[cfg(unix)]
#[test]
fn clean_scan_exits_zero() {
    let tools = tempdir().expect("tempdir");
    let empty = tempdir().expect("tempdir");
    let project = tempdir().expect("tempdir");
    install_fake_scanner(tools.path(), CLEAN_SCANNER);

    bin()
        .env("PATH", tools.path())
        .env("VULN_BRIDGE_INSTALL_DIR", empty.path())
        .env_remove("VULN_BRIDGE_COMMAND")
        .args(["test", "--path"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(contains("No known vulnerabilities found."))
        .stdout(contains("Completed in"));
}

#[cfg(unix)]
#[test]
fn scan_runs_the_scanner_in_the_project_root() {
    let tools = tempdir().expect("tempdir");
    let empty = tempdir().expect("tempdir");
    let project = tempdir().expect("tempdir");
    install_fake_scanner(tools.path(), CLEAN_SCANNER);
    let canonical = project.path().canonicalize().expect("canonicalize");

    bin()
        .env("PATH", tools.path())
        .env("VULN_BRIDGE_INSTALL_DIR", empty.path())
        .env_remove("VULN_BRIDGE_COMMAND")
        .args(["test", "--path"])
        .arg(project.path())
        .assert()
        .success()
        .stdout(contains(format!("scanned {}", canonical.display())));
}

#[cfg(unix)]
#[test]
fn scan_defaults_to_the_current_directory() {
    let tools = tempdir().expect("tempdir");
    let empty = tempdir().expect("tempdir");
    let project = tempdir().expect("tempdir");
    install_fake_scanner(tools.path(), CLEAN_SCANNER);
    let canonical = project.path().canonicalize().expect("canonicalize");

    bin()
        .current_dir(project.path())
        .env("PATH", tools.path())
        .env("VULN_BRIDGE_INSTALL_DIR", empty.path())
        .env_remove("VULN_BRIDGE_COMMAND")
        .arg("test")
        .assert()
        .success()
        .stdout(contains(format!("scanned {}", canonical.display())));
}

#[cfg(unix)]
#[test]
fn findings_exit_one_and_are_reported() {
    let tools = tempdir().expect("tempdir");
    let empty = tempdir().expect("tempdir");
    let project = tempdir().expect("tempdir");
    install_fake_scanner(tools.path(), FINDINGS_SCANNER);

    bin()
        .env("PATH", tools.path())
        .env("VULN_BRIDGE_INSTALL_DIR", empty.path())
        .env_remove("VULN_BRIDGE_COMMAND")
        .args(["test", "--path"])
        .arg(project.path())
        .assert()
        .failure()
        .code(1)
        .stdout(contains("VULN-JS-LODASH-2021-0023"))
        .stdout(contains("package: lodash@4.17.15"))
        .stdout(contains("1 issue in 42 dependencies"));
}

#[cfg(unix)]
#[test]
fn json_output_is_pure_and_parseable() {
    let tools = tempdir().expect("tempdir");
    let empty = tempdir().expect("tempdir");
    let project = tempdir().expect("tempdir");
    install_fake_scanner(tools.path(), FINDINGS_SCANNER);

    let assert = bin()
        .env("PATH", tools.path())
        .env("VULN_BRIDGE_INSTALL_DIR", empty.path())
        .env_remove("VULN_BRIDGE_COMMAND")
        .args(["test", "--json", "--path"])
        .arg(project.path())
        .assert()
        .failure()
        .code(1);

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf-8 stdout");
    let payload: serde_json::Value = serde_json::from_str(&stdout).expect("json stdout");
    assert_eq!(payload["ok"], serde_json::json!(true));
    assert_eq!(payload["vulnerabilities"].as_array().map(Vec::len), Some(1));
    assert!(!stdout.contains("Completed in"));
}

#[cfg(unix)]
#[test]
fn scanner_reported_failure_exits_two() {
    let tools = tempdir().expect("tempdir");
    let empty = tempdir().expect("tempdir");
    let project = tempdir().expect("tempdir");
    install_fake_scanner(tools.path(), AUTH_FAILURE_SCANNER);

    bin()
        .env("PATH", tools.path())
        .env("VULN_BRIDGE_INSTALL_DIR", empty.path())
        .env_remove("VULN_BRIDGE_COMMAND")
        .args(["test", "--path"])
        .arg(project.path())
        .assert()
        .failure()
        .code(2)
        .stdout(contains("Scan failed: Authentication error"));
}

#[cfg(unix)]
#[test]
fn scanner_crash_exits_two_with_stderr_excerpt() {
    let tools = tempdir().expect("tempdir");
    let empty = tempdir().expect("tempdir");
    let project = tempdir().expect("tempdir");
    install_fake_scanner(tools.path(), BROKEN_SCANNER);

    bin()
        .env("PATH", tools.path())
        .env("VULN_BRIDGE_INSTALL_DIR", empty.path())
        .env_remove("VULN_BRIDGE_COMMAND")
        .args(["test", "--path"])
        .arg(project.path())
        .assert()
        .failure()
        .code(2)
        .stderr(contains("scan of"))
        .stderr(contains("exited with code 3"))
        .stderr(contains("no supported manifest found"));
}

#[cfg(unix)]
#[test]
fn non_json_scanner_output_exits_two() {
    let tools = tempdir().expect("tempdir");
    let empty = tempdir().expect("tempdir");
    let project = tempdir().expect("tempdir");
    install_fake_scanner(tools.path(), NOISY_SCANNER);

    bin()
        .env("PATH", tools.path())
        .env("VULN_BRIDGE_INSTALL_DIR", empty.path())
        .env_remove("VULN_BRIDGE_COMMAND")
        .args(["test", "--path"])
        .arg(project.path())
        .assert()
        .failure()
        .code(2)
        .stderr(contains("not valid JSON"));
}

#[test]
fn missing_scanner_exits_two() {
    let empty = tempdir().expect("tempdir");
    let project = tempdir().expect("tempdir");

    bin()
        .env("PATH", empty.path())
        .env("VULN_BRIDGE_INSTALL_DIR", empty.path())
        .env_remove("VULN_BRIDGE_COMMAND")
        .args(["test", "--path"])
        .arg(project.path())
        .assert()
        .failure()
        .code(2)
        .stderr(contains("failed to run"));
}
