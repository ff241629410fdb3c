//! End-to-end tests for the tovac CLI.
//!
//! Each test writes a `.tova` source file into a temp project, invokes
//! the built `tovac` binary, and asserts on exit codes and emitted files.

use std::path::PathBuf;
use std::process::Command;

/// Find the tovac binary in the target directory.
fn find_tovac() -> PathBuf {
    let mut path = std::env::current_exe()
        .expect("cannot find current exe")
        .parent()
        .expect("cannot find parent dir")
        .to_path_buf();
    if path.file_name().is_some_and(|n| n == "deps") {
        path = path.parent().unwrap().to_path_buf();
    }
    let tovac = path.join("tovac");
    assert!(
        tovac.exists(),
        "tovac binary not found at {}. Run `cargo build -p tovac` first.",
        tovac.display()
    );
    tovac
}

struct BuildResult {
    status: Option<i32>,
    stderr: String,
    dir: tempfile::TempDir,
}

fn build(source: &str) -> BuildResult {
    build_with_args(source, &[])
}

fn build_with_args(source: &str, extra: &[&str]) -> BuildResult {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let main = dir.path().join("main.tova");
    std::fs::write(&main, source).expect("failed to write main.tova");

    let mut args = vec!["build".to_string(), main.display().to_string()];
    args.extend(extra.iter().map(|s| s.to_string()));
    let output = Command::new(find_tovac())
        .args(&args)
        .output()
        .expect("failed to invoke tovac");

    BuildResult {
        status: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        dir,
    }
}

fn read_output(result: &BuildResult, name: &str) -> String {
    let path = result.dir.path().join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("missing output {}: {e}", path.display()))
}

// ── Success paths ──────────────────────────────────────────────────────

#[test]
fn e2e_shared_program_compiles() {
    let result = build("fn add(a, b) {\n  a + b\n}\nx = add(1, 2)");
    assert_eq!(result.status, Some(0), "stderr: {}", result.stderr);
    let shared = read_output(&result, "main.shared.js");
    assert!(shared.contains("function add(a, b)"));
    assert!(shared.contains("return (a + b);"));
    assert!(shared.contains("const x = add(1, 2);"));
}

#[test]
fn e2e_server_program_emits_rpc_route() {
    let result = build("server {\n  fn add(a, b) {\n    a + b\n  }\n}");
    assert_eq!(result.status, Some(0), "stderr: {}", result.stderr);
    let server = read_output(&result, "main.server.js");
    assert!(server.contains("__addRoute(\"POST\", \"/rpc/add\""));
    assert!(server.contains("Bun.serve"));
}

#[test]
fn e2e_client_program_emits_bundle() {
    let src = "client {\n  component App {\n    state count = 0\n    <div>{count}</div>\n  }\n}";
    let result = build(src);
    assert_eq!(result.status, Some(0), "stderr: {}", result.stderr);
    let client = read_output(&result, "main.client.js");
    assert!(client.contains("createSignal(0)"));
    assert!(client.contains("function App(__props)"));
}

#[test]
fn e2e_named_blocks_produce_named_files() {
    let src = "server \"api\" {\n  fn ping() {\n    1\n  }\n}\nclient \"dash\" {\n  state n = 0\n}";
    let result = build(src);
    assert_eq!(result.status, Some(0), "stderr: {}", result.stderr);
    assert!(result.dir.path().join("main.server.api.js").exists());
    assert!(result.dir.path().join("main.client.dash.js").exists());
}

#[test]
fn e2e_deploy_profile_written_as_json() {
    let src = "deploy \"prod\" {\n  server: \"api\"\n  domain: \"x.com\"\n  instances: 2\n}";
    let result = build(src);
    assert_eq!(result.status, Some(0), "stderr: {}", result.stderr);
    let raw = read_output(&result, "tova.deploy.json");
    let parsed: serde_json::Value = serde_json::from_str(&raw).expect("valid JSON");
    assert_eq!(parsed["prod"]["domain"], "x.com");
    assert_eq!(parsed["prod"]["instances"], 2);
}

#[test]
fn e2e_test_blocks_produce_harness() {
    let src = "server {\n  fn ping() {\n    1\n  }\n}\ntest \"smoke\" {\n  fn test_ping() {\n    expect(1)\n  }\n}";
    let result = build(src);
    assert_eq!(result.status, Some(0), "stderr: {}", result.stderr);
    let tests = read_output(&result, "tova.tests.js");
    assert!(tests.contains("describe(\"smoke\""));
    let server = read_output(&result, "main.server.js");
    assert!(server.contains("export { __handleRequest };"));
}

// ── Diagnostics ────────────────────────────────────────────────────────

#[test]
fn e2e_immutable_reassignment_fails_with_exit_1() {
    let result = build("x = 1\nx = 2");
    assert_eq!(result.status, Some(1));
    assert!(
        result.stderr.contains("Cannot reassign immutable variable 'x'"),
        "stderr: {}",
        result.stderr
    );
    assert!(
        result.stderr.contains("main.tova:2:1:"),
        "summary line must carry file:line:col, stderr: {}",
        result.stderr
    );
}

#[test]
fn e2e_warnings_do_not_fail_the_build() {
    let src = "fn h(o: Option) {\n  match o {\n    Some(v) => v\n  }\n}";
    let result = build(src);
    assert_eq!(result.status, Some(0), "stderr: {}", result.stderr);
    assert!(
        result.stderr.contains("Non-exhaustive match: missing 'None'"),
        "stderr: {}",
        result.stderr
    );
}

#[test]
fn e2e_strict_mode_upgrades_warnings() {
    let src = "fn f(a, b) {\n  a + b\n}\nf(1)";
    let result = build_with_args(src, &["--strict"]);
    assert_eq!(result.status, Some(1), "stderr: {}", result.stderr);
    assert!(result.stderr.contains("too few arguments to 'f'"));
}

#[test]
fn e2e_syntax_error_fails() {
    let result = build("x = = 1");
    assert_eq!(result.status, Some(1));
}

#[test]
fn e2e_lex_error_reports_location() {
    let result = build("x = 0x");
    assert_eq!(result.status, Some(1));
    assert!(
        result.stderr.contains("Expected hex digits after 0x"),
        "stderr: {}",
        result.stderr
    );
}

#[test]
fn e2e_missing_file_is_exit_2() {
    let output = Command::new(find_tovac())
        .args(["build", "/nonexistent/never.tova"])
        .output()
        .expect("failed to invoke tovac");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn e2e_check_writes_nothing() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let main = dir.path().join("main.tova");
    std::fs::write(&main, "x = 1").expect("write failed");
    let output = Command::new(find_tovac())
        .args(["check", main.display().to_string().as_str()])
        .output()
        .expect("failed to invoke tovac");
    assert_eq!(output.status.code(), Some(0));
    assert!(!dir.path().join("main.shared.js").exists());
}
