//! Integration tests: run the bundled scripts in `tests/scripts/` and drive
//! the engine through the public API with the builtin shell.
//!
//! Usage:
//!   cargo test --test integration
//!   MYSHELL_SCRIPT_VERBOSE=1 cargo test --test integration  # keep execution logs
//!
//! Environment variables:
//!   MYSHELL_SCRIPT_VERBOSE=1  keep the per-line execution log
//!   MYSHELL_SCRIPT_WORK=1     preserve working directories

use std::path::{Path, PathBuf};
use myshell_script::{Engine, ErrorKind, Shell, State};

fn scripts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/scripts")
}

fn run_script(script: &str) -> State {
    let tmp = tempfile::tempdir().unwrap();
    let mut state = State::new(tmp.path().to_path_buf());
    Engine::new().execute(&Shell::new(), &mut state, script, "inline.myshell");
    state
}

#[test]
fn scripts_all() {
    myshell_script::run_and_assert(scripts_dir());
}

#[test]
fn loop_variable_drives_final_command() {
    let state = run_script("count=0\nfor i in [1,2,3]\ncount=$i\ndone\necho $count");
    assert_eq!(state.output, "3\n");
    assert!(state.diagnostics.is_empty());
}

#[test]
fn if_else_runs_exactly_one_branch() {
    let state = run_script("if [ 5 -gt 3 ]\necho yes\nelse\necho no\nfi");
    assert_eq!(state.output, "yes\n");
}

#[test]
fn failing_line_does_not_stop_the_script() {
    let state = run_script("false boom\nno-such-command-for-sure-xyz\necho still here");
    assert_eq!(state.output, "still here\n");
    assert_eq!(state.diagnostics.len(), 2);
    assert_eq!(state.diagnostics[0].kind, ErrorKind::ExecError);
    assert_eq!(state.diagnostics[0].line, Some(1));
    assert_eq!(state.diagnostics[1].kind, ErrorKind::UnknownCommand);
}

#[test]
fn missing_terminators_are_reported() {
    let state = run_script("for i in [1]\nif [ x ]\necho hi\n");
    assert!(state.diagnostics.iter().all(|d| d.kind == ErrorKind::SyntaxError));
    assert!(state.diagnostics.iter().any(|d| d.message.contains("missing 'done'")));
    assert!(state.diagnostics.iter().any(|d| d.message.contains("missing 'fi'")));
}

#[test]
fn missing_script_file_is_fatal() {
    let mut state = State::new(std::env::temp_dir());
    let err = Engine::new()
        .run_file(&Shell::new(), &mut state, Path::new("/no/such/dir/script.myshell"))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::FileError);
}

#[test]
fn cd_changes_where_later_lines_run() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir(tmp.path().join("sub")).unwrap();
    let mut state = State::new(tmp.path().to_path_buf());
    let script = "cd sub\ntouch made-here\nif [ -f made-here ]\necho ok\nfi";
    Engine::new().execute(&Shell::new(), &mut state, script, "cd.myshell");
    assert_eq!(state.output, "ok\n");
    assert!(tmp.path().join("sub/made-here").is_file());
}
