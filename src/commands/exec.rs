//! External programs: anything that is not a builtin

use std::path::{Path, PathBuf};
use std::process::{Command as ProcessCommand, Stdio};
use crate::error::{ErrorKind, ScriptError};
use crate::state::State;

/// Run `program args...` in the run's working directory and wait for it.
///
/// Stdout and stderr are captured into `state.stdout` / `state.stderr`.
/// A non-zero exit status is an execution error.
pub(crate) fn run_external(state: &mut State, program: &str, args: &[String]) -> Result<(), ScriptError> {
    let resolved = look_path(state, program).ok_or_else(|| {
        ScriptError::new(ErrorKind::UnknownCommand, format!("command not found: {}", program))
    })?;

    let output = ProcessCommand::new(&resolved)
        .args(args)
        .current_dir(&state.pwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| ScriptError::exec(format!("failed to execute '{}': {}", program, e)))?;

    state.stdout = String::from_utf8_lossy(&output.stdout).to_string();
    state.stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        let msg = match output.status.code() {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        return Err(ScriptError::exec(msg));
    }
    Ok(())
}

/// Find an executable by name.
///
/// Names containing a path separator are resolved against the working
/// directory; bare names are searched on `PATH`.
fn look_path(state: &State, command: &str) -> Option<PathBuf> {
    if command.contains('/') || command.contains(std::path::MAIN_SEPARATOR) {
        let path = state.resolve_path(command);
        return is_executable(&path).then_some(path);
    }

    let path_env = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_env) {
        if dir.as_os_str().is_empty() {
            continue;
        }

        #[cfg(windows)]
        {
            let pathext = std::env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
            for ext in pathext.split(';').filter(|e| !e.is_empty()) {
                let candidate = dir.join(format!("{}{}", command, ext.to_lowercase()));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }

        let candidate = dir.join(command);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
