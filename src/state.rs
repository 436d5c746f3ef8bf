//! Script execution state
//!
//! Holds mutable per-run state: the variable store, working directory,
//! last command output, transcript, log and collected diagnostics.
//! One `State` belongs to exactly one script run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use crate::error::ScriptError;

/// Mutable state for a single script execution
pub struct State {
    /// Current working directory (changed by `cd`)
    pub pwd: PathBuf,
    /// Script variables, in first-assignment order
    vars: Vec<(String, String)>,
    /// Index for O(1) lookup by name → position in `vars`
    var_index: HashMap<String, usize>,
    /// Last command's stdout
    pub stdout: String,
    /// Last command's stderr
    pub stderr: String,
    /// Stdout of every forwarded line, in order
    pub output: String,
    /// Execution log
    pub log: String,
    /// Non-fatal errors reported during the run
    pub diagnostics: Vec<ScriptError>,
}

impl State {
    /// Create a new State with an empty variable store
    pub fn new(pwd: PathBuf) -> Self {
        Self {
            pwd,
            vars: Vec::new(),
            var_index: HashMap::new(),
            stdout: String::new(),
            stderr: String::new(),
            output: String::new(),
            log: String::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Set a variable, overwriting any previous value in place.
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(&idx) = self.var_index.get(&name) {
            self.vars[idx].1 = value;
        } else {
            let idx = self.vars.len();
            self.vars.push((name.clone(), value));
            self.var_index.insert(name, idx);
        }
    }

    /// Get a variable's value.
    pub fn get_var(&self, name: &str) -> Option<&str> {
        self.var_index.get(name).map(|&idx| self.vars[idx].1.as_str())
    }

    /// All variables as (name, value) pairs, in first-assignment order.
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Substitute `$name` / `${name}` references with stored values.
    pub fn expand(&self, s: &str) -> String {
        crate::parser::expand_vars(s, &|name| self.get_var(name).map(|v| v.to_string()))
    }

    /// Resolve a path relative to the current working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            clean_path(p)
        } else {
            clean_path(&self.pwd.join(path))
        }
    }

    /// Change the current working directory.
    pub fn chdir(&mut self, dir: &str) -> Result<(), std::io::Error> {
        let new_pwd = self.resolve_path(dir);
        if !new_pwd.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such directory: {}", new_pwd.display()),
            ));
        }
        self.pwd = new_pwd;
        Ok(())
    }

    /// Write a log entry
    pub fn logf(&mut self, msg: &str) {
        self.log.push_str(msg);
        if !msg.ends_with('\n') {
            self.log.push('\n');
        }
    }

    /// Record a non-fatal error and keep going.
    pub fn report(&mut self, err: ScriptError) {
        self.logf(&format!("ERROR: {}", err));
        self.diagnostics.push(err);
    }

    /// Read a file relative to the working directory.
    /// Line endings are normalized to LF.
    pub fn read_file(&self, name: &str) -> Result<String, std::io::Error> {
        let content = std::fs::read_to_string(self.resolve_path(name))?;
        Ok(content.replace("\r\n", "\n"))
    }
}

/// Clean a path by resolving `.` and `..` components lexically.
///
/// Unlike `canonicalize()`, this does not require the path to exist on disk.
fn clean_path(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut cleaned = PathBuf::new();
    // Normal components a later `..` may still remove
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir if depth > 0 => {
                cleaned.pop();
                depth -= 1;
            }
            Component::ParentDir if cleaned.has_root() => {}
            Component::Normal(_) => {
                cleaned.push(component);
                depth += 1;
            }
            other => cleaned.push(other),
        }
    }

    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_var_overwrites_in_place() {
        let mut state = State::new(PathBuf::from("."));
        state.set_var("a", "1");
        state.set_var("b", "2");
        state.set_var("a", "3");
        assert_eq!(state.get_var("a"), Some("3"));
        let names: Vec<&str> = state.vars().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_get_undefined_var() {
        let state = State::new(PathBuf::from("."));
        assert_eq!(state.get_var("nope"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_clean_path() {
        assert_eq!(clean_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(clean_path(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(clean_path(Path::new("../x")), PathBuf::from("../x"));
        assert_eq!(clean_path(Path::new("a/..")), PathBuf::from("."));
        assert_eq!(clean_path(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(clean_path(Path::new("../../x/..")), PathBuf::from("../.."));
    }

    #[test]
    fn test_chdir_missing_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let mut state = State::new(tmp.path().to_path_buf());
        assert!(state.chdir("missing").is_err());
        std::fs::create_dir(tmp.path().join("sub")).unwrap();
        state.chdir("sub").unwrap();
        assert_eq!(state.pwd, tmp.path().join("sub"));
    }

    #[test]
    fn test_report_logs_and_collects() {
        let mut state = State::new(PathBuf::from("."));
        state.report(ScriptError::syntax("missing 'fi'").with_location("t.myshell", 2));
        assert_eq!(state.diagnostics.len(), 1);
        assert!(state.log.contains("ERROR: t.myshell:2: syntax error: missing 'fi'"));
    }
}
