//! Host command interface
//!
//! The interpreter never runs commands itself. Plain lines and command
//! substitutions are handed to a `Host`, which owns command resolution,
//! quoting, redirection and process management.

use crate::error::ScriptError;
use crate::state::State;

/// The command-execution capabilities the interpreter needs from its host
pub trait Host {
    /// Run one fully substituted command line.
    ///
    /// Output goes wherever the host sends it; the host records the line's
    /// stdout in `state.output`. An `Err` is reported as a diagnostic for the
    /// line and the script continues.
    fn execute_line(&self, state: &mut State, line: &str) -> Result<(), ScriptError>;

    /// Run one command line and return its standard output.
    ///
    /// Used for `name=$( command )`. Only stdout is returned (stderr is not
    /// merged), trailing line breaks are stripped, and the output is not added
    /// to the transcript. A failing command is an `Err`.
    fn capture_output(&self, state: &mut State, line: &str) -> Result<String, ScriptError>;
}

/// Strip trailing `\n` / `\r\n` from captured output.
pub fn trim_trailing_newlines(s: &str) -> &str {
    s.trim_end_matches(['\n', '\r'])
}
