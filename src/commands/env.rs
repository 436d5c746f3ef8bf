//! Environment commands: echo, pwd, cd

use crate::error::{ErrorKind, ScriptError};
use crate::shell::{Cmd, CmdUsage};
use crate::state::State;

// ──────────────────────────────────────────────────────────
// echo: print arguments
// ──────────────────────────────────────────────────────────

pub(super) struct EchoCmd;

impl Cmd for EchoCmd {
    fn run(&self, state: &mut State, args: &[String]) -> Result<(), ScriptError> {
        state.stdout = args.join(" ") + "\n";
        Ok(())
    }

    fn usage(&self) -> CmdUsage {
        CmdUsage {
            summary: "Print arguments separated by spaces".into(),
            args: "[string...]".into(),
        }
    }
}

// ──────────────────────────────────────────────────────────
// pwd: print working directory
// ──────────────────────────────────────────────────────────

pub(super) struct PwdCmd;

impl Cmd for PwdCmd {
    fn run(&self, state: &mut State, args: &[String]) -> Result<(), ScriptError> {
        if !args.is_empty() {
            return Err(ScriptError::usage("pwd", ""));
        }
        state.stdout = format!("{}\n", state.pwd.display());
        Ok(())
    }

    fn usage(&self) -> CmdUsage {
        CmdUsage {
            summary: "Print the working directory".into(),
            args: "".into(),
        }
    }
}

// ──────────────────────────────────────────────────────────
// cd: change directory
// ──────────────────────────────────────────────────────────

pub(super) struct CdCmd;

impl Cmd for CdCmd {
    fn run(&self, state: &mut State, args: &[String]) -> Result<(), ScriptError> {
        let target = match args {
            [] => None,
            [dir] if dir == "~" => None,
            [dir] => Some(dir.clone()),
            _ => return Err(ScriptError::usage("cd", "[dir]")),
        };
        let target = match target {
            Some(dir) => dir,
            None => std::env::var("HOME").map_err(|_| {
                ScriptError::new(ErrorKind::ExecError, "cd: HOME not set")
            })?,
        };

        state.chdir(&target).map_err(|e| {
            ScriptError::new(ErrorKind::ExecError, format!("cd {}: {}", target, e))
        })
    }

    fn usage(&self) -> CmdUsage {
        CmdUsage {
            summary: "Change working directory (default: $HOME)".into(),
            args: "[dir]".into(),
        }
    }
}
