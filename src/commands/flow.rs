//! Status commands: true, false

use crate::error::ScriptError;
use crate::shell::{Cmd, CmdUsage};
use crate::state::State;

pub(super) struct TrueCmd;

impl Cmd for TrueCmd {
    fn run(&self, _state: &mut State, _args: &[String]) -> Result<(), ScriptError> {
        Ok(())
    }

    fn usage(&self) -> CmdUsage {
        CmdUsage {
            summary: "Do nothing, successfully".into(),
            args: "".into(),
        }
    }
}

pub(super) struct FalseCmd;

impl Cmd for FalseCmd {
    fn run(&self, _state: &mut State, args: &[String]) -> Result<(), ScriptError> {
        let msg = if args.is_empty() {
            "false".to_string()
        } else {
            args.join(" ")
        };
        Err(ScriptError::exec(msg))
    }

    fn usage(&self) -> CmdUsage {
        CmdUsage {
            summary: "Fail, with an optional message".into(),
            args: "[message...]".into(),
        }
    }
}
