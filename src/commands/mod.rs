//! Builtin commands of the host shell
//!
//! Anything not registered here is run as an external program.

mod exec;
mod file_ops;
mod flow;
mod env;
mod help;

use std::collections::HashMap;
use crate::shell::BoxedCmd;

pub use help::HelpCmd;
pub(crate) use exec::run_external;

/// Return the default set of builtin commands
pub fn default_commands() -> HashMap<String, BoxedCmd> {
    let mut cmds: HashMap<String, BoxedCmd> = HashMap::new();
    cmds.insert("echo".into(), Box::new(env::EchoCmd));
    cmds.insert("pwd".into(), Box::new(env::PwdCmd));
    cmds.insert("cd".into(), Box::new(env::CdCmd));
    cmds.insert("cat".into(), Box::new(file_ops::CatCmd));
    cmds.insert("mkdir".into(), Box::new(file_ops::MkdirCmd));
    cmds.insert("touch".into(), Box::new(file_ops::TouchCmd));
    cmds.insert("rm".into(), Box::new(file_ops::RmCmd));
    cmds.insert("exists".into(), Box::new(file_ops::ExistsCmd));
    cmds.insert("true".into(), Box::new(flow::TrueCmd));
    cmds.insert("false".into(), Box::new(flow::FalseCmd));
    cmds
}
