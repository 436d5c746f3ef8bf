//! help: display command help

use crate::error::ScriptError;
use crate::shell::{Cmd, CmdUsage};
use crate::state::State;

pub struct HelpCmd {
    /// (name, args, summary) for each command
    cmd_info: Vec<(String, String, String)>,
}

impl HelpCmd {
    pub fn new(cmd_info: Vec<(String, String, String)>) -> Self {
        Self { cmd_info }
    }

    fn describe(output: &mut String, name: &str, args: &str, summary: &str) {
        if args.is_empty() {
            output.push_str(&format!("{}\n    {}\n", name, summary));
        } else {
            output.push_str(&format!("{} {}\n    {}\n", name, args, summary));
        }
    }
}

impl Cmd for HelpCmd {
    fn run(&self, state: &mut State, args: &[String]) -> Result<(), ScriptError> {
        let mut output = String::new();

        if args.is_empty() {
            for (name, args_str, summary) in &self.cmd_info {
                Self::describe(&mut output, name, args_str, summary);
            }
        } else {
            for name in args {
                match self.cmd_info.iter().find(|(n, _, _)| n == name) {
                    Some((_, args_str, summary)) => Self::describe(&mut output, name, args_str, summary),
                    None => output.push_str(&format!("{}: not a builtin\n", name)),
                }
            }
        }

        state.stdout = output;
        Ok(())
    }

    fn usage(&self) -> CmdUsage {
        CmdUsage {
            summary: "Display help for commands".into(),
            args: "[command...]".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Host;
    use crate::shell::Shell;

    #[test]
    fn test_help_lists_every_builtin() {
        let shell = Shell::new();
        let mut state = State::new(std::env::temp_dir());
        shell.execute_line(&mut state, "help").unwrap();
        for name in shell.commands.keys() {
            assert!(state.stdout.contains(name.as_str()), "help is missing {}", name);
        }
    }

    #[test]
    fn test_help_for_one_command() {
        let shell = Shell::new();
        let mut state = State::new(std::env::temp_dir());
        shell.execute_line(&mut state, "help cd ls").unwrap();
        assert!(state.stdout.starts_with("cd [dir]\n"));
        assert!(state.stdout.contains("ls: not a builtin"));
    }
}
