//! Host shell
//!
//! `Shell` is the concrete `Host`: an explicit registry of builtin commands,
//! built once at construction, with fallback to external programs on `PATH`.
//! It owns everything the interpreter does not: word splitting, quoting,
//! `>`/`>>` redirection and process spawning.

use std::collections::HashMap;
use std::io::Write;
use crate::error::{ErrorKind, ScriptError};
use crate::host::{trim_trailing_newlines, Host};
use crate::parser::{split_words, Word};
use crate::state::State;

/// Usage information for a command
pub struct CmdUsage {
    /// One-line summary
    pub summary: String,
    /// Argument syntax
    pub args: String,
}

/// A builtin command of the host shell
pub trait Cmd: Send + Sync {
    /// Execute the command.
    /// Output goes to `state.stdout` / `state.stderr`.
    fn run(&self, state: &mut State, args: &[String]) -> Result<(), ScriptError>;

    /// Return usage information
    fn usage(&self) -> CmdUsage;
}

/// A boxed command
pub type BoxedCmd = Box<dyn Cmd>;

/// Where a line's stdout should go instead of the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
struct Redirect {
    target: String,
    append: bool,
}

/// Result of dispatching one line
struct Dispatched {
    redirect: Option<Redirect>,
    result: Result<(), ScriptError>,
}

/// The host shell: holds the command registry
pub struct Shell {
    /// Registered builtin commands
    pub commands: HashMap<String, BoxedCmd>,
    /// Also write command output to the process stdout/stderr
    pub passthrough: bool,
}

impl Shell {
    /// Create a new shell with the default builtins
    pub fn new() -> Self {
        let mut shell = Self {
            commands: crate::commands::default_commands(),
            passthrough: false,
        };
        shell.rebuild_help();
        shell
    }

    /// Register a custom command, replacing any builtin of the same name
    pub fn register_command(&mut self, name: impl Into<String>, cmd: BoxedCmd) {
        self.commands.insert(name.into(), cmd);
        self.rebuild_help();
    }

    /// `help` holds a snapshot of the registry; refresh it after every change.
    fn rebuild_help(&mut self) {
        let mut cmd_help: Vec<(String, String, String)> = self.commands.iter()
            .filter(|(name, _)| name.as_str() != "help")
            .map(|(name, cmd)| {
                let u = cmd.usage();
                (name.clone(), u.args, u.summary)
            })
            .collect();
        cmd_help.push((
            "help".into(),
            "[command...]".into(),
            "Display help for commands".into(),
        ));
        cmd_help.sort_by(|a, b| a.0.cmp(&b.0));

        self.commands.insert("help".into(), Box::new(crate::commands::HelpCmd::new(cmd_help)));
    }

    /// Split a line and run it, leaving its output in `state.stdout`/`state.stderr`.
    ///
    /// Only a line that cannot be split fails here; the command's own result
    /// is returned alongside the redirect so its output can still be routed.
    fn run_line(&self, state: &mut State, line: &str) -> Result<Dispatched, ScriptError> {
        state.stdout.clear();
        state.stderr.clear();

        let words = split_words(line).map_err(ScriptError::exec)?;
        let (argv, redirect) = split_redirect(words)?;
        let Some((name, args)) = argv.split_first() else {
            return Ok(Dispatched { redirect, result: Ok(()) });
        };

        let result = match self.commands.get(name) {
            Some(cmd) => cmd.run(state, args),
            None => crate::commands::run_external(state, name, args),
        };

        if self.passthrough && !state.stderr.is_empty() {
            eprint!("{}", state.stderr);
        }
        Ok(Dispatched { redirect, result })
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for Shell {
    fn execute_line(&self, state: &mut State, line: &str) -> Result<(), ScriptError> {
        let dispatched = self.run_line(state, line)?;

        // Output is kept even when the command failed.
        match dispatched.redirect {
            Some(r) => write_redirect(state, &r)?,
            None => {
                state.output.push_str(&state.stdout);
                if self.passthrough {
                    print!("{}", state.stdout);
                    let _ = std::io::stdout().flush();
                }
            }
        }
        dispatched.result
    }

    fn capture_output(&self, state: &mut State, line: &str) -> Result<String, ScriptError> {
        let dispatched = self.run_line(state, line)?;
        if let Some(r) = dispatched.redirect {
            write_redirect(state, &r)?;
            return dispatched.result.map(|()| String::new());
        }
        dispatched.result?;
        Ok(trim_trailing_newlines(&state.stdout).to_string())
    }
}

/// Separate an unquoted `>`/`>>` and its target from the command words.
///
/// Words after the target are still arguments of the command.
fn split_redirect(words: Vec<Word>) -> Result<(Vec<String>, Option<Redirect>), ScriptError> {
    let mut argv = Vec::with_capacity(words.len());
    let mut redirect = None;
    let mut words = words.into_iter();

    while let Some(word) = words.next() {
        let append = match word.text.as_str() {
            ">" if !word.quoted => false,
            ">>" if !word.quoted => true,
            _ => {
                argv.push(word.text);
                continue;
            }
        };
        if redirect.is_some() {
            return Err(ScriptError::exec("multiple output redirections"));
        }
        let target = words.next()
            .ok_or_else(|| ScriptError::exec("missing redirection target"))?;
        redirect = Some(Redirect { target: target.text, append });
    }

    Ok((argv, redirect))
}

fn write_redirect(state: &State, redirect: &Redirect) -> Result<(), ScriptError> {
    let path = state.resolve_path(&redirect.target);
    let io_err = |e: std::io::Error| {
        ScriptError::new(ErrorKind::Io, format!("{}: {}", redirect.target, e))
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .append(redirect.append)
        .truncate(!redirect.append)
        .open(&path)
        .map_err(io_err)?;
    file.write_all(state.stdout.as_bytes()).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, State, Shell) {
        let tmp = tempfile::tempdir().unwrap();
        let state = State::new(tmp.path().to_path_buf());
        (tmp, state, Shell::new())
    }

    fn words(line: &str) -> Vec<Word> {
        split_words(line).unwrap()
    }

    #[test]
    fn test_split_redirect() {
        let (argv, r) = split_redirect(words("echo hi > out.txt")).unwrap();
        assert_eq!(argv, vec!["echo", "hi"]);
        assert_eq!(r, Some(Redirect { target: "out.txt".into(), append: false }));

        let (argv, r) = split_redirect(words("echo a >> log b")).unwrap();
        assert_eq!(argv, vec!["echo", "a", "b"]);
        assert!(r.unwrap().append);

        let (argv, r) = split_redirect(words("echo '>' x")).unwrap();
        assert_eq!(argv, vec!["echo", ">", "x"]);
        assert!(r.is_none());
    }

    #[test]
    fn test_split_redirect_errors() {
        assert!(split_redirect(words("echo hi >")).is_err());
        assert!(split_redirect(words("echo > a > b")).is_err());
    }

    #[test]
    fn test_builtin_echo_goes_to_transcript() {
        let (_tmp, mut state, shell) = setup();
        shell.execute_line(&mut state, "echo hello   'big world'").unwrap();
        assert_eq!(state.output, "hello big world\n");
    }

    #[test]
    fn test_redirect_truncate_and_append() {
        let (tmp, mut state, shell) = setup();
        shell.execute_line(&mut state, "echo one > logs/out.txt").unwrap();
        shell.execute_line(&mut state, "echo two >> logs/out.txt").unwrap();
        let content = std::fs::read_to_string(tmp.path().join("logs/out.txt")).unwrap();
        assert_eq!(content, "one\ntwo\n");
        assert!(state.output.is_empty());

        shell.execute_line(&mut state, "echo three > logs/out.txt").unwrap();
        let content = std::fs::read_to_string(tmp.path().join("logs/out.txt")).unwrap();
        assert_eq!(content, "three\n");
    }

    #[test]
    fn test_capture_output_trims_and_skips_transcript() {
        let (_tmp, mut state, shell) = setup();
        let out = shell.capture_output(&mut state, "echo captured").unwrap();
        assert_eq!(out, "captured");
        assert!(state.output.is_empty());
    }

    #[test]
    fn test_unknown_command() {
        let (_tmp, mut state, shell) = setup();
        let err = shell.execute_line(&mut state, "definitely-not-a-real-command-xyz").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownCommand);
    }

    #[test]
    fn test_unterminated_quote_is_exec_error() {
        let (_tmp, mut state, shell) = setup();
        let err = shell.execute_line(&mut state, "echo 'oops").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExecError);
    }

    #[test]
    fn test_blank_line_is_noop() {
        let (_tmp, mut state, shell) = setup();
        shell.execute_line(&mut state, "   ").unwrap();
        assert!(state.output.is_empty());
    }

    #[test]
    fn test_custom_command() {
        struct Shout;
        impl Cmd for Shout {
            fn run(&self, state: &mut State, args: &[String]) -> Result<(), ScriptError> {
                state.stdout = args.join(" ").to_uppercase() + "\n";
                Ok(())
            }
            fn usage(&self) -> CmdUsage {
                CmdUsage { summary: "Shout".into(), args: "[word...]".into() }
            }
        }

        let (_tmp, mut state, mut shell) = setup();
        shell.register_command("shout", Box::new(Shout));
        shell.execute_line(&mut state, "shout hey there").unwrap();
        assert_eq!(state.output, "HEY THERE\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_external_command() {
        let (_tmp, mut state, shell) = setup();
        let out = shell.capture_output(&mut state, "printf 'a\\nb\\n'").unwrap();
        assert_eq!(out, "a\nb");

        let err = shell.execute_line(&mut state, "sh -c 'exit 3'").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExecError);
        assert!(err.message.contains("exit code 3"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_command_keeps_its_output() {
        let (tmp, mut state, shell) = setup();
        let err = shell.execute_line(&mut state, "sh -c 'echo partial; exit 1'").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExecError);
        assert_eq!(state.output, "partial\n");

        let err = shell.execute_line(&mut state, "sh -c 'echo saved; exit 2' > out.txt").unwrap_err();
        assert!(err.message.contains("exit code 2"));
        let content = std::fs::read_to_string(tmp.path().join("out.txt")).unwrap();
        assert_eq!(content, "saved\n");
        assert_eq!(state.output, "partial\n");
    }

    #[test]
    fn test_help_lists_commands_registered_later() {
        struct Noop;
        impl Cmd for Noop {
            fn run(&self, _state: &mut State, _args: &[String]) -> Result<(), ScriptError> {
                Ok(())
            }
            fn usage(&self) -> CmdUsage {
                CmdUsage { summary: "Do nothing at all".into(), args: "".into() }
            }
        }

        let (_tmp, mut state, mut shell) = setup();
        shell.register_command("noop", Box::new(Noop));
        shell.execute_line(&mut state, "help noop").unwrap();
        assert_eq!(state.output, "noop\n    Do nothing at all\n");
    }
}
