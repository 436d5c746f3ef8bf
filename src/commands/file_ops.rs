//! File operation commands: cat, mkdir, touch, rm, exists

use crate::error::{ErrorKind, ScriptError};
use crate::shell::{Cmd, CmdUsage};
use crate::state::State;

fn io_error(file: &str, e: std::io::Error) -> ScriptError {
    ScriptError::new(ErrorKind::ExecError, format!("{}: {}", file, e))
}

/// Split leading single-letter flags (`-p`, `-rf`) from operands.
/// Flags must come before operands; `--` ends flag parsing.
fn parse_flags<'a>(cmd: &str, args: &'a [String], allowed: &str) -> Result<(Vec<char>, &'a [String]), ScriptError> {
    let mut flags = Vec::new();
    let mut rest = args;
    while let Some((first, tail)) = rest.split_first() {
        if first == "--" {
            rest = tail;
            break;
        }
        let Some(letters) = first.strip_prefix('-').filter(|l| !l.is_empty()) else {
            break;
        };
        for c in letters.chars() {
            if !allowed.contains(c) {
                return Err(ScriptError::new(ErrorKind::UsageError,
                    format!("{}: unknown flag -{}", cmd, c)));
            }
            flags.push(c);
        }
        rest = tail;
    }
    Ok((flags, rest))
}

// ──────────────────────────────────────────────────────────
// cat: print file contents
// ──────────────────────────────────────────────────────────

pub(super) struct CatCmd;

impl Cmd for CatCmd {
    fn run(&self, state: &mut State, args: &[String]) -> Result<(), ScriptError> {
        if args.is_empty() {
            return Err(ScriptError::usage("cat", "file..."));
        }

        let mut output = String::new();
        for file in args {
            let content = state.read_file(file).map_err(|e| io_error(file, e))?;
            output.push_str(&content);
        }
        state.stdout = output;
        Ok(())
    }

    fn usage(&self) -> CmdUsage {
        CmdUsage {
            summary: "Print file contents".into(),
            args: "file...".into(),
        }
    }
}

// ──────────────────────────────────────────────────────────
// mkdir: create directories
// ──────────────────────────────────────────────────────────

pub(super) struct MkdirCmd;

impl Cmd for MkdirCmd {
    fn run(&self, state: &mut State, args: &[String]) -> Result<(), ScriptError> {
        let (flags, dirs) = parse_flags("mkdir", args, "p")?;
        if dirs.is_empty() {
            return Err(ScriptError::usage("mkdir", "[-p] dir..."));
        }

        let parents = flags.contains(&'p');
        for dir in dirs {
            let path = state.resolve_path(dir);
            let result = if parents {
                std::fs::create_dir_all(&path)
            } else {
                std::fs::create_dir(&path)
            };
            result.map_err(|e| io_error(dir, e))?;
        }
        Ok(())
    }

    fn usage(&self) -> CmdUsage {
        CmdUsage {
            summary: "Create directories".into(),
            args: "[-p] dir...".into(),
        }
    }
}

// ──────────────────────────────────────────────────────────
// touch: create files or update their modification time
// ──────────────────────────────────────────────────────────

pub(super) struct TouchCmd;

impl Cmd for TouchCmd {
    fn run(&self, state: &mut State, args: &[String]) -> Result<(), ScriptError> {
        if args.is_empty() {
            return Err(ScriptError::usage("touch", "file..."));
        }

        for file in args {
            let path = state.resolve_path(file);
            let handle = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| io_error(file, e))?;
            handle.set_modified(std::time::SystemTime::now())
                .map_err(|e| io_error(file, e))?;
        }
        Ok(())
    }

    fn usage(&self) -> CmdUsage {
        CmdUsage {
            summary: "Create files or update their modification time".into(),
            args: "file...".into(),
        }
    }
}

// ──────────────────────────────────────────────────────────
// rm: remove files and directories
// ──────────────────────────────────────────────────────────

pub(super) struct RmCmd;

impl Cmd for RmCmd {
    fn run(&self, state: &mut State, args: &[String]) -> Result<(), ScriptError> {
        let (flags, paths) = parse_flags("rm", args, "rf")?;
        if paths.is_empty() {
            return Err(ScriptError::usage("rm", "[-r] [-f] path..."));
        }

        let recursive = flags.contains(&'r');
        let force = flags.contains(&'f');
        for name in paths {
            let path = state.resolve_path(name);
            let meta = match std::fs::symlink_metadata(&path) {
                Ok(meta) => meta,
                Err(_) if force => continue,
                Err(e) => return Err(io_error(name, e)),
            };

            let result = if meta.is_dir() {
                if !recursive {
                    return Err(ScriptError::new(ErrorKind::ExecError,
                        format!("{}: is a directory (use -r)", name)));
                }
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            result.map_err(|e| io_error(name, e))?;
        }
        Ok(())
    }

    fn usage(&self) -> CmdUsage {
        CmdUsage {
            summary: "Remove files (-r for directories, -f to ignore missing)".into(),
            args: "[-r] [-f] path...".into(),
        }
    }
}

// ──────────────────────────────────────────────────────────
// exists: fail unless every path exists
// ──────────────────────────────────────────────────────────

pub(super) struct ExistsCmd;

impl Cmd for ExistsCmd {
    fn run(&self, state: &mut State, args: &[String]) -> Result<(), ScriptError> {
        if args.is_empty() {
            return Err(ScriptError::usage("exists", "path..."));
        }

        for name in args {
            if !state.resolve_path(name).exists() {
                return Err(ScriptError::new(ErrorKind::ExecError,
                    format!("{} does not exist", name)));
            }
        }
        Ok(())
    }

    fn usage(&self) -> CmdUsage {
        CmdUsage {
            summary: "Check that paths exist".into(),
            args: "path...".into(),
        }
    }
}
