//! myshell-script: an embedded scripting engine for `.myshell` files
//!
//! Scripts are plain text, one statement per line, executed against a host
//! command shell. Blocks are matched on the fly from the raw lines with a
//! nesting counter; there is no syntax tree.
//!
//! # Script Syntax
//!
//! ```text
//! # full-line comment
//! name=world
//! listing=$( ls /tmp )
//! echo hello $name
//!
//! if [ $name == world ]
//!     echo matched
//! else
//!     echo no match
//! fi
//!
//! for f in [a.txt, 'b.txt', "c.txt"]
//!     touch $f
//! done
//! ```
//!
//! # Conditions
//!
//! | Operator | Meaning |
//! |----------|---------|
//! | `a == b` | string equality |
//! | `a != b` | string inequality |
//! | `a -eq b` | integer equality |
//! | `a -lt b` | integer less-than |
//! | `a -gt b` | integer greater-than |
//! | `-f path` | existing regular file |
//! | `-d path` | existing directory |
//! | `text` | non-empty after trimming |
//!
//! Only the first operator found, in the order above, is applied.
//!
//! # Errors
//!
//! Malformed blocks, bad conditions and failing commands are recorded in
//! `State::diagnostics` and the script keeps going. Only a missing or
//! unreadable script file aborts a run.

mod blocks;
mod commands;
mod conditions;
mod engine;
mod error;
mod host;
mod parser;
mod runner;
mod shell;
mod state;

pub use blocks::{match_for, match_if, ForBlock, IfBlock};
pub use commands::default_commands;
pub use conditions::{default_operators, evaluate, BoxedOperator, Operator};
pub use engine::Engine;
pub use error::{ErrorKind, ScriptError};
pub use host::Host;
pub use parser::{classify_line, expand_vars, split_words, ScriptLine, Word};
pub use runner::{RunConfig, RunSummary, RunnerBuilder, ScriptResult, ScriptRunner, SetupEnv};
pub use shell::{BoxedCmd, Cmd, CmdUsage, Shell};
pub use state::State;

// Convenience functions for cargo test integration
pub use runner::{run, run_and_assert, run_and_assert_with};
