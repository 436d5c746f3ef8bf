//! Script engine
//!
//! The Engine holds the condition operator registry and drives execution.
//! It is stateless config; one engine can run many scripts, each with its
//! own `State`.
//!
//! Execution walks lines by index. Block openers are matched on the fly
//! (`blocks`), and block bodies are run through the same dispatch as the top
//! level, restricted to the body's line range.

use std::ops::Range;
use std::path::Path;
use crate::blocks::{self, ForBlock, IfBlock};
use crate::conditions::{self, BoxedOperator};
use crate::error::{ErrorKind, ScriptError};
use crate::host::Host;
use crate::parser::{self, ScriptLine};
use crate::state::State;

/// The script engine: holds the condition operators
pub struct Engine {
    /// Condition operators, in priority order
    pub operators: Vec<(String, BoxedOperator)>,
    /// Whether to suppress line logging
    pub quiet: bool,
}

/// Borrowed context for one script run
struct Run<'a> {
    host: &'a dyn Host,
    lines: Vec<&'a str>,
    filename: &'a str,
}

impl Engine {
    /// Create a new engine with the default operators
    pub fn new() -> Self {
        Self {
            operators: conditions::default_operators(),
            quiet: false,
        }
    }

    /// Register a custom condition operator.
    /// It is tried after all previously registered operators.
    pub fn register_operator(&mut self, token: impl Into<String>, op: BoxedOperator) {
        self.operators.push((token.into(), op));
    }

    /// Read and execute a script file.
    ///
    /// A missing or unreadable file is the only fatal error; everything else
    /// ends up in `state.diagnostics`.
    pub fn run_file(&self, host: &dyn Host, state: &mut State, path: &Path) -> Result<(), ScriptError> {
        let script = std::fs::read_to_string(path).map_err(|e| {
            ScriptError::new(ErrorKind::FileError,
                format!("cannot read script {}: {}", path.display(), e))
        })?;
        let filename = path.to_string_lossy();
        self.execute(host, state, &script, &filename);
        Ok(())
    }

    /// Execute a script from text.
    pub fn execute(&self, host: &dyn Host, state: &mut State, script: &str, filename: &str) {
        let run = Run {
            host,
            lines: script.lines().collect(),
            filename,
        };
        self.execute_range(&run, state, 0..run.lines.len());
    }

    /// Execute `range` of the script's lines as a flat statement list.
    fn execute_range(&self, run: &Run<'_>, state: &mut State, range: Range<usize>) {
        let mut i = range.start;
        while i < range.end {
            i = self.step(run, state, i, range.end);
        }
    }

    /// Execute the statement starting at line `i`, which must not extend past
    /// `limit`. Returns the index to resume at.
    fn step(&self, run: &Run<'_>, state: &mut State, i: usize, limit: usize) -> usize {
        let raw = run.lines[i];
        let kind = match parser::classify_line(raw) {
            Some(kind) => kind,
            None => {
                if !self.quiet && raw.trim_start().starts_with('#') {
                    state.logf(raw.trim());
                }
                return i + 1;
            }
        };

        if !self.quiet {
            state.logf(&format!("> {}", raw.trim()));
        }

        match kind {
            ScriptLine::Assign { name, value } => {
                self.assign(run, state, i, name, value);
                i + 1
            }
            ScriptLine::If => match blocks::match_if(&run.lines, i, limit) {
                Ok(block) => {
                    let end = block.end;
                    self.run_if(run, state, block);
                    end
                }
                Err(e) => {
                    state.report(e.with_location(run.filename, i + 1));
                    i + 1
                }
            },
            ScriptLine::For => match blocks::match_for(&run.lines, i, limit) {
                Ok(block) => {
                    let end = block.end;
                    self.run_for(run, state, block);
                    end
                }
                Err(e) => {
                    state.report(e.with_location(run.filename, i + 1));
                    i + 1
                }
            },
            ScriptLine::Else | ScriptLine::Fi | ScriptLine::Done => {
                state.report(ScriptError::syntax(format!("unexpected '{}'", raw.trim()))
                    .with_location(run.filename, i + 1));
                i + 1
            }
            ScriptLine::Command(line) => {
                let line = state.expand(line);
                if let Err(e) = run.host.execute_line(state, &line) {
                    state.report(e.with_location(run.filename, i + 1).with_command(line));
                }
                i + 1
            }
        }
    }

    /// `name=value`, `name='literal'` or `name=$( command )`
    fn assign(&self, run: &Run<'_>, state: &mut State, i: usize, name: &str, value: &str) {
        let literal = value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2;
        let value = parser::unquote(value);

        if literal {
            state.set_var(name, value);
            return;
        }

        if let Some(command) = parser::command_substitution(value) {
            let command = state.expand(command);
            match run.host.capture_output(state, &command) {
                Ok(out) => state.set_var(name, out),
                Err(e) => {
                    state.report(e.with_location(run.filename, i + 1).with_command(command));
                }
            }
            return;
        }

        let value = state.expand(value);
        state.set_var(name, value);
    }

    fn run_if(&self, run: &Run<'_>, state: &mut State, block: IfBlock) {
        let condition = state.expand(&block.condition);
        match conditions::evaluate(&self.operators, state, &condition) {
            Ok(true) => {
                if !self.quiet {
                    state.logf("[if: true]");
                }
                self.execute_range(run, state, block.body);
            }
            Ok(false) => {
                if !self.quiet {
                    state.logf("[if: false]");
                }
                if let Some(else_body) = block.else_body {
                    self.execute_range(run, state, else_body);
                }
            }
            Err(e) => {
                state.report(e.with_location(run.filename, block.open + 1));
            }
        }
    }

    fn run_for(&self, run: &Run<'_>, state: &mut State, block: ForBlock) {
        for item in &block.items {
            state.set_var(block.var.as_str(), item.as_str());
            if !self.quiet {
                state.logf(&format!("[for {} = {}]", block.var, item));
            }
            self.execute_range(run, state, block.body.clone());
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
