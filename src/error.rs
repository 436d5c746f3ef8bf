//! Script errors

use std::fmt;

/// The kind of script error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed `if`/`for` header, missing `fi`/`done`, stray keyword
    SyntaxError,
    /// Condition could not be evaluated (e.g. non-integer operand)
    EvalError,
    /// A forwarded command failed at the host level
    ExecError,
    /// Script file missing or unreadable (fatal)
    FileError,
    /// Invalid usage of a builtin command
    UsageError,
    /// Command not found in the registry or on PATH
    UnknownCommand,
    /// IO error
    Io,
}

impl ErrorKind {
    /// Short label used in diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::SyntaxError => "syntax error",
            ErrorKind::EvalError => "evaluation error",
            ErrorKind::ExecError => "execution error",
            ErrorKind::FileError => "file error",
            ErrorKind::UsageError => "usage error",
            ErrorKind::UnknownCommand => "unknown command",
            ErrorKind::Io => "io error",
        }
    }
}

/// A script error with file/line context
#[derive(Debug, Clone)]
pub struct ScriptError {
    pub kind: ErrorKind,
    pub message: String,
    pub file: Option<String>,
    /// 1-based line number
    pub line: Option<usize>,
    pub command: Option<String>,
}

impl ScriptError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file: None,
            line: None,
            command: None,
        }
    }

    pub fn with_location(mut self, file: impl Into<String>, line: usize) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    pub fn with_command(mut self, cmd: impl Into<String>) -> Self {
        self.command = Some(cmd.into());
        self
    }

    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxError, msg)
    }

    pub fn eval(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::EvalError, msg)
    }

    pub fn exec(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExecError, msg)
    }

    pub fn usage(cmd: &str, expected: &str) -> Self {
        Self::new(ErrorKind::UsageError, format!("usage: {} {}", cmd, expected))
    }

    pub fn is_fatal(&self) -> bool {
        self.kind == ErrorKind::FileError
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}:", file)?;
        }
        if let Some(line) = self.line {
            write!(f, "{}:", line)?;
        }
        if self.file.is_some() || self.line.is_some() {
            write!(f, " ")?;
        }
        write!(f, "{}: ", self.kind.label())?;
        if let Some(ref cmd) = self.command {
            write!(f, "{}: ", cmd)?;
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ScriptError {}

impl From<std::io::Error> for ScriptError {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, e.to_string())
    }
}
