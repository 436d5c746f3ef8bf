//! Condition operators
//!
//! Conditions are the text between the brackets of `if [ ... ]`. They are
//! evaluated by trying each registered operator token in priority order and
//! splitting at the first literal occurrence of the first token found.
//! There is no expression parser: `a == b != c` compares
//! `a` with `b != c`.

use crate::error::ScriptError;
use crate::state::State;

/// A binary or unary condition operator
pub trait Operator: Send + Sync {
    /// Evaluate with the (trimmed) text left and right of the operator token.
    /// Unary operators ignore `left`.
    fn eval(&self, state: &State, left: &str, right: &str) -> Result<bool, ScriptError>;

    /// Brief description
    fn summary(&self) -> &str;
}

/// Boxed operator
pub type BoxedOperator = Box<dyn Operator>;

/// Return the built-in operators, in evaluation priority order
pub fn default_operators() -> Vec<(String, BoxedOperator)> {
    vec![
        entry("==", StringCompare { equal: true }),
        entry("!=", StringCompare { equal: false }),
        entry("-eq", IntCompare { summary: "integer equality", cmp: |a, b| a == b }),
        entry("-lt", IntCompare { summary: "integer less-than", cmp: |a, b| a < b }),
        entry("-gt", IntCompare { summary: "integer greater-than", cmp: |a, b| a > b }),
        entry("-f", FileTest { dir: false }),
        entry("-d", FileTest { dir: true }),
    ]
}

fn entry(token: &str, op: impl Operator + 'static) -> (String, BoxedOperator) {
    (token.to_string(), Box::new(op))
}

/// Evaluate an already-substituted condition string.
///
/// If none of the operator tokens occur, the condition is true iff the
/// trimmed text is non-empty.
pub fn evaluate(
    operators: &[(String, BoxedOperator)],
    state: &State,
    condition: &str,
) -> Result<bool, ScriptError> {
    for (token, op) in operators {
        if let Some((left, right)) = condition.split_once(token.as_str()) {
            return op.eval(state, left.trim(), right.trim());
        }
    }
    Ok(!condition.trim().is_empty())
}

/// `==` / `!=`
struct StringCompare {
    equal: bool,
}

impl Operator for StringCompare {
    fn eval(&self, _state: &State, left: &str, right: &str) -> Result<bool, ScriptError> {
        Ok((left == right) == self.equal)
    }

    fn summary(&self) -> &str {
        if self.equal { "string equality" } else { "string inequality" }
    }
}

/// `-eq` / `-lt` / `-gt`
struct IntCompare {
    summary: &'static str,
    cmp: fn(i64, i64) -> bool,
}

impl Operator for IntCompare {
    fn eval(&self, _state: &State, left: &str, right: &str) -> Result<bool, ScriptError> {
        Ok((self.cmp)(parse_int(left)?, parse_int(right)?))
    }

    fn summary(&self) -> &str {
        self.summary
    }
}

fn parse_int(s: &str) -> Result<i64, ScriptError> {
    s.parse::<i64>()
        .map_err(|_| ScriptError::eval(format!("integer expression expected: '{}'", s)))
}

/// `-f path` / `-d path`, resolved against the run's working directory
struct FileTest {
    dir: bool,
}

impl Operator for FileTest {
    fn eval(&self, state: &State, _left: &str, right: &str) -> Result<bool, ScriptError> {
        if right.is_empty() {
            return Ok(false);
        }
        let path = state.resolve_path(right);
        Ok(if self.dir { path.is_dir() } else { path.is_file() })
    }

    fn summary(&self) -> &str {
        if self.dir { "true if the path is an existing directory" } else { "true if the path is an existing regular file" }
    }
}
