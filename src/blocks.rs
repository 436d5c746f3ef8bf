//! Block matching
//!
//! Finds the extent of `if … [else …] fi` and `for … done` blocks by scanning
//! raw lines forward with a nesting counter. Nothing is parsed ahead of time:
//! a block is recomputed every time its opening line is reached.

use std::ops::Range;
use crate::error::ScriptError;
use crate::parser::{is_for_opener, is_if_opener, parse_for_header, parse_if_header};

/// A matched conditional block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfBlock {
    /// Index of the `if` line
    pub open: usize,
    /// Condition text between the brackets (not yet substituted)
    pub condition: String,
    /// Lines run when the condition holds
    pub body: Range<usize>,
    /// Lines between `else` and `fi`, if there is an `else`
    pub else_body: Option<Range<usize>>,
    /// Index just past the matching `fi`
    pub end: usize,
}

/// A matched loop block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForBlock {
    /// Index of the `for` line
    pub open: usize,
    /// Loop variable name
    pub var: String,
    /// List items, in iteration order
    pub items: Vec<String>,
    /// Loop body lines
    pub body: Range<usize>,
    /// Index just past the matching `done`
    pub end: usize,
}

/// Match the conditional block opened at `lines[open]`.
///
/// Scanning stops at `limit` (exclusive); a block whose `fi` lies at or
/// beyond the limit is malformed. Nested conditionals increment the counter,
/// `fi` decrements it, and `else` only counts at depth 1.
pub fn match_if(lines: &[&str], open: usize, limit: usize) -> Result<IfBlock, ScriptError> {
    let condition = parse_if_header(lines[open])?.to_string();
    let limit = limit.min(lines.len());

    let mut depth = 1usize;
    let mut else_at: Option<usize> = None;

    for (i, raw) in lines.iter().enumerate().take(limit).skip(open + 1) {
        let line = raw.trim();
        if is_if_opener(line) {
            depth += 1;
        } else if line == "else" && depth == 1 && else_at.is_none() {
            else_at = Some(i);
        } else if line == "fi" {
            depth -= 1;
            if depth == 0 {
                let body_end = else_at.unwrap_or(i);
                return Ok(IfBlock {
                    open,
                    condition,
                    body: open + 1..body_end,
                    else_body: else_at.map(|e| e + 1..i),
                    end: i + 1,
                });
            }
        }
    }

    Err(ScriptError::syntax("missing 'fi'"))
}

/// Match the loop block opened at `lines[open]`.
///
/// Only `for`/`done` pairs move the counter; conditionals inside the body do
/// not, but a `for` line anywhere in the body (even inside an `if`) does.
pub fn match_for(lines: &[&str], open: usize, limit: usize) -> Result<ForBlock, ScriptError> {
    let (var, items) = parse_for_header(lines[open])?;
    let limit = limit.min(lines.len());

    let mut depth = 1usize;

    for (i, raw) in lines.iter().enumerate().take(limit).skip(open + 1) {
        let line = raw.trim();
        if is_for_opener(line) {
            depth += 1;
        } else if line == "done" {
            depth -= 1;
            if depth == 0 {
                return Ok(ForBlock {
                    open,
                    var,
                    items,
                    body: open + 1..i,
                    end: i + 1,
                });
            }
        }
    }

    Err(ScriptError::syntax("missing 'done'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn lines(script: &str) -> Vec<&str> {
        script.lines().collect()
    }

    #[test]
    fn test_if_without_else() {
        let l = lines("if [ a == a ]\necho yes\nfi\necho after");
        let block = match_if(&l, 0, l.len()).unwrap();
        assert_eq!(block.condition, "a == a");
        assert_eq!(block.body, 1..2);
        assert_eq!(block.else_body, None);
        assert_eq!(block.end, 3);
    }

    #[test]
    fn test_if_with_else() {
        let l = lines("if [ 5 -gt 3 ]\necho yes\nelse\necho no\nfi");
        let block = match_if(&l, 0, l.len()).unwrap();
        assert_eq!(block.body, 1..2);
        assert_eq!(block.else_body, Some(3..4));
        assert_eq!(block.end, 5);
    }

    #[test]
    fn test_nested_if_resolves_nearest_fi() {
        let l = lines("if [ 1 ]\n  if [ 2 ]\n  else\n  echo inner-else\n  fi\nelse\necho outer-else\nfi\necho tail");
        let outer = match_if(&l, 0, l.len()).unwrap();
        assert_eq!(outer.body, 1..5);
        assert_eq!(outer.else_body, Some(6..7));
        assert_eq!(outer.end, 8);

        let inner = match_if(&l, 1, outer.body.end).unwrap();
        assert_eq!(inner.body, 2..2);
        assert_eq!(inner.else_body, Some(3..4));
        assert_eq!(inner.end, 5);
    }

    #[test]
    fn test_only_first_else_counts() {
        let l = lines("if [ x ]\na\nelse\nb\nelse\nc\nfi");
        let block = match_if(&l, 0, l.len()).unwrap();
        assert_eq!(block.else_body, Some(3..6));
    }

    #[test]
    fn test_missing_fi() {
        let l = lines("if [ x ]\necho a\nif [ y ]\nfi");
        let err = match_if(&l, 0, l.len()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::SyntaxError);
        assert!(err.message.contains("missing 'fi'"));
    }

    #[test]
    fn test_fi_beyond_limit_is_missing() {
        let l = lines("for i in [1]\nif [ x ]\ndone\nfi");
        assert!(match_if(&l, 1, 3).is_err());
    }

    #[test]
    fn test_malformed_if_header() {
        let l = lines("if [ x\nfi");
        let err = match_if(&l, 0, l.len()).unwrap_err();
        assert!(err.message.contains("invalid if statement"));
    }

    #[test]
    fn test_ifconfig_does_not_nest() {
        let l = lines("if [ x ]\nifconfig\nfi");
        let block = match_if(&l, 0, l.len()).unwrap();
        assert_eq!(block.end, 3);
    }

    #[test]
    fn test_for_block() {
        let l = lines("for i in [1, 2, 3]\necho $i\ndone\necho end");
        let block = match_for(&l, 0, l.len()).unwrap();
        assert_eq!(block.var, "i");
        assert_eq!(block.items, vec!["1", "2", "3"]);
        assert_eq!(block.body, 1..2);
        assert_eq!(block.end, 3);
    }

    #[test]
    fn test_nested_for() {
        let l = lines("for a in [x]\nfor b in [y]\ndone\necho $a\ndone");
        let block = match_for(&l, 0, l.len()).unwrap();
        assert_eq!(block.body, 1..4);
        assert_eq!(block.end, 5);
    }

    #[test]
    fn test_for_ignores_if_nesting() {
        let l = lines("for a in [x]\nif [ $a ]\necho hi\nfi\ndone");
        let block = match_for(&l, 0, l.len()).unwrap();
        assert_eq!(block.end, 5);
    }

    #[test]
    fn test_missing_done() {
        let l = lines("for a in [x]\necho $a");
        let err = match_for(&l, 0, l.len()).unwrap_err();
        assert!(err.message.contains("missing 'done'"));
    }

    #[test]
    fn test_malformed_for_header() {
        let l = lines("for a in x y\ndone");
        let err = match_for(&l, 0, l.len()).unwrap_err();
        assert!(err.message.contains("invalid for loop"));
    }
}
