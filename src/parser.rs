//! Script line parser
//!
//! Classifies raw `.myshell` lines and parses block headers:
//! - blank lines and lines whose first non-space character is `#` are skipped
//! - `name=value` is an assignment
//! - `if [ cond ]` opens a conditional, closed by `fi` (optional `else`)
//! - `for var in [a, b, c]` opens a loop, closed by `done`
//! - anything else is a plain command line forwarded to the host
//!
//! Block openers are recognized before assignments, and an assignment name is
//! a single token: `if [ $a == b ]` and `for x in [k=v]` open blocks, while
//! `echo a=b` is a command.
//!
//! Variable substitution (`$name`, `${name}`) also lives here, along with the
//! quote-aware word splitter used by the host shell.

use std::sync::OnceLock;
use regex::Regex;
use crate::error::ScriptError;

/// A classified script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLine<'a> {
    /// `name=value` (name and value are trimmed, quotes not yet stripped)
    Assign { name: &'a str, value: &'a str },
    /// `if [ ... ]`
    If,
    /// `for var in [ ... ]`
    For,
    /// A bare `else` outside of a conditional scan
    Else,
    /// A bare `fi` outside of a conditional scan
    Fi,
    /// A bare `done` outside of a loop scan
    Done,
    /// Anything else
    Command(&'a str),
}

fn if_opener() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^if\s+\[").unwrap())
}

fn for_opener() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^for\s+\S+\s+in\b").unwrap())
}

fn if_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^if\s+\[(.*?)\]").unwrap())
}

fn for_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^for\s+(\w+)\s+in\s+\[(.*?)\]").unwrap())
}

/// True if the (trimmed) line opens a conditional block.
///
/// The keyword must be followed by whitespace and `[`, so commands such as
/// `ifconfig` are not mistaken for block openers.
pub fn is_if_opener(line: &str) -> bool {
    if_opener().is_match(line)
}

/// True if the (trimmed) line opens a loop block (`for <name> in ...`).
pub fn is_for_opener(line: &str) -> bool {
    for_opener().is_match(line)
}

/// Classify a single raw script line.
///
/// Returns `None` for blank lines and full-line comments.
pub fn classify_line(raw: &str) -> Option<ScriptLine<'_>> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    // Block openers win over assignment so `for x in [a=b]` stays a loop.
    if is_if_opener(line) {
        return Some(ScriptLine::If);
    }
    if is_for_opener(line) {
        return Some(ScriptLine::For);
    }

    if let Some((name, value)) = line.split_once('=') {
        let name = name.trim();
        if !name.is_empty() && !name.contains(char::is_whitespace) {
            return Some(ScriptLine::Assign { name, value: value.trim() });
        }
    }

    Some(match line {
        "else" => ScriptLine::Else,
        "fi" => ScriptLine::Fi,
        "done" => ScriptLine::Done,
        _ => ScriptLine::Command(line),
    })
}

/// Extract the condition text from an `if [ ... ]` header.
pub fn parse_if_header(line: &str) -> Result<&str, ScriptError> {
    let line = line.trim();
    if_header()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .ok_or_else(|| ScriptError::syntax(format!("invalid if statement: {}", line)))
}

/// Extract the loop variable and list items from a `for v in [ ... ]` header.
pub fn parse_for_header(line: &str) -> Result<(String, Vec<String>), ScriptError> {
    let line = line.trim();
    let caps = for_header()
        .captures(line)
        .ok_or_else(|| ScriptError::syntax(format!("invalid for loop: {}", line)))?;
    Ok((caps[1].to_string(), parse_list(&caps[2])))
}

/// Split a list literal body (`a, 'b', "c"`) into items.
///
/// Items are trimmed and stripped of surrounding quotes. An empty body
/// yields no items.
pub fn parse_list(body: &str) -> Vec<String> {
    if body.trim().is_empty() {
        return Vec::new();
    }
    body.split(',')
        .map(|item| item.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .collect()
}

/// Strip one pair of matching surrounding quotes from an assignment value.
pub fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' || first == b'\'') && first == last {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// If `value` has the exact form `$( command )`, return the command.
pub fn command_substitution(value: &str) -> Option<&str> {
    value
        .strip_prefix("$(")
        .and_then(|rest| rest.strip_suffix(')'))
        .map(str::trim)
}

/// Substitute variables in a string.
/// Supports `$name` and `${name}` syntax.
///
/// `$name` takes the longest run of ASCII alphanumerics and `_`, so `$xy`
/// never resolves `x`. Names the lookup does not know are left as written.
pub fn expand_vars(s: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        if chars.peek() == Some(&'{') {
            chars.next();
            let mut name = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                name.push(c);
            }
            match lookup(&name) {
                Some(val) if closed => result.push_str(&val),
                _ => {
                    result.push_str("${");
                    result.push_str(&name);
                    if closed {
                        result.push('}');
                    }
                }
            }
            continue;
        }

        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                chars.next();
            } else {
                break;
            }
        }

        if name.is_empty() {
            result.push('$');
        } else if let Some(val) = lookup(&name) {
            result.push_str(&val);
        } else {
            result.push('$');
            result.push_str(&name);
        }
    }

    result
}

/// A word of a command line, after quote removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// The text content with quotes removed
    pub text: String,
    /// If true, some part of this word was quoted
    pub quoted: bool,
}

/// Split a command line into words.
///
/// - whitespace separates words
/// - `'...'` is literal
/// - `"..."` allows `\"` and `\\` escapes
/// - `\` outside quotes escapes the next character
///
/// Unterminated quotes are an error.
pub fn split_words(line: &str) -> Result<Vec<Word>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(Word { text: std::mem::take(&mut current), quoted });
                    in_word = false;
                    quoted = false;
                }
            }
            '\'' => {
                in_word = true;
                quoted = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err("unterminated quoted argument".into()),
                    }
                }
            }
            '"' => {
                in_word = true;
                quoted = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err("unterminated quoted argument".into()),
                        },
                        Some(c) => current.push(c),
                        None => return Err("unterminated quoted argument".into()),
                    }
                }
            }
            '\\' => {
                in_word = true;
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(Word { text: current, quoted });
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_xy(name: &str) -> Option<String> {
        match name {
            "x" => Some("1".to_string()),
            "xy" => Some("12".to_string()),
            _ => None,
        }
    }

    fn texts(words: &[Word]) -> Vec<&str> {
        words.iter().map(|w| w.text.as_str()).collect()
    }

    #[test]
    fn test_classify_blank_and_comment() {
        assert_eq!(classify_line(""), None);
        assert_eq!(classify_line("    "), None);
        assert_eq!(classify_line("# comment"), None);
        assert_eq!(classify_line("   # indented comment"), None);
    }

    #[test]
    fn test_classify_assignment() {
        assert_eq!(
            classify_line("name = \"world\""),
            Some(ScriptLine::Assign { name: "name", value: "\"world\"" })
        );
        assert_eq!(
            classify_line("x=a=b"),
            Some(ScriptLine::Assign { name: "x", value: "a=b" })
        );
    }

    #[test]
    fn test_classify_command_with_equals_in_args() {
        assert_eq!(classify_line("echo a=b"), Some(ScriptLine::Command("echo a=b")));
    }

    #[test]
    fn test_classify_blocks() {
        assert_eq!(classify_line("if [ $a == b ]"), Some(ScriptLine::If));
        assert_eq!(classify_line("  for i in [1, 2]"), Some(ScriptLine::For));
        assert_eq!(classify_line("for x in [a=b]"), Some(ScriptLine::For));
        assert_eq!(classify_line("else"), Some(ScriptLine::Else));
        assert_eq!(classify_line(" fi "), Some(ScriptLine::Fi));
        assert_eq!(classify_line("done"), Some(ScriptLine::Done));
    }

    #[test]
    fn test_classify_keyword_prefixed_commands() {
        assert_eq!(classify_line("ifconfig"), Some(ScriptLine::Command("ifconfig")));
        assert_eq!(classify_line("ifconfig eth0 up"), Some(ScriptLine::Command("ifconfig eth0 up")));
        assert_eq!(classify_line("format disk"), Some(ScriptLine::Command("format disk")));
        assert_eq!(classify_line("fi2"), Some(ScriptLine::Command("fi2")));
    }

    #[test]
    fn test_parse_if_header() {
        assert_eq!(parse_if_header("if [ $x == 1 ]").unwrap(), "$x == 1");
        assert_eq!(parse_if_header("if [-d /tmp]").unwrap(), "-d /tmp");
        let err = parse_if_header("if [ unterminated").unwrap_err();
        assert!(err.message.contains("invalid if statement"));
    }

    #[test]
    fn test_parse_for_header() {
        let (var, items) = parse_for_header("for fruit in ['apple', \"pear\", plum]").unwrap();
        assert_eq!(var, "fruit");
        assert_eq!(items, vec!["apple", "pear", "plum"]);
        assert!(parse_for_header("for x in a b c").is_err());
    }

    #[test]
    fn test_parse_list_empty() {
        assert!(parse_list("").is_empty());
        assert!(parse_list("  ").is_empty());
        assert_eq!(parse_list("1,2,3"), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"hello world\""), "hello world");
        assert_eq!(unquote("'x'"), "x");
        assert_eq!(unquote("'x\""), "'x\"");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("plain"), "plain");
    }

    #[test]
    fn test_command_substitution() {
        assert_eq!(command_substitution("$( pwd )"), Some("pwd"));
        assert_eq!(command_substitution("$(echo hi)"), Some("echo hi"));
        assert_eq!(command_substitution("x $(pwd)"), None);
        assert_eq!(command_substitution("$x"), None);
    }

    #[test]
    fn test_expand_vars_no_partial_token() {
        assert_eq!(expand_vars("$x $xy $xyz", &lookup_xy), "1 12 $xyz");
    }

    #[test]
    fn test_expand_vars_braces() {
        assert_eq!(expand_vars("${x}y", &lookup_xy), "1y");
        assert_eq!(expand_vars("${nope}", &lookup_xy), "${nope}");
        assert_eq!(expand_vars("${x", &lookup_xy), "${x");
    }

    #[test]
    fn test_expand_vars_leaves_command_substitution() {
        assert_eq!(expand_vars("echo $(pwd) $", &lookup_xy), "echo $(pwd) $");
    }

    #[test]
    fn test_split_words_quotes() {
        let words = split_words(r#"echo 'a b' "c \"d\"" e\ f"#).unwrap();
        assert_eq!(texts(&words), vec!["echo", "a b", "c \"d\"", "e f"]);
        assert!(!words[0].quoted);
        assert!(words[1].quoted);
    }

    #[test]
    fn test_split_words_quoted_redirect_marker() {
        let words = split_words("echo '>' > out.txt").unwrap();
        assert_eq!(texts(&words), vec!["echo", ">", ">", "out.txt"]);
        assert!(words[1].quoted);
        assert!(!words[2].quoted);
    }

    #[test]
    fn test_split_words_unterminated() {
        assert!(split_words("echo 'oops").is_err());
        assert!(split_words("echo \"oops").is_err());
    }
}
