//! Compiled filter

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use super::eval::evaluate;
use super::lexer::tokenize;
use super::parser::to_rpn;
use super::token::Token;
use crate::error::{EvalError, FilterError};
use crate::message::Message;

/// A boolean predicate over messages, compiled once
///
/// ```
/// use logcat_rs::{Filter, Message};
///
/// let filter = Filter::new(r#"pid == 1 && tag =~ "^Package""#).unwrap();
/// let msg = Message::compose(1, 2, 0, 0, 4, "PackageManager", "hello");
/// assert!(filter.matches(&msg));
/// ```
#[derive(Debug, Clone)]
pub struct Filter {
    source: String,
    rpn: Vec<Token>,
    /// Regexes for `=~`/`!~`, indexed like `rpn`
    patterns: Vec<Option<Regex>>,
}

impl Filter {
    /// Compile a filter expression
    ///
    /// Besides lexical and syntax errors, expressions that cannot be
    /// evaluated (comparing two literals, dangling operands, a string
    /// against an integer field) are rejected here. The compiled filter is
    /// evaluated once against an all-zero message and any evaluation error
    /// fails creation. A result of `false` is fine.
    pub fn new(expr: &str) -> Result<Self, FilterError> {
        match Self::compile(expr) {
            Ok(filter) => {
                tracing::debug!(filter = %expr, rpn_len = filter.rpn.len(), "Filter compiled");
                Ok(filter)
            }
            Err(e) => {
                tracing::debug!(filter = %expr, error = %e, "Filter rejected");
                Err(e)
            }
        }
    }

    fn compile(expr: &str) -> Result<Self, FilterError> {
        let rpn = to_rpn(tokenize(expr)?)?;
        let patterns = compile_patterns(&rpn)?;

        let filter = Self {
            source: expr.to_string(),
            rpn,
            patterns,
        };

        filter
            .evaluate(&Message::default())
            .map_err(FilterError::Semantic)?;

        Ok(filter)
    }

    /// Filter that matches every message
    pub fn all() -> Self {
        Self {
            source: String::new(),
            rpn: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// Whether `msg` satisfies the filter
    pub fn matches(&self, msg: &Message) -> bool {
        // Creation-time evaluation already covered every type error
        self.evaluate(msg).unwrap_or(false)
    }

    /// Evaluate with errors reported
    pub fn evaluate(&self, msg: &Message) -> Result<bool, EvalError> {
        evaluate(&self.rpn, &self.patterns, msg)
    }

    /// Whether this filter accepts everything
    pub fn is_empty(&self) -> bool {
        self.rpn.is_empty()
    }

    /// Expression as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Compiled RPN sequence
    pub fn rpn(&self) -> &[Token] {
        &self.rpn
    }
}

/// Compile the literal operand of every regex operator
fn compile_patterns(rpn: &[Token]) -> Result<Vec<Option<Regex>>, FilterError> {
    let mut patterns = vec![None; rpn.len()];

    for (i, token) in rpn.iter().enumerate() {
        let Token::Compare(op) = token else { continue };
        if !op.is_regex() || i == 0 {
            continue;
        }
        if let Token::Str(pattern) = &rpn[i - 1] {
            let regex = Regex::new(pattern).map_err(|e| FilterError::InvalidRegex {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
            patterns[i] = Some(regex);
        }
    }

    Ok(patterns)
}

impl Default for Filter {
    fn default() -> Self {
        Self::all()
    }
}

impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Message {
        Message {
            pid: 1,
            tid: 2,
            sec: 3,
            nsec: 4,
            level: 4,
            tag: "PackageManagerService".to_string(),
            text: "This is the text.".to_string(),
            ..Default::default()
        }
    }

    fn matches(expr: &str) -> bool {
        Filter::new(expr).unwrap().matches(&sample())
    }

    #[test]
    fn test_rpn_order() {
        let render = |expr: &str| {
            Filter::new(expr)
                .unwrap()
                .rpn()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        };
        assert_eq!(
            render("pid == 1 && tid != 2 || sec < 3"),
            "pid,1,==,tid,2,!=,&&,sec,3,<,||"
        );
        assert_eq!(
            render("(pid == 1 || tid != 2) && sec < 3"),
            "pid,1,==,tid,2,!=,||,sec,3,<,&&"
        );
    }

    #[test]
    fn test_match() {
        assert!(matches("pid == 1"));
        assert!(!matches("pid == 10"));
        assert!(matches(r#"pid <= 1 && tag == "PackageManagerService""#));
        assert!(!matches(r#"pid == 0 || tag == "x""#));
        assert!(matches("level >= 4 && nsec > 3 && sec != 4"));
        assert!(matches(r#"text != "" && (tid == 1 || tid == 2)"#));
    }

    #[test]
    fn test_regex_operators() {
        assert!(matches(r#"tag =~ "^Package.*Service$""#));
        assert!(!matches(r#"tag !~ "Manager""#));
        assert!(matches(r#"text =~ "\\.$""#));
        assert!(matches(r#"pname =~ "^$""#));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = Filter::new("  ").unwrap();
        assert!(filter.is_empty());
        assert!(filter.matches(&sample()));
        assert!(Filter::all().matches(&Message::default()));
    }

    #[test]
    fn test_malformed_filters_rejected() {
        assert_eq!(
            Filter::new("tag tag tag tag").unwrap_err(),
            FilterError::Semantic(EvalError::Unbalanced)
        );
        assert_eq!(
            Filter::new("1234 == pid").unwrap_err(),
            FilterError::Semantic(EvalError::TypeMismatch)
        );
        assert_eq!(
            Filter::new("(pid == 1 || tid != 2 && sec < 3").unwrap_err(),
            FilterError::MismatchedParen
        );
        assert!(Filter::new("pid").is_err());
        assert!(Filter::new("tag == tag").is_err());
        assert!(Filter::new(r#"pid == "1""#).is_err());
        assert!(Filter::new("pid =~ 1").is_err());
        assert!(Filter::new(r#"pid =~ "1""#).is_err());
        assert!(Filter::new("pid == 1 &&").is_err());
        assert!(Filter::new("FOO == 1").is_err());
    }

    #[test]
    fn test_empty_parentheses_rejected() {
        assert_eq!(Filter::new("()").unwrap_err(), FilterError::EmptyGroup);
    }

    #[test]
    fn test_usage_examples_compile() {
        for expr in [
            "level >= 5",
            r#"tag =~ "dummy""#,
            "pid == 42",
            r#"tag == "ActivityManager" && pid != 1"#,
            r#"text =~ "^Start.*" || pname !~ "system""#,
        ] {
            assert!(Filter::new(expr).is_ok(), "{} should compile", expr);
        }
        assert_eq!(
            Filter::new(r#"tag ~ "dummy""#).unwrap_err(),
            FilterError::Lex { offset: 5 }
        );
    }

    #[test]
    fn test_invalid_regex() {
        assert!(matches!(
            Filter::new(r#"tag =~ "(unclosed""#),
            Err(FilterError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_false_on_dummy_message_is_accepted() {
        // Never true for the all-zero message, still a valid filter
        let filter = Filter::new("pid == 1234").unwrap();
        assert!(!filter.matches(&Message::default()));
    }

    #[test]
    fn test_from_str_and_display() {
        let filter: Filter = "tid > 1".parse().unwrap();
        assert_eq!(filter.to_string(), "tid > 1");
        assert!(filter.matches(&sample()));
    }
}
