//! Filter tokens

use std::fmt;

/// Message field a filter can refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Pid,
    Tid,
    Sec,
    Nsec,
    Level,
    Tag,
    Text,
    Pname,
}

impl Key {
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "pid" => Some(Key::Pid),
            "tid" => Some(Key::Tid),
            "sec" => Some(Key::Sec),
            "nsec" => Some(Key::Nsec),
            "level" => Some(Key::Level),
            "tag" => Some(Key::Tag),
            "text" => Some(Key::Text),
            "pname" => Some(Key::Pname),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Key::Pid => "pid",
            Key::Tid => "tid",
            Key::Sec => "sec",
            Key::Nsec => "nsec",
            Key::Level => "level",
            Key::Tag => "tag",
            Key::Text => "text",
            Key::Pname => "pname",
        }
    }

    /// Whether the field compares against integer literals
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Key::Pid | Key::Tid | Key::Sec | Key::Nsec | Key::Level
        )
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `=~`, regular expression match
    Match,
    /// `!~`, regular expression mismatch
    NotMatch,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Match => "=~",
            CompareOp::NotMatch => "!~",
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, CompareOp::Match | CompareOp::NotMatch)
    }
}

/// Logical connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

/// One lexical token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Key(Key),
    Int(i32),
    Str(String),
    Compare(CompareOp),
    Logical(LogicalOp),
    LParen,
    RParen,
}

impl Token {
    /// Binding strength of an operator; `None` for operands and parentheses
    ///
    /// `||` binds loosest, comparisons tightest.
    pub fn precedence(&self) -> Option<u8> {
        match self {
            Token::Logical(LogicalOp::Or) => Some(1),
            Token::Logical(LogicalOp::And) => Some(2),
            Token::Compare(_) => Some(3),
            _ => None,
        }
    }

    pub fn is_operator(&self) -> bool {
        self.precedence().is_some()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Key(key) => f.write_str(key.as_str()),
            Token::Int(value) => write!(f, "{}", value),
            Token::Str(value) => {
                f.write_str("\"")?;
                for ch in value.chars() {
                    if ch == '"' || ch == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", ch)?;
                }
                f.write_str("\"")
            }
            Token::Compare(op) => f.write_str(op.as_str()),
            Token::Logical(op) => f.write_str(op.as_str()),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
        }
    }
}
