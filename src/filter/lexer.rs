//! Filter tokenizer
//!
//! A finite state machine over the input bytes:
//!
//! ```text
//!            alpha            digit           '"'
//!   Begin ─────────► Key   ──────────► Int    ─────► String ◄──┐
//!     ▲  ◄───────────┘ ◄──────────────┘               │  '\'   │ '"' or '\'
//!     │   (any other byte, re-read in Begin)          ▼        │
//!     │                                          EscapedChar ──┘
//!     └──── '"' closes String
//! ```
//!
//! Operators are matched directly in `Begin`, longest first. Every state
//! emits at most one token on exit and nothing is ever backtracked. Error
//! offsets are 1-based positions in the input.

use super::token::{CompareOp, Key, LogicalOp, Token};
use crate::error::FilterError;

/// Operators in match order; two-byte forms come first
const OPERATORS: &[(&str, Token)] = &[
    ("==", Token::Compare(CompareOp::Eq)),
    ("!=", Token::Compare(CompareOp::Ne)),
    ("<=", Token::Compare(CompareOp::Le)),
    (">=", Token::Compare(CompareOp::Ge)),
    ("=~", Token::Compare(CompareOp::Match)),
    ("!~", Token::Compare(CompareOp::NotMatch)),
    ("&&", Token::Logical(LogicalOp::And)),
    ("||", Token::Logical(LogicalOp::Or)),
    ("<", Token::Compare(CompareOp::Lt)),
    (">", Token::Compare(CompareOp::Gt)),
    ("(", Token::LParen),
    (")", Token::RParen),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Begin,
    Key,
    Int,
    String,
    EscapedChar,
    End,
}

/// Input classes the state machine distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Whitespace,
    Alpha,
    Digit,
    Quote,
    Escape,
    End,
    Other,
}

fn classify(byte: Option<u8>) -> Class {
    match byte {
        None => Class::End,
        Some(b'"') => Class::Quote,
        Some(b'\\') => Class::Escape,
        Some(b) if b.is_ascii_digit() => Class::Digit,
        Some(b) if b.is_ascii_alphabetic() => Class::Alpha,
        Some(b) if b.is_ascii_whitespace() => Class::Whitespace,
        Some(_) => Class::Other,
    }
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    state: State,
    /// Position where the current token started
    start: usize,
    chars: Vec<u8>,
    tokens: Vec<Token>,
}

/// Split a filter expression into tokens
pub fn tokenize(input: &str) -> Result<Vec<Token>, FilterError> {
    let mut lexer = Lexer {
        input: input.as_bytes(),
        pos: 0,
        state: State::Begin,
        start: 0,
        chars: Vec::new(),
        tokens: Vec::new(),
    };

    while lexer.state != State::End {
        let class = classify(lexer.input.get(lexer.pos).copied());
        lexer.step(class)?;
    }

    Ok(lexer.tokens)
}

impl Lexer<'_> {
    fn step(&mut self, class: Class) -> Result<(), FilterError> {
        match self.state {
            State::Begin => self.step_begin(class),
            State::Key => self.step_key(class),
            State::Int => self.step_int(class),
            State::String => self.step_string(class),
            State::EscapedChar => self.step_escaped_char(class),
            State::End => Ok(()),
        }
    }

    fn step_begin(&mut self, class: Class) -> Result<(), FilterError> {
        match class {
            Class::Whitespace => self.pos += 1,
            Class::Alpha => self.begin_token(State::Key, true),
            Class::Digit => self.begin_token(State::Int, true),
            Class::Quote => self.begin_token(State::String, false),
            Class::End => self.state = State::End,
            Class::Escape | Class::Other => {
                let rest = &self.input[self.pos..];
                let (text, token) = OPERATORS
                    .iter()
                    .find(|(text, _)| rest.starts_with(text.as_bytes()))
                    .ok_or(FilterError::Lex {
                        offset: self.pos + 1,
                    })?;
                self.tokens.push(token.clone());
                self.pos += text.len();
            }
        }
        Ok(())
    }

    fn step_key(&mut self, class: Class) -> Result<(), FilterError> {
        if class == Class::Alpha {
            self.push();
            return Ok(());
        }

        let ident = String::from_utf8_lossy(&self.chars).into_owned();
        let key = Key::from_ident(&ident).ok_or(FilterError::UnknownKey {
            offset: self.start + 1,
            key: ident,
        })?;
        self.emit(Token::Key(key));
        Ok(())
    }

    fn step_int(&mut self, class: Class) -> Result<(), FilterError> {
        if class == Class::Digit {
            self.push();
            return Ok(());
        }

        let value = std::str::from_utf8(&self.chars)
            .ok()
            .and_then(|digits| digits.parse::<i32>().ok())
            .ok_or(FilterError::IntegerOverflow {
                offset: self.start + 1,
            })?;
        self.emit(Token::Int(value));
        Ok(())
    }

    fn step_string(&mut self, class: Class) -> Result<(), FilterError> {
        match class {
            Class::Quote => {
                self.pos += 1;
                let value = String::from_utf8_lossy(&self.chars).into_owned();
                self.emit(Token::Str(value));
            }
            Class::Escape => {
                self.pos += 1;
                self.state = State::EscapedChar;
            }
            Class::End => {
                return Err(FilterError::UnterminatedString {
                    offset: self.start + 1,
                })
            }
            _ => self.push(),
        }
        Ok(())
    }

    fn step_escaped_char(&mut self, class: Class) -> Result<(), FilterError> {
        match class {
            Class::Quote | Class::Escape => {
                self.push();
                self.state = State::String;
                Ok(())
            }
            Class::End => Err(FilterError::UnterminatedString {
                offset: self.start + 1,
            }),
            _ => Err(FilterError::BadEscape {
                offset: self.pos + 1,
            }),
        }
    }

    fn begin_token(&mut self, state: State, keep_first: bool) {
        self.start = self.pos;
        if keep_first {
            self.chars.push(self.input[self.pos]);
        }
        self.pos += 1;
        self.state = state;
    }

    fn push(&mut self) {
        self.chars.push(self.input[self.pos]);
        self.pos += 1;
    }

    /// Finish the current token; the byte under `pos` is re-read in `Begin`
    fn emit(&mut self, token: Token) {
        self.tokens.push(token);
        self.chars.clear();
        self.state = State::Begin;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(input: &str) -> Vec<String> {
        tokenize(input)
            .unwrap()
            .iter()
            .map(|token| token.to_string())
            .collect()
    }

    #[test]
    fn test_simple_expression() {
        assert_eq!(
            tokenize("pid == 1234").unwrap(),
            vec![
                Token::Key(Key::Pid),
                Token::Compare(CompareOp::Eq),
                Token::Int(1234)
            ]
        );
    }

    #[test]
    fn test_no_whitespace_needed() {
        assert_eq!(
            render("(pid==1||tag!=\"x\")&&level>=4"),
            vec!["(", "pid", "==", "1", "||", "tag", "!=", "\"x\"", ")", "&&", "level", ">=", "4"]
        );
    }

    #[test]
    fn test_key_followed_by_digits() {
        assert_eq!(
            tokenize("pid123").unwrap(),
            vec![Token::Key(Key::Pid), Token::Int(123)]
        );
        assert_eq!(
            tokenize("123pid").unwrap(),
            vec![Token::Int(123), Token::Key(Key::Pid)]
        );
    }

    #[test]
    fn test_all_operators() {
        assert_eq!(
            render("< <= > >= == != =~ !~ && || ( )"),
            vec!["<", "<=", ">", ">=", "==", "!=", "=~", "!~", "&&", "||", "(", ")"]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokenize(r#"text == "say \"hi\" \\o/""#).unwrap()[2],
            Token::Str(r#"say "hi" \o/"#.to_string())
        );
        assert_eq!(
            tokenize(r#"tag == "ünïcode (ok)""#).unwrap()[2],
            Token::Str("ünïcode (ok)".to_string())
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   \t ").unwrap().is_empty());
    }

    #[test]
    fn test_error_offsets() {
        assert_eq!(
            tokenize("FOO"),
            Err(FilterError::UnknownKey {
                offset: 1,
                key: "FOO".to_string()
            })
        );
        assert_eq!(
            tokenize("pid BAR"),
            Err(FilterError::UnknownKey {
                offset: 5,
                key: "BAR".to_string()
            })
        );
        assert_eq!(tokenize("pid=1234"), Err(FilterError::Lex { offset: 4 }));
        assert_eq!(tokenize("pid == 1 & tid"), Err(FilterError::Lex { offset: 10 }));
        assert_eq!(tokenize("pid == -1"), Err(FilterError::Lex { offset: 8 }));
    }

    #[test]
    fn test_string_errors() {
        assert_eq!(
            tokenize(r#"tag == "abc"#),
            Err(FilterError::UnterminatedString { offset: 8 })
        );
        assert_eq!(
            tokenize(r#"tag == "a\nb""#),
            Err(FilterError::BadEscape { offset: 11 })
        );
        assert_eq!(
            tokenize(r#"tag == "a\"#),
            Err(FilterError::UnterminatedString { offset: 8 })
        );
    }

    #[test]
    fn test_integer_overflow() {
        assert_eq!(tokenize("pid == 2147483647").unwrap()[2], Token::Int(i32::MAX));
        assert_eq!(
            tokenize("pid == 2147483648"),
            Err(FilterError::IntegerOverflow { offset: 8 })
        );
    }
}
