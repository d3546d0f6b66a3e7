//! RPN stack evaluation
//!
//! Only two primitive comparisons exist per field type, `==` and `<`. The
//! other ordering operators are derived from them:
//!
//! | op   | derived as        |
//! |------|-------------------|
//! | `<=` | `lt \|\| eq`      |
//! | `>`  | `!lt && !eq`      |
//! | `>=` | `!lt`             |

use regex::Regex;

use super::token::{CompareOp, Key, LogicalOp, Token};
use crate::error::EvalError;
use crate::message::Message;

#[derive(Debug, Clone, Copy)]
enum Value<'a> {
    Key(Key),
    Int(i32),
    Str(&'a str),
    Bool(bool),
}

/// Evaluate an RPN token sequence against a message
///
/// `patterns[i]` holds the compiled regex for a `=~`/`!~` at `rpn[i]`. An
/// empty sequence matches everything.
pub fn evaluate(
    rpn: &[Token],
    patterns: &[Option<Regex>],
    msg: &Message,
) -> Result<bool, EvalError> {
    if rpn.is_empty() {
        return Ok(true);
    }

    let mut stack: Vec<Value<'_>> = Vec::with_capacity(rpn.len());

    for (i, token) in rpn.iter().enumerate() {
        let value = match token {
            Token::Key(key) => Value::Key(*key),
            Token::Int(n) => Value::Int(*n),
            Token::Str(s) => Value::Str(s),
            Token::Compare(op) => {
                let (left, right) = pop_pair(&mut stack)?;
                let Value::Key(key) = left else {
                    return Err(EvalError::TypeMismatch);
                };
                let regex = patterns.get(i).and_then(Option::as_ref);
                Value::Bool(compare(*op, key, right, regex, msg)?)
            }
            Token::Logical(op) => {
                let (left, right) = pop_pair(&mut stack)?;
                let (Value::Bool(a), Value::Bool(b)) = (left, right) else {
                    return Err(EvalError::NotBoolean);
                };
                Value::Bool(match op {
                    LogicalOp::And => a && b,
                    LogicalOp::Or => a || b,
                })
            }
            Token::LParen | Token::RParen => return Err(EvalError::Unbalanced),
        };
        stack.push(value);
    }

    match stack.as_slice() {
        [Value::Bool(result)] => Ok(*result),
        _ => Err(EvalError::Unbalanced),
    }
}

fn pop_pair<'a>(stack: &mut Vec<Value<'a>>) -> Result<(Value<'a>, Value<'a>), EvalError> {
    let right = stack.pop().ok_or(EvalError::StackUnderflow)?;
    let left = stack.pop().ok_or(EvalError::StackUnderflow)?;
    Ok((left, right))
}

fn compare(
    op: CompareOp,
    key: Key,
    right: Value<'_>,
    regex: Option<&Regex>,
    msg: &Message,
) -> Result<bool, EvalError> {
    Ok(match op {
        CompareOp::Eq => eq(key, right, msg)?,
        CompareOp::Ne => !eq(key, right, msg)?,
        CompareOp::Lt => lt(key, right, msg)?,
        CompareOp::Le => lt(key, right, msg)? || eq(key, right, msg)?,
        CompareOp::Gt => !lt(key, right, msg)? && !eq(key, right, msg)?,
        CompareOp::Ge => !lt(key, right, msg)?,
        CompareOp::Match => is_match(key, right, regex, msg)?,
        CompareOp::NotMatch => !is_match(key, right, regex, msg)?,
    })
}

fn eq(key: Key, right: Value<'_>, msg: &Message) -> Result<bool, EvalError> {
    match right {
        Value::Int(n) => Ok(int_field(key, msg)? == n),
        Value::Str(s) => Ok(str_field(key, msg)? == s),
        _ => Err(EvalError::TypeMismatch),
    }
}

fn lt(key: Key, right: Value<'_>, msg: &Message) -> Result<bool, EvalError> {
    match right {
        Value::Int(n) => Ok(int_field(key, msg)? < n),
        Value::Str(s) => Ok(str_field(key, msg)? < s),
        _ => Err(EvalError::TypeMismatch),
    }
}

fn is_match(
    key: Key,
    right: Value<'_>,
    regex: Option<&Regex>,
    msg: &Message,
) -> Result<bool, EvalError> {
    match (right, regex) {
        (Value::Str(_), Some(regex)) => Ok(regex.is_match(str_field(key, msg)?)),
        _ => Err(EvalError::TypeMismatch),
    }
}

fn int_field(key: Key, msg: &Message) -> Result<i32, EvalError> {
    match key {
        Key::Pid => Ok(msg.pid),
        Key::Tid => Ok(msg.tid),
        Key::Sec => Ok(msg.sec),
        Key::Nsec => Ok(msg.nsec),
        Key::Level => Ok(msg.level as i32),
        Key::Tag | Key::Text | Key::Pname => Err(EvalError::TypeMismatch),
    }
}

fn str_field(key: Key, msg: &Message) -> Result<&str, EvalError> {
    match key {
        Key::Tag => Ok(&msg.tag),
        Key::Text => Ok(&msg.text),
        Key::Pname => Ok(&msg.pname),
        _ => Err(EvalError::TypeMismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: Key) -> Token {
        Token::Key(k)
    }

    fn cmp(op: CompareOp) -> Token {
        Token::Compare(op)
    }

    fn msg() -> Message {
        Message {
            pid: 5,
            tag: "Tag".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_derived_orderings() {
        let cases = [
            (CompareOp::Lt, [false, false, true]),
            (CompareOp::Le, [false, true, true]),
            (CompareOp::Gt, [true, false, false]),
            (CompareOp::Ge, [true, true, false]),
            (CompareOp::Eq, [false, true, false]),
            (CompareOp::Ne, [true, false, true]),
        ];
        for (op, expected) in cases {
            for (literal, want) in [4, 5, 6].into_iter().zip(expected) {
                let rpn = [key(Key::Pid), Token::Int(literal), cmp(op)];
                assert_eq!(evaluate(&rpn, &[], &msg()), Ok(want), "pid {:?} {}", op, literal);
            }
        }
    }

    #[test]
    fn test_string_ordering_is_lexicographic() {
        let rpn = [key(Key::Tag), Token::Str("Tb".into()), cmp(CompareOp::Lt)];
        assert_eq!(evaluate(&rpn, &[], &msg()), Ok(true));
        let rpn = [key(Key::Tag), Token::Str("Ta".into()), cmp(CompareOp::Gt)];
        assert_eq!(evaluate(&rpn, &[], &msg()), Ok(true));
        let rpn = [key(Key::Tag), Token::Str("Tb".into()), cmp(CompareOp::Ge)];
        assert_eq!(evaluate(&rpn, &[], &msg()), Ok(false));
    }

    #[test]
    fn test_type_errors() {
        let int_vs_str = [key(Key::Pid), Token::Str("1".into()), cmp(CompareOp::Eq)];
        assert_eq!(evaluate(&int_vs_str, &[], &msg()), Err(EvalError::TypeMismatch));

        let literal_left = [Token::Int(1), key(Key::Pid), cmp(CompareOp::Eq)];
        assert_eq!(evaluate(&literal_left, &[], &msg()), Err(EvalError::TypeMismatch));

        let key_vs_key = [key(Key::Tag), key(Key::Tag), cmp(CompareOp::Eq)];
        assert_eq!(evaluate(&key_vs_key, &[], &msg()), Err(EvalError::TypeMismatch));
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(
            evaluate(&[cmp(CompareOp::Eq)], &[], &msg()),
            Err(EvalError::StackUnderflow)
        );
        assert_eq!(
            evaluate(&[key(Key::Pid)], &[], &msg()),
            Err(EvalError::Unbalanced)
        );
        assert_eq!(
            evaluate(
                &[key(Key::Pid), Token::Int(1), Token::Logical(LogicalOp::And)],
                &[],
                &msg()
            ),
            Err(EvalError::NotBoolean)
        );
    }

    #[test]
    fn test_regex_needs_compiled_pattern() {
        let rpn = [key(Key::Tag), Token::Str("^T".into()), cmp(CompareOp::Match)];
        assert_eq!(evaluate(&rpn, &[], &msg()), Err(EvalError::TypeMismatch));

        let patterns = [None, None, Regex::new("^T").ok()];
        assert_eq!(evaluate(&rpn, &patterns, &msg()), Ok(true));
    }

    #[test]
    fn test_empty_matches_all() {
        assert_eq!(evaluate(&[], &[], &msg()), Ok(true));
    }
}
