//! Infix to RPN conversion (shunting-yard)

use super::token::Token;
use crate::error::FilterError;

/// Reorder infix tokens into Reverse Polish Notation
///
/// Operators of equal precedence associate to the left. Parentheses only
/// group; they never appear in the output.
pub fn to_rpn(tokens: Vec<Token>) -> Result<Vec<Token>, FilterError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token> = Vec::new();
    let mut after_lparen = false;

    for token in tokens {
        if token == Token::RParen && after_lparen {
            return Err(FilterError::EmptyGroup);
        }
        after_lparen = token == Token::LParen;

        match token {
            Token::LParen => stack.push(token),
            Token::RParen => loop {
                match stack.pop() {
                    Some(Token::LParen) => break,
                    Some(op) => output.push(op),
                    None => return Err(FilterError::MismatchedParen),
                }
            },
            op if op.is_operator() => {
                let precedence = op.precedence();
                while let Some(top) = stack.last() {
                    if top.is_operator() && precedence <= top.precedence() {
                        if let Some(top) = stack.pop() {
                            output.push(top);
                        }
                    } else {
                        break;
                    }
                }
                stack.push(op);
            }
            operand => output.push(operand),
        }
    }

    while let Some(top) = stack.pop() {
        if top == Token::LParen {
            return Err(FilterError::MismatchedParen);
        }
        output.push(top);
    }

    Ok(output)
}
