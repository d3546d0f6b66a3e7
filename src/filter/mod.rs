//! Filter expressions
//!
//! A small predicate language over message fields:
//!
//! ```text
//! pid == 1234 && (tag == "ActivityManager" || text =~ "^Start")
//! ```
//!
//! Compilation runs three stages once, when the filter is created:
//!
//! 1. [`lexer`] splits the text into tokens (state machine, no backtracking)
//! 2. [`parser`] reorders them into RPN with the shunting-yard algorithm
//! 3. a trial evaluation rejects expressions that cannot be evaluated
//!
//! Matching then walks the RPN with a value stack, linear in the expression
//! length.

pub mod compiled;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod token;

pub use compiled::Filter;
pub use token::{CompareOp, Key, LogicalOp, Token};
