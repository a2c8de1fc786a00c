//! # Formula Module
//!
//! Compiles OpenFormula cell formulas into data-only expression trees, keeps
//! them in the method store and evaluates them against stored rows.
//!
//! Only same-row single-cell references (`[.C7]`), numeric literals, the four
//! arithmetic operators plus `^`, and the `SUM` / `ROUND` functions are
//! understood. Anything else fails compilation with a [`FormulaError`].

pub(crate) mod compiler;
pub(crate) mod evaluator;
pub(crate) mod expression;
pub(crate) mod lexer;
pub(crate) mod method;
pub(crate) mod store;

use thiserror::Error;

pub use compiler::FormulaCompiler;
pub use evaluator::coerce;
pub use evaluator::evaluate;
pub use evaluator::RowLookup;
pub use expression::Expr;
pub use expression::Function;
pub use expression::Operator;
pub use method::MethodEvaluator;
pub use method::MethodResult;
pub use store::FormulaUnit;
pub use store::MethodStore;

/// Errors raised while compiling a formula.
#[derive(Error, Debug)]
pub enum FormulaError {
    #[error("Unexpected character '{character}' in formula '{formula}'")]
    UnexpectedCharacterError { formula: String, character: char },

    #[error("Unexpected token {token} in formula '{formula}'")]
    UnexpectedTokenError { formula: String, token: String },

    #[error("Formula '{0}' ends unexpectedly")]
    UnexpectedEndError(String),

    #[error("Invalid number '{0}'")]
    InvalidNumberError(String),

    #[error("Unsupported reference '[{0}]', only same-sheet single cells are allowed")]
    UnsupportedReferenceError(String),

    #[error("Unknown function '{0}'")]
    UnknownFunctionError(String),

    #[error("Function '{function}' does not accept {count} arguments")]
    ArgumentCountError { function: String, count: usize },
}

/// Lookup misses of the method evaluator.
#[derive(Error, Debug)]
pub enum MethodError {
    #[error("No formula stored for column '{column}' of table '{table}'")]
    FormulaNotFoundError { table: String, column: String },

    #[error("Row {id} not found in table '{table}'")]
    RowNotFoundError { table: String, id: i64 },
}
