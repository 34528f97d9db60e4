//! Restricted arithmetic expression language for metric formulas.
//!
//! Grammar: infix arithmetic over `+ - * / ^ ( )`, unary minus, numeric
//! literals, identifiers resolved through bindings, and a whitelist of
//! functions (`min`, `max`, `abs`, `round`, `clamp`). No side effects, no
//! arbitrary code execution, no recursion in the language itself.
//!
//! Precedence: `^` highest (right-associative), then `* /`, then `+ -`,
//! left-to-right for equal precedence.
//!
//! Evaluation is deterministic: the same formula against the same bindings
//! always yields the same result.

pub mod eval;
pub mod parser;
pub mod token;

use thiserror::Error;

pub use eval::{evaluate, Resolve, ResolutionChain, Scalar};
pub use parser::{Expr, Formula, Func};
pub use token::Token;

/// Failure of formula parsing or evaluation.
///
/// Per-metric and non-fatal at the pipeline level: the owning metric scores
/// zero and is flagged, the calculation continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("syntax error at offset {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("unknown function `{name}`")]
    UnknownFunction { name: String },

    #[error("function `{name}` expects {expected} argument(s), got {found}")]
    WrongArity { name: &'static str, expected: &'static str, found: usize },

    #[error("unresolved identifier `{key}`")]
    UnresolvedIdentifier { key: String },

    #[error("identifier `{key}` is not numeric")]
    NonNumericOperand { key: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NonFinite,
}

impl EvalError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        EvalError::Syntax { position, message: message.into() }
    }
}
