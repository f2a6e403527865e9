//! Failure taxonomy for the arithmetic core.

use thiserror::Error;

use crate::op::Operation;

/// Everything that can go wrong between a raw token and a result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// The operation token is not in the alias table.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Wrong number of operands for the resolved operation.
    #[error("{operation} expects {expected} operand{}, got {actual}", plural(.expected))]
    ArityMismatch {
        operation: Operation,
        expected: usize,
        actual: usize,
    },

    /// An operand token does not parse to a finite number.
    #[error("Invalid number: {0}")]
    InvalidOperand(String),

    #[error("Division by zero is not allowed")]
    DivideByZero,

    #[error("Modulo by zero is not allowed")]
    ModuloByZero,

    #[error("Cannot calculate square root of a negative number")]
    NegativeRadicand,
}

impl CalcError {
    /// Stable machine-readable name, used by the HTTP API.
    pub fn kind(&self) -> &'static str {
        match self {
            CalcError::UnknownOperation(_) => "unknown_operation",
            CalcError::ArityMismatch { .. } => "arity_mismatch",
            CalcError::InvalidOperand(_) => "invalid_operand",
            CalcError::DivideByZero => "divide_by_zero",
            CalcError::ModuloByZero => "modulo_by_zero",
            CalcError::NegativeRadicand => "negative_radicand",
        }
    }
}

fn plural(n: &usize) -> &'static str {
    if *n == 1 { "" } else { "s" }
}
