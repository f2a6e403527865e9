//! Operand validation and arithmetic evaluation.
//!
//! [`evaluate`] is the whole dispatcher: resolve the operation token, check
//! the operand count against the operation's arity, parse every operand, and
//! apply the operation.  Each step fails fast with a [`CalcError`].
//!
//! Results are returned unrounded; see [`crate::display`] for presentation.

use tracing::debug;

use crate::error::CalcError;
use crate::op::{self, Operation};

/// Parse one operand token into a finite `f64`.
///
/// Surrounding whitespace is ignored.  `inf`, `NaN` and out-of-range
/// literals such as `1e999` are rejected.
pub fn parse_operand(token: &str) -> Result<f64, CalcError> {
    match token.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(CalcError::InvalidOperand(token.to_owned())),
    }
}

/// Resolve, validate and evaluate in one call.
///
/// ```
/// assert_eq!(calc::eval::evaluate("add", &["2", "3"]), Ok(5.0));
/// assert!(calc::eval::evaluate("sqrt", &["-4"]).is_err());
/// ```
pub fn evaluate<S: AsRef<str>>(token: &str, operands: &[S]) -> Result<f64, CalcError> {
    evaluate_with(op::resolve(token)?, operands)
}

/// Validate and evaluate raw operand tokens for an already-resolved operation.
pub fn evaluate_with<S: AsRef<str>>(op: Operation, operands: &[S]) -> Result<f64, CalcError> {
    check_arity(op, operands.len())?;
    let values = operands
        .iter()
        .map(|s| parse_operand(s.as_ref()))
        .collect::<Result<Vec<f64>, _>>()?;
    op.apply(&values)
}

fn check_arity(op: Operation, actual: usize) -> Result<(), CalcError> {
    if actual == op.arity() {
        Ok(())
    } else {
        Err(CalcError::ArityMismatch {
            operation: op,
            expected: op.arity(),
            actual,
        })
    }
}

impl Operation {
    /// Apply the operation to already-parsed operands.
    ///
    /// A slice whose length differs from [`Operation::arity`] yields
    /// [`CalcError::ArityMismatch`].
    pub fn apply(self, operands: &[f64]) -> Result<f64, CalcError> {
        let result = match *operands {
            [a] => unary(self, a),
            [a, b] => binary(self, a, b),
            _ => Err(CalcError::ArityMismatch {
                operation: self,
                expected: self.arity(),
                actual: operands.len(),
            }),
        };
        debug!(operation = %self, ?operands, ?result, "evaluated");
        result
    }
}

fn unary(op: Operation, a: f64) -> Result<f64, CalcError> {
    match op {
        Operation::SquareRoot if a < 0.0 => Err(CalcError::NegativeRadicand),
        Operation::SquareRoot => Ok(a.sqrt()),
        _ => Err(CalcError::ArityMismatch {
            operation: op,
            expected: op.arity(),
            actual: 1,
        }),
    }
}

fn binary(op: Operation, a: f64, b: f64) -> Result<f64, CalcError> {
    match op {
        Operation::Add => Ok(a + b),
        Operation::Subtract => Ok(a - b),
        Operation::Multiply => Ok(a * b),
        Operation::Divide if b == 0.0 => Err(CalcError::DivideByZero),
        Operation::Divide => Ok(a / b),
        Operation::Modulo if b == 0.0 => Err(CalcError::ModuloByZero),
        // `%` on f64 is the truncated remainder: the sign follows `a`.
        Operation::Modulo => Ok(a % b),
        Operation::Power => Ok(a.powf(b)),
        Operation::SquareRoot => Err(CalcError::ArityMismatch {
            operation: op,
            expected: 1,
            actual: 2,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
