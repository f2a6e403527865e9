//! Single-step expression grammar for the interactive prompt.
//!
//! Two shapes are accepted, both matched with [`regex`]:
//!
//! | Shape | Examples |
//! |-------|----------|
//! | `<number> <symbol> <number>` | `5 + 3`, `2^10`, `-7 % 3`, `1.5e3 * -2`, `2 ** 8`, `6 x 7` |
//! | `sqrt(<number>)` / `√(<number>)` | `sqrt(16)`, `√ ( 2.25 )` |
//!
//! Symbols are `+ - * / % ^ ** x`.  Anything else is an
//! [`InvalidExpression`] and never reaches alias resolution.  A matched
//! expression is evaluated through [`crate::eval::evaluate`], so the symbol
//! and operands go through the same lookup and validation as the CLI.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::error::CalcError;
use crate::eval;

// ── Grammar ───────────────────────────────────────────────────────────────────

const NUMBER: &str = r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?";

static BINARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^({NUMBER})\s*(\*\*|[-+*/%^xX])\s*({NUMBER})$"))
        .expect("binary expression regex")
});

static SQRT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?i:sqrt|√)\s*\(\s*({NUMBER})\s*\)$")).expect("sqrt regex")
});

/// Input that matches neither expression shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid expression: {0}")]
pub struct InvalidExpression(pub String);

// ── Expr ──────────────────────────────────────────────────────────────────────

/// A parsed, not yet evaluated, expression.
///
/// Operands are kept as the tokens the user typed; parsing them to numbers
/// is part of evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Binary {
        lhs: String,
        symbol: String,
        rhs: String,
    },
    SquareRoot(String),
}

impl Expr {
    /// Evaluate through the arithmetic core.
    pub fn evaluate(&self) -> Result<f64, CalcError> {
        match self {
            Expr::Binary { lhs, symbol, rhs } => eval::evaluate(symbol, &[lhs, rhs]),
            Expr::SquareRoot(n) => eval::evaluate("sqrt", &[n]),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Binary { lhs, symbol, rhs } => write!(f, "{lhs} {symbol} {rhs}"),
            Expr::SquareRoot(n) => write!(f, "√({n})"),
        }
    }
}

/// Parse one line of prompt input.
pub fn parse_expression(input: &str) -> Result<Expr, InvalidExpression> {
    let input = input.trim();

    if let Some(caps) = SQRT.captures(input) {
        return Ok(Expr::SquareRoot(caps[1].to_owned()));
    }
    if let Some(caps) = BINARY.captures(input) {
        return Ok(Expr::Binary {
            lhs: caps[1].to_owned(),
            symbol: caps[2].to_owned(),
            rhs: caps[3].to_owned(),
        });
    }
    Err(InvalidExpression(input.to_owned()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
