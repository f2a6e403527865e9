//! Operations and the alias table.
//!
//! Every textual spelling of an operation (canonical name, short name, or
//! symbol) lives in [`ALIASES`].  Lookup folds case and trims whitespace, so
//! `" ADD "`, `"add"` and `"+"` all resolve to [`Operation::Add`].
//!
//! | Operation | Arity | Aliases |
//! |-----------|-------|---------|
//! | [`Operation::Add`]        | 2 | `add` `+` |
//! | [`Operation::Subtract`]   | 2 | `subtract` `sub` `-` |
//! | [`Operation::Multiply`]   | 2 | `multiply` `mul` `*` `x` |
//! | [`Operation::Divide`]     | 2 | `divide` `div` `/` |
//! | [`Operation::Modulo`]     | 2 | `modulo` `mod` `%` |
//! | [`Operation::Power`]      | 2 | `power` `pow` `exponentiate` `exp` `^` `**` |
//! | [`Operation::SquareRoot`] | 1 | `sqrt` `squareroot` `√` |

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::error::CalcError;

// ── Operation ─────────────────────────────────────────────────────────────────

/// One of the seven supported arithmetic actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    SquareRoot,
}

impl Operation {
    /// All operations, in display order.
    pub const ALL: [Operation; 7] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
        Operation::Modulo,
        Operation::Power,
        Operation::SquareRoot,
    ];

    /// Number of operands the operation takes.
    pub const fn arity(self) -> usize {
        match self {
            Operation::SquareRoot => 1,
            _ => 2,
        }
    }

    /// Canonical (first-listed) alias.
    pub const fn name(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
            Operation::Modulo => "modulo",
            Operation::Power => "power",
            Operation::SquareRoot => "sqrt",
        }
    }

    /// Short human description used in usage text.
    pub const fn description(self) -> &'static str {
        match self {
            Operation::Add => "Addition",
            Operation::Subtract => "Subtraction",
            Operation::Multiply => "Multiplication",
            Operation::Divide => "Division",
            Operation::Modulo => "Remainder (sign follows the dividend)",
            Operation::Power => "Exponentiation",
            Operation::SquareRoot => "Square root",
        }
    }

    /// Every alias that resolves to this operation, in table order.
    pub fn aliases(self) -> impl Iterator<Item = &'static str> {
        ALIASES
            .iter()
            .filter(move |(_, op)| *op == self)
            .map(|(alias, _)| *alias)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Alias table ───────────────────────────────────────────────────────────────

/// Token → operation.  Tokens are stored lowercased.
pub const ALIASES: &[(&str, Operation)] = &[
    ("add", Operation::Add),
    ("+", Operation::Add),
    ("subtract", Operation::Subtract),
    ("sub", Operation::Subtract),
    ("-", Operation::Subtract),
    ("multiply", Operation::Multiply),
    ("mul", Operation::Multiply),
    ("*", Operation::Multiply),
    ("x", Operation::Multiply),
    ("divide", Operation::Divide),
    ("div", Operation::Divide),
    ("/", Operation::Divide),
    ("modulo", Operation::Modulo),
    ("mod", Operation::Modulo),
    ("%", Operation::Modulo),
    ("power", Operation::Power),
    ("pow", Operation::Power),
    ("exponentiate", Operation::Power),
    ("exp", Operation::Power),
    ("^", Operation::Power),
    ("**", Operation::Power),
    ("sqrt", Operation::SquareRoot),
    ("squareroot", Operation::SquareRoot),
    ("√", Operation::SquareRoot),
];

static LOOKUP: LazyLock<HashMap<&'static str, Operation>> =
    LazyLock::new(|| ALIASES.iter().copied().collect());

/// Resolve a raw token to an [`Operation`].
///
/// The token is trimmed and lowercased before lookup.  On failure the error
/// carries the token as the caller supplied it.
pub fn resolve(token: &str) -> Result<Operation, CalcError> {
    let key = token.trim().to_lowercase();
    LOOKUP
        .get(key.as_str())
        .copied()
        .ok_or_else(|| CalcError::UnknownOperation(token.to_owned()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
