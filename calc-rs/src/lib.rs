//! Arithmetic calculator: one dispatcher, three front ends.
//!
//! The core is [`op`] (operations and the alias table), [`eval`] (operand
//! validation and evaluation) and [`error`].  Everything else is a front end
//! or its support: [`cli`] for one-shot evaluation, [`repl`] and [`expr`] for
//! the interactive prompt, [`server`] for the web UI, plus [`config`],
//! [`display`], [`history`] and [`logging`].
//!
//! ```
//! use calc::{evaluate, CalcError};
//!
//! assert_eq!(evaluate("+", &["2", "3"]), Ok(5.0));
//! assert_eq!(evaluate("mod", &["-10", "3"]), Ok(-1.0));
//! assert_eq!(evaluate("divide", &["10", "0"]), Err(CalcError::DivideByZero));
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod eval;
pub mod expr;
pub mod history;
pub mod logging;
pub mod op;
pub mod repl;
pub mod server;

pub use error::CalcError;
pub use eval::evaluate;
pub use op::Operation;
