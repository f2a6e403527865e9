//! Interactive prompt.
//!
//! [`Repl::handle_line`] is the whole command interpreter and performs no
//! I/O: it appends to [`Repl::output`] and returns a [`Flow`] telling the
//! caller what to do next.  [`Repl::run`] wires it to the terminal.
//!
//! ```text
//!   stdin thread ──lines──► mpsc ──► Repl::run()  ◄── Ctrl-C
//!                                      │ tokio::select!
//!                                      ▼
//!                               handle_line() ──► output ──► stdout
//! ```
//!
//! | Input | Effect |
//! |-------|--------|
//! | `<n> <op> <n>`, `sqrt(<n>)` | evaluate, print `= <result>`, record in history |
//! | `help`    | list supported forms |
//! | `history` | list recent results, newest first |
//! | `clear`   | clear the screen |
//! | `exit`, `quit` | leave |

use std::io::{self, BufRead, Write};

use crossterm::style::Stylize;
use crossterm::{cursor, execute, terminal};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::Settings;
use crate::display::{format_number, round_to};
use crate::error::CalcError;
use crate::expr::{parse_expression, Expr, InvalidExpression};
use crate::history::History;

// ── Types ─────────────────────────────────────────────────────────────────────

/// Why a line produced no result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineError {
    #[error("{0}. Type \"help\" for the supported forms.")]
    Syntax(#[from] InvalidExpression),
    #[error(transparent)]
    Calc(#[from] CalcError),
}

/// What the driver should do after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    ClearScreen,
    Quit,
}

/// One line of prompt output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Text(String),
    Result(String),
    Error(String),
}

impl Output {
    pub fn text(&self) -> &str {
        match self {
            Output::Text(s) | Output::Result(s) | Output::Error(s) => s,
        }
    }
}

const HELP: &[&str] = &[
    "Expressions:",
    "  <a> + <b>    addition          <a> - <b>    subtraction",
    "  <a> * <b>    multiplication    <a> x <b>    multiplication",
    "  <a> / <b>    division          <a> % <b>    remainder",
    "  <a> ^ <b>    power             <a> ** <b>   power",
    "  sqrt(<n>)    square root       √(<n>)       square root",
    "Examples: 5 + 3, 2 ^ 10, -7 % 3, sqrt(144)",
    "Commands: help, history, clear, exit (or quit)",
];

// ── Repl ──────────────────────────────────────────────────────────────────────

/// Prompt state: settings, history, and pending output.
#[derive(Debug)]
pub struct Repl {
    prompt: String,
    precision: u32,
    color: bool,
    history: History,
    /// Lines produced since the last drain, oldest first.
    pub output: Vec<Output>,
}

impl Repl {
    pub fn new(settings: &Settings) -> Self {
        Self {
            prompt: settings.prompt.clone(),
            precision: settings.precision,
            color: settings.color,
            history: History::new(settings.history_size),
            output: Vec::new(),
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Parse and evaluate one expression without touching history or output.
    pub fn evaluate_line(line: &str) -> Result<(Expr, f64), LineError> {
        let expr = parse_expression(line)?;
        let value = expr.evaluate()?;
        Ok((expr, value))
    }

    /// Handle one line of input.
    pub fn handle_line(&mut self, line: &str) -> Flow {
        let line = line.trim();
        debug!(line, "repl input");

        match line.to_ascii_lowercase().as_str() {
            "" => return Flow::Continue,
            "exit" | "quit" => return Flow::Quit,
            "clear" => return Flow::ClearScreen,
            "help" => {
                self.output.extend(HELP.iter().map(|s| Output::Text((*s).to_owned())));
                return Flow::Continue;
            }
            "history" => {
                if self.history.is_empty() {
                    self.output.push(Output::Text("(no history)".to_owned()));
                } else {
                    let lines: Vec<Output> = self
                        .history
                        .iter()
                        .map(|e| Output::Text(format!("  {e}")))
                        .collect();
                    self.output.extend(lines);
                }
                return Flow::Continue;
            }
            _ => {}
        }

        match Self::evaluate_line(line) {
            Ok((expr, value)) => {
                let shown = round_to(value, self.precision);
                self.output.push(Output::Result(format!("= {}", format_number(shown))));
                self.history.record(expr.to_string(), shown);
            }
            Err(e) => self.output.push(Output::Error(format!("❌ Error: {e}"))),
        }
        Flow::Continue
    }

    /// Take all pending output.
    pub fn drain_output(&mut self) -> Vec<Output> {
        std::mem::take(&mut self.output)
    }

    // ── Terminal driver ───────────────────────────────────────────────────────

    /// Run the prompt on stdin/stdout until EOF, `exit`, or Ctrl-C.
    ///
    /// The prompt and banner are only shown, and output only coloured, when
    /// both stdin and stdout are terminals.
    pub async fn run(&mut self) -> io::Result<()> {
        let is_tty = unsafe {
            libc::isatty(libc::STDIN_FILENO) != 0 && libc::isatty(libc::STDOUT_FILENO) != 0
        };
        let styled = is_tty && self.color;
        let mut stdout = io::stdout();

        // A dedicated thread owns stdin; blocking reads inside select! would
        // leave a stray reader behind every time another branch wins.
        let (line_tx, mut line_rx) = mpsc::channel::<String>(16);
        std::thread::spawn(move || {
            let mut stdin = io::stdin().lock();
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match stdin.read_until(b'\n', &mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                // Invalid UTF-8 becomes U+FFFD and is reported as a bad expression.
                let line = decode_line(&buf);
                if line_tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });

        if is_tty {
            writeln!(stdout, "calc {} interactive mode", env!("CARGO_PKG_VERSION"))?;
            writeln!(stdout, "Type \"help\" for help, \"exit\" to quit.")?;
            writeln!(stdout)?;
        }

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            if is_tty {
                write!(stdout, "{}", self.prompt)?;
                stdout.flush()?;
            }

            let line = tokio::select! {
                line = line_rx.recv() => line,
                _ = &mut ctrl_c => {
                    writeln!(stdout)?;
                    None
                }
            };
            let Some(line) = line else { break };

            let flow = self.handle_line(&line);
            for out in self.drain_output() {
                print_output(&mut stdout, &out, styled)?;
            }
            match flow {
                Flow::Continue => {}
                Flow::ClearScreen => {
                    if is_tty {
                        execute!(
                            stdout,
                            terminal::Clear(terminal::ClearType::All),
                            cursor::MoveTo(0, 0)
                        )?;
                    }
                }
                Flow::Quit => break,
            }
        }

        writeln!(stdout, "👋 Goodbye!")?;
        stdout.flush()
    }
}

/// Turn one raw input line into text, dropping the line terminator.
fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\n', '\r'])
        .to_owned()
}

fn print_output(w: &mut impl Write, out: &Output, styled: bool) -> io::Result<()> {
    match out {
        Output::Result(s) if styled => writeln!(w, "{}", s.as_str().green().bold()),
        Output::Error(s) if styled => writeln!(w, "{}", s.as_str().red()),
        other => writeln!(w, "{}", other.text()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
