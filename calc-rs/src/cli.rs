//! Command-line argument parsing.
//!
//! Usage:
//!   calc [-d] [-f[<file>]] <operation> <num1> [num2]
//!   calc [-d] [-f[<file>]] -i
//!   calc [-d] [-f[<file>]] -s [-p<port>] [-r<dir>]
//!   calc help | -h | --help
//!
//! Flags are only recognised before the first positional argument, and a
//! token counts as a flag only when a letter follows the `-`.  That keeps
//! `calc - 20 7` (subtract) and `calc add -5 -3` (negative operands) working.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};

use crate::config::Settings;
use crate::op::Operation;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Verbose logging (`-d`).
    pub debug: bool,
    /// Config-file specification.
    pub config: ConfigFile,
    /// What to do.
    pub mode: Mode,
    /// Listening port override (`-p<port>`, serve mode only).
    pub port: Option<u16>,
    /// Static file root override (`-r<dir>`, serve mode only).
    pub public_dir: Option<PathBuf>,
}

/// How to choose the user config file.
#[derive(Debug, Default)]
pub enum ConfigFile {
    /// Search the standard locations (default).
    #[default]
    Search,
    /// `-f` with no file argument: skip user config.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

/// Which surface to run.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Print usage and exit successfully.
    #[default]
    Help,
    /// Evaluate a single operation and exit.
    Evaluate {
        operation: String,
        operands: Vec<String>,
    },
    /// Interactive prompt (`-i`).
    Interactive,
    /// Web UI server (`-s`).
    Serve,
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// A flag cluster is `-` followed by an ASCII letter, or a `--long` option.
fn is_flag(arg: &str) -> bool {
    let mut chars = arg.chars();
    chars.next() == Some('-') && chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '-')
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut help = false;
    let mut interactive = false;
    let mut serve = false;
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        if !is_flag(arg) {
            break;
        }

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            break;
        }

        if let Some(long) = arg.strip_prefix("--") {
            match long {
                "help" => help = true,
                "interactive" => interactive = true,
                "serve" => serve = true,
                "debug" => args.debug = true,
                _ => return Err(format!("unknown option: {arg}")),
            }
            i += 1;
            continue;
        }

        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'd' => args.debug = true,
                'h' => help = true,
                'i' => interactive = true,
                's' => serve = true,

                // -f[<file>]; a separate argument is never taken, since it
                // would swallow the operation name.
                'f' => {
                    if j + 1 < chars.len() {
                        let file: String = chars[j + 1..].iter().collect();
                        args.config = ConfigFile::Explicit(PathBuf::from(file));
                        j = chars.len();
                    } else {
                        args.config = ConfigFile::Skip;
                    }
                }

                // -p<port> / -p <port>
                'p' => {
                    let value = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-p requires a port argument".to_owned());
                    };
                    let port = value
                        .parse::<u16>()
                        .map_err(|_| format!("invalid port number: {value}"))?;
                    args.port = Some(port);
                }

                // -r<dir> / -r <dir>
                'r' => {
                    let dir = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-r requires a directory argument".to_owned());
                    };
                    args.public_dir = Some(PathBuf::from(dir));
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    let positional = &argv[i..];

    if help {
        args.mode = Mode::Help;
        return Ok(args);
    }
    if interactive && serve {
        return Err("-i and -s cannot be combined".to_owned());
    }
    if (interactive || serve) && !positional.is_empty() {
        return Err(format!("unexpected argument: {}", positional[0]));
    }
    if (args.port.is_some() || args.public_dir.is_some()) && !serve {
        return Err("-p and -r are only valid with -s".to_owned());
    }

    args.mode = if interactive {
        Mode::Interactive
    } else if serve {
        Mode::Serve
    } else {
        match positional {
            [] => Mode::Help,
            [first, ..] if first == "help" => Mode::Help,
            [operation, operands @ ..] => Mode::Evaluate {
                operation: operation.clone(),
                operands: operands.to_vec(),
            },
        }
    };

    Ok(args)
}

// ── Usage text ────────────────────────────────────────────────────────────────

/// One-line usage summary, printed after argument errors.
pub const USAGE: &str = "\
Usage: calc [-d] [-f[<file>]] <operation> <num1> [num2]
       calc [-d] [-f[<file>]] -i
       calc [-d] [-f[<file>]] -s [-p<port>] [-r<dir>]";

/// Full help text, with the operation table generated from the alias table.
pub fn help_text() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "calc {} - arithmetic calculator", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(out);
    let _ = writeln!(out, "{USAGE}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Operations:");
    for op in Operation::ALL {
        let aliases: Vec<&str> = op.aliases().collect();
        let _ = writeln!(out, "  {:<34} {}", aliases.join(", "), op.description());
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Options:");
    let _ = writeln!(out, "  -i, --interactive   interactive prompt (try `5 + 3` or `sqrt(16)`)");
    let _ = writeln!(out, "  -s, --serve         serve the web calculator");
    let _ = writeln!(out, "  -p<port>            listening port for -s (default {})", Settings::DEFAULT_PORT);
    let _ = writeln!(out, "  -r<dir>             directory of web UI files for -s");
    let _ = writeln!(out, "  -f<file>            read settings from <file>; -f alone skips the config file");
    let _ = writeln!(out, "  -d, --debug         debug logging on stderr");
    let _ = writeln!(out, "  -h, --help          this text");
    let _ = writeln!(out);
    let _ = writeln!(out, "Examples:");
    let _ = writeln!(out, "  calc add 10 5        -> 15");
    let _ = writeln!(out, "  calc mod -10 3       -> -1");
    let _ = writeln!(out, "  calc pow 2 -1        -> 0.5");
    let _ = write!(out, "  calc sqrt 16         -> 4");
    out
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Search for the user config file in the standard locations.
///
/// Order: `$CALCRC`, `~/.calcrc`, the platform config directory
/// (`~/.config/calc/calcrc` on Linux), `./.calcrc`.  Returns the first path
/// that exists.
pub fn find_user_config() -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(p) = std::env::var_os("CALCRC") {
        candidates.push(PathBuf::from(p));
    }
    if let Some(base) = BaseDirs::new() {
        candidates.push(base.home_dir().join(".calcrc"));
    }
    if let Some(proj) = ProjectDirs::from("", "", "calc") {
        candidates.push(proj.config_dir().join("calcrc"));
    }
    candidates.push(PathBuf::from("./.calcrc"));
    candidates.into_iter().find(|p| p.exists())
}

/// Determine the directory the web server serves files from.
///
/// Priority: `-r<dir>` flag → `CALC_PUBLIC_DIR` env var → `public` setting →
/// `public/` next to the crate manifest (development layout) → `./public`.
pub fn resolve_public_dir(cli_override: Option<&Path>, settings: &Settings) -> PathBuf {
    if let Some(d) = cli_override {
        return d.to_path_buf();
    }
    if let Some(d) = std::env::var_os("CALC_PUBLIC_DIR") {
        return PathBuf::from(d);
    }
    if let Some(d) = &settings.public_dir {
        return d.clone();
    }
    let dev = Path::new(env!("CARGO_MANIFEST_DIR")).join("public");
    if dev.exists() {
        return dev;
    }
    PathBuf::from("./public")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
