//! `.calcrc` configuration file parser.
//!
//! The file is a list of `/set` directives:
//!
//! | Directive | Action |
//! |-----------|--------|
//! | `/set <name>=<value>` or `/set <name> <value>` | change a setting |
//! | Lines starting with `;` | comment, ignored |
//! | Any other `/command` | silently skipped |
//!
//! Recognised settings:
//!
//! | Name | Type | Default | Used by |
//! |------|------|---------|---------|
//! | `host`      | IP address | `127.0.0.1` | server |
//! | `port`      | `u16`      | `3000`      | server |
//! | `public`    | directory  | (resolved)  | server |
//! | `precision` | `0..=15`   | `8`         | REPL result display |
//! | `history`   | `>= 1`     | `10`        | REPL history size |
//! | `prompt`    | string     | `calc> `    | REPL |
//! | `color`     | `on`/`off` | `on`        | REPL |
//!
//! Problems on recognised lines are collected as [`ConfigError`]s; the
//! setting keeps its previous value and loading continues.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::display::{DEFAULT_PRECISION, MAX_PRECISION};
use crate::history::History;

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

/// Effective runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: IpAddr,
    pub port: u16,
    /// Static file root from the config file; see [`crate::cli::resolve_public_dir`].
    pub public_dir: Option<PathBuf>,
    pub precision: u32,
    pub history_size: usize,
    pub prompt: String,
    pub color: bool,
}

impl Settings {
    pub const DEFAULT_PORT: u16 = 3000;
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: Self::DEFAULT_PORT,
            public_dir: None,
            precision: DEFAULT_PRECISION,
            history_size: History::DEFAULT_SIZE,
            prompt: "calc> ".to_owned(),
            color: true,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Default)]
pub struct Config {
    pub settings: Settings,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config string.
    ///
    /// Returns the config and a list of any errors on recognised lines.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let Some(rest) = line.strip_prefix('/') else { continue };

            let (cmd, args_str) = rest
                .split_once(|c: char| c.is_ascii_whitespace())
                .unwrap_or((rest, ""));

            if cmd == "set" {
                let tokens = split_args(args_str.trim());
                if let Err(message) = parse_set(&tokens, &mut config.settings) {
                    errors.push(ConfigError { line: lineno, message });
                }
            }
        }

        (config, errors)
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }
}

// ── Argument tokenizer ────────────────────────────────────────────────────────

/// Split `s` into whitespace-delimited tokens, honouring double-quoted strings
/// and `\"` escapes within them.
fn split_args(s: &str) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    cur.push(escaped);
                }
            }
            c if c.is_ascii_whitespace() && !in_quotes => {
                if !cur.is_empty() || quoted {
                    args.push(std::mem::take(&mut cur));
                }
                quoted = false;
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() || quoted {
        args.push(cur);
    }
    args
}

// ── /set ──────────────────────────────────────────────────────────────────────

/// Parse `/set <name>=<value>` or `/set <name> <value>` into `settings`.
fn parse_set(tokens: &[String], settings: &mut Settings) -> Result<(), String> {
    let Some(first) = tokens.first() else {
        return Err("/set: requires an argument".into());
    };

    let (name, value) = if let Some((name, value)) = first.split_once('=') {
        (name.to_owned(), value.to_owned())
    } else if tokens.len() >= 2 {
        (first.clone(), tokens[1..].join(" "))
    } else {
        return Err(format!("/set: missing value for '{first}'"));
    };

    if name.is_empty() {
        return Err("/set: setting name cannot be empty".into());
    }

    apply_setting(settings, &name.to_ascii_lowercase(), &value)
}

fn apply_setting(settings: &mut Settings, name: &str, value: &str) -> Result<(), String> {
    match name {
        "host" => {
            settings.host = value
                .parse()
                .map_err(|_| format!("host: invalid address '{value}'"))?;
        }
        "port" => {
            settings.port = value
                .parse()
                .map_err(|_| format!("port: invalid port number '{value}'"))?;
        }
        "public" => {
            if value.is_empty() {
                return Err("public: directory cannot be empty".into());
            }
            settings.public_dir = Some(PathBuf::from(value));
        }
        "precision" => {
            settings.precision = value
                .parse::<u32>()
                .ok()
                .filter(|p| *p <= MAX_PRECISION)
                .ok_or_else(|| format!("precision: expected 0..={MAX_PRECISION}, got '{value}'"))?;
        }
        "history" => {
            settings.history_size = value
                .parse::<usize>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| format!("history: expected a positive size, got '{value}'"))?;
        }
        "prompt" => settings.prompt = value.to_owned(),
        "color" => {
            settings.color = match value.to_ascii_lowercase().as_str() {
                "on" | "1" | "yes" | "true" => true,
                "off" | "0" | "no" | "false" => false,
                _ => return Err(format!("color: expected on or off, got '{value}'")),
            };
        }
        other => return Err(format!("unknown setting '{other}'")),
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // -- split_args -----------------------------------------------------------

    #[test]
    fn split_simple() {
        assert_eq!(split_args("port 8080"), ["port", "8080"]);
    }

    #[test]
    fn split_quoted_spaces() {
        assert_eq!(split_args(r#"prompt "calc> ""#), ["prompt", "calc> "]);
    }

    #[test]
    fn split_empty_quotes_is_a_token() {
        assert_eq!(split_args(r#"prompt """#), ["prompt", ""]);
    }

    #[test]
    fn split_escaped_quote_inside_quotes() {
        assert_eq!(split_args(r#""say \"hi\"""#), [r#"say "hi""#]);
    }

    // -- /set -----------------------------------------------------------------

    #[test]
    fn defaults() {
        let (cfg, errs) = Config::load_str("");
        assert!(errs.is_empty());
        assert_eq!(cfg.settings, Settings::default());
        assert_eq!(cfg.settings.port, 3000);
        assert_eq!(cfg.settings.precision, 8);
        assert_eq!(cfg.settings.history_size, 10);
    }

    #[test]
    fn set_equals_syntax() {
        let (cfg, errs) = Config::load_str("/set port=8080");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.settings.port, 8080);
    }

    #[test]
    fn set_space_syntax() {
        let (cfg, errs) = Config::load_str("/set precision 4");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.settings.precision, 4);
    }

    #[test]
    fn set_quoted_prompt_keeps_trailing_space() {
        let (cfg, errs) = Config::load_str(r#"/set prompt "= ""#);
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.settings.prompt, "= ");
    }

    #[test]
    fn set_names_are_case_insensitive() {
        let (cfg, errs) = Config::load_str("/set COLOR=off\n/set History=3");
        assert!(errs.is_empty(), "{errs:?}");
        assert!(!cfg.settings.color);
        assert_eq!(cfg.settings.history_size, 3);
    }

    #[test]
    fn set_host_and_public() {
        let (cfg, errs) = Config::load_str("/set host=0.0.0.0\n/set public=/srv/calc");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.settings.host, IpAddr::from([0, 0, 0, 0]));
        assert_eq!(cfg.settings.public_dir, Some(PathBuf::from("/srv/calc")));
    }

    #[test]
    fn bad_values_are_reported_and_ignored() {
        let (cfg, errs) = Config::load_str(
            "/set port=99999\n\
             /set precision=16\n\
             /set history=0\n\
             /set color=maybe\n\
             /set host=localhost-ish",
        );
        assert_eq!(errs.len(), 5, "{errs:?}");
        assert_eq!(errs[0].line, 1);
        assert_eq!(errs[4].line, 5);
        assert_eq!(cfg.settings, Settings::default());
    }

    #[test]
    fn unknown_setting_is_error() {
        let (_, errs) = Config::load_str("/set colour=on");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].to_string(), "line 1: unknown setting 'colour'");
    }

    #[test]
    fn set_without_value_is_error() {
        let (_, errs) = Config::load_str("/set port");
        assert_eq!(errs[0].message, "/set: missing value for 'port'");
        let (_, errs) = Config::load_str("/set");
        assert_eq!(errs[0].message, "/set: requires an argument");
    }

    // -- Comments & skipping --------------------------------------------------

    #[test]
    fn comments_blank_lines_and_unknown_commands_skipped() {
        let src = "\
;; calculator settings\n\
\n\
/bind ^X = /quit\n\
port=1234\n\
/set port=4000\n";
        let (cfg, errs) = Config::load_str(src);
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.settings.port, 4000);
    }

    #[test]
    fn load_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".calcrc");
        std::fs::write(&path, "/set port=5000\n").unwrap();
        let (cfg, errs) = Config::load_file(&path).unwrap();
        assert!(errs.is_empty());
        assert_eq!(cfg.settings.port, 5000);
    }

    #[test]
    fn load_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_file(&dir.path().join("nope")).is_err());
    }
}
