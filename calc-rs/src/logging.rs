//! Diagnostic logging on stderr.
//!
//! Library code logs through [`tracing`]; the binary installs a
//! `tracing-subscriber` fmt subscriber once at startup.  The filter comes from
//! the `CALC_LOG` environment variable (`EnvFilter` syntax, e.g.
//! `CALC_LOG=calc=debug`), falling back to `warn`, or `debug` with `-d`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "CALC_LOG";

/// Default filter directive for the given verbosity.
pub fn default_directive(debug: bool) -> &'static str {
    if debug { "calc=debug" } else { "warn" }
}

/// Install the global subscriber.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(debug: bool) {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directive) if !debug => EnvFilter::try_new(directive)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(false))),
        _ => EnvFilter::new(default_directive(debug)),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives() {
        assert_eq!(default_directive(false), "warn");
        assert_eq!(default_directive(true), "calc=debug");
    }

    #[test]
    fn init_twice_is_harmless() {
        init(false);
        init(true);
        tracing::debug!("still alive");
    }
}
