use std::net::SocketAddr;

use tracing::warn;

use calc::cli::{self, ConfigFile, Mode};
use calc::config::{Config, Settings};
use calc::display::format_number;
use calc::error::CalcError;
use calc::repl::Repl;
use calc::server::Server;

#[tokio::main]
async fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("calc: {e}");
            eprintln!("{}", cli::USAGE);
            std::process::exit(1);
        }
    };

    calc::logging::init(args.debug);

    match args.mode {
        Mode::Help => println!("{}", cli::help_text()),

        Mode::Evaluate { operation, operands } => {
            match calc::evaluate(&operation, &operands) {
                Ok(value) => println!("✓ Result: {}", format_number(value)),
                Err(e) => {
                    eprintln!("❌ Error: {e}");
                    if matches!(
                        e,
                        CalcError::UnknownOperation(_) | CalcError::ArityMismatch { .. }
                    ) {
                        eprintln!("For more help, run: calc help");
                    }
                    std::process::exit(1);
                }
            }
        }

        Mode::Interactive => {
            let settings = load_settings(&args.config);
            if let Err(e) = Repl::new(&settings).run().await {
                eprintln!("calc: {e}");
                std::process::exit(1);
            }
        }

        Mode::Serve => {
            let settings = load_settings(&args.config);
            let port = args.port.unwrap_or(settings.port);
            let root = cli::resolve_public_dir(args.public_dir.as_deref(), &settings);
            let addr = SocketAddr::new(settings.host, port);

            let server = match Server::bind(addr, root).await {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("calc: {e}");
                    std::process::exit(1);
                }
            };
            let shown = server.local_addr().unwrap_or(addr);
            println!("calc web UI: http://{shown}/");
            println!("Serving files from {}", server.root().display());
            println!("Press Ctrl+C to stop.");

            if let Err(e) = server.run().await {
                eprintln!("calc: {e}");
                std::process::exit(1);
            }
        }
    }
}

/// Load the user config file, reporting problems as warnings.
fn load_settings(source: &ConfigFile) -> Settings {
    let path = match source {
        ConfigFile::Skip => return Settings::default(),
        ConfigFile::Explicit(path) => path.clone(),
        ConfigFile::Search => match cli::find_user_config() {
            Some(path) => path,
            None => return Settings::default(),
        },
    };

    match Config::load_file(&path) {
        Ok((config, errors)) => {
            for e in errors {
                warn!("{}: {e}", path.display());
            }
            config.settings
        }
        Err(e) => {
            warn!("{}: {e}", path.display());
            Settings::default()
        }
    }
}
