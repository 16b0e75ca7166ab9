#![forbid(unsafe_code)]

//! Lightseg binary entry point.

use lightseg_demo::app::{App, TraceSink};
use lightseg_demo::cli::{self, Command};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_env("LIGHTSEG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let opts = match cli::parse() {
        Ok(Command::Run(opts)) => opts,
        Ok(Command::Help) => {
            println!("{}", cli::HELP_TEXT);
            return;
        }
        Ok(Command::Version) => {
            println!("{}", cli::version_line());
            return;
        }
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Run with --help for usage information.");
            std::process::exit(1);
        }
    };

    init_logging();

    let mut app = match App::new(&opts, Box::new(TraceSink::default())) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Failed to initialize: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = app.run() {
        eprintln!("Runtime error: {e}");
        std::process::exit(1);
    }
}
