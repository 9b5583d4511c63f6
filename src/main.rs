use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use trailhead::cli::{self, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr. `--debug` wins over `RUST_LOG`, which wins over `info`.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("trailhead=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
