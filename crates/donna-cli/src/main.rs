use donna_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; stderr if the state dir is unusable.
    if logging::init_logging(logging::DEFAULT_DIRECTIVE).is_err() {
        logging::init_logging_stderr(logging::DEFAULT_DIRECTIVE);
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("donna error: {:#}", err);
        std::process::exit(1);
    }
}
