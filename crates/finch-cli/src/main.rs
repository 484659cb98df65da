use finch_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    logging::init_logging_or_stderr();

    if let Err(err) = Cli::run_from_args().await {
        eprintln!("finch error: {:#}", err);
        std::process::exit(1);
    }
}
