use std::process::ExitCode;

use clap::Parser;
use pricegate_server::logging::init_tracing;
use pricegate_server::ServerArgs;

#[tokio::main]
async fn main() -> ExitCode {
    let args = ServerArgs::parse();
    init_tracing();

    match pricegate_server::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "server failed");
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
