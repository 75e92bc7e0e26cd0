// src/main.rs

use std::process::ExitCode;

use devrig::cli;
use devrig::logging::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    if let Err(err) = init_logging(args.log_level) {
        eprintln!("devrig: failed to initialise logging: {err}");
        return ExitCode::FAILURE;
    }

    match devrig::run(args).await {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            tracing::error!(error = %err, "fatal error");
            ExitCode::FAILURE
        }
    }
}
