// src/main.rs

use tracing::error;

#[tokio::main]
async fn main() {
    let args = procrun::cli::parse();

    if let Err(e) = procrun::logging::init_logging(args.log_level) {
        eprintln!("failed to initialise logging: {e}");
        std::process::exit(2);
    }

    match procrun::run(args).await {
        Ok(code) => std::process::exit(code),
        Err(e) if e.is_launch_failure() => {
            error!(error = %e, "could not launch program");
            std::process::exit(127);
        }
        Err(e) => {
            error!(error = %e, "execution failed");
            std::process::exit(1);
        }
    }
}
