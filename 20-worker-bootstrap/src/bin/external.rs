//! Worker that connects either directly or through a locator.
//!
//! ```bash
//! external receptionist <hostname> <port> <worker_id>
//! external locator <hostname> <project_name> <deployment_id> <login_token>
//! ```

use std::process::ExitCode;

use worker_bootstrap::{
    bootstrap,
    cli::{parse_args, ExternalCli},
};

const WORKER_TYPE: &str = "External";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    bootstrap::init_tracing();

    let cli: ExternalCli = match parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    bootstrap::run(cli.tuning.settings(WORKER_TYPE), cli.command.into()).await
}
