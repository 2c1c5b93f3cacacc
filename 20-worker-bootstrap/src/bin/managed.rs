//! Worker started by the platform, connecting to its local receptionist.
//!
//! ```bash
//! managed receptionist <hostname> <port> <worker_id>
//! ```

use std::process::ExitCode;

use worker_bootstrap::{
    bootstrap,
    cli::{parse_args, ManagedCli},
};

const WORKER_TYPE: &str = "Managed";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    bootstrap::init_tracing();

    let cli: ManagedCli = match parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    bootstrap::run(cli.tuning.settings(WORKER_TYPE), cli.command.into()).await
}
