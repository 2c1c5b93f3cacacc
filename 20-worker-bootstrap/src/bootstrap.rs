//! Process driver shared by the worker binaries.

use std::process::ExitCode;

use tracing::{info, warn};

use crate::{
    config::WorkerSettings,
    error::ERROR_EXIT_STATUS,
    strategy::{queue_progress, ConnectStrategy},
    worker::{Termination, WorkerLoop},
};

/// Logs go to stderr so stdout only carries usage text and queue notices.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Connects with `strategy` and runs the worker loop to completion.
///
/// Every way out of here is a failure exit: the platform only stops a worker
/// by disconnecting it.
pub async fn run(settings: WorkerSettings, strategy: ConnectStrategy) -> ExitCode {
    info!(
        worker_type = %settings.worker_type,
        strategy = strategy.name(),
        "connecting"
    );

    let connection = match strategy
        .connect(
            settings.connection_parameters(),
            &settings.logger_name,
            queue_progress(&settings.worker_type),
        )
        .await
    {
        Ok(connection) => connection,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(ERROR_EXIT_STATUS);
        }
    };

    match WorkerLoop::new(connection, &settings).run().await {
        Ok(Termination::Disconnected { reason }) => {
            warn!(%reason, "worker was disconnected");
        }
        Err(err) => eprintln!("{err}"),
    }

    ExitCode::from(ERROR_EXIT_STATUS)
}
