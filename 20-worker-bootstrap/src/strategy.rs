//! The two ways a worker reaches the platform.

use tracing::info;

use crate::{
    config::{ConnectionParameters, LocatorCredentials, ReceptionistAddress},
    connection::{Connection, TcpConnection},
    error::WorkerError,
    locator::{Locator, QueueStatus},
    op::LogLevel,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectStrategy {
    /// Direct connection to a known endpoint.
    Receptionist(ReceptionistAddress),
    /// Connection mediated by a locator service, which may queue the worker.
    Locator {
        hostname: String,
        credentials: LocatorCredentials,
    },
}

impl ConnectStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectStrategy::Receptionist(_) => "Receptionist",
            ConnectStrategy::Locator { .. } => "Locator",
        }
    }

    /// Applies the strategy's network requirements to caller-provided parameters.
    ///
    /// Locator deployments are only reachable through an external address,
    /// local receptionists never are.
    pub fn apply(&self, mut params: ConnectionParameters) -> ConnectionParameters {
        params.use_external_ip = matches!(self, ConnectStrategy::Locator { .. });
        params
    }

    pub async fn connect<F>(
        &self,
        params: ConnectionParameters,
        logger_name: &str,
        queue_callback: F,
    ) -> Result<TcpConnection, WorkerError>
    where
        F: FnMut(&QueueStatus) -> Result<bool, WorkerError>,
    {
        let params = self.apply(params);
        let mut connection = match self {
            ConnectStrategy::Receptionist(address) => {
                TcpConnection::connect(address, &params).await?
            }
            ConnectStrategy::Locator {
                hostname,
                credentials,
            } => {
                Locator::new(hostname, credentials.clone())
                    .connect(&params, queue_callback)
                    .await?
            }
        };

        let message = format!("Successfully connected using the {}", self.name());
        info!(worker_id = connection.worker_id(), "{message}");
        connection.send_log_message(LogLevel::Info, logger_name, &message);
        Ok(connection)
    }
}

/// Queue callback used by the binaries: announces every wait on stdout and
/// gives up on the first queue error.
pub fn queue_progress(worker_type: &str) -> impl FnMut(&QueueStatus) -> Result<bool, WorkerError> {
    let worker_type = worker_type.to_string();
    move |status| {
        if let Some(error) = status.error() {
            return Err(WorkerError::Queueing(error.to_string()));
        }
        println!("Worker of type '{worker_type}' connecting through locator: queueing.");
        Ok(true)
    }
}
