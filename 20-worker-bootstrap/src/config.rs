//! Settings and parameter bundles handed to the connect strategies.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Name attached to every log message the worker forwards to the platform.
pub const LOGGER_NAME: &str = "worker-bootstrap";

pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Network transport used for the worker session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    #[default]
    Tcp,
}

/// Process-wide settings assembled from the command line.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub worker_type: String,
    pub logger_name: String,
    pub transport: TransportMode,
    pub poll_timeout: Duration,
    pub connect_timeout: Duration,
}

impl WorkerSettings {
    pub fn new(worker_type: impl Into<String>) -> Self {
        Self {
            worker_type: worker_type.into(),
            logger_name: LOGGER_NAME.to_string(),
            transport: TransportMode::Tcp,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn connection_parameters(&self) -> ConnectionParameters {
        ConnectionParameters {
            worker_type: self.worker_type.clone(),
            transport: self.transport,
            use_external_ip: false,
            connect_timeout: self.connect_timeout,
        }
    }
}

/// Parameters for a single connect attempt.
///
/// `use_external_ip` is overwritten by the chosen connect strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub worker_type: String,
    pub transport: TransportMode,
    pub use_external_ip: bool,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceptionistAddress {
    pub hostname: String,
    pub port: u16,
    pub worker_id: String,
}

impl ReceptionistAddress {
    pub fn authority(&self) -> String {
        authority(&self.hostname, self.port)
    }
}

/// `host:port`, with IPv6 hosts in brackets.
pub(crate) fn authority(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct LocatorCredentials {
    pub project_name: String,
    pub deployment_id: String,
    pub login_token: String,
}

impl std::fmt::Debug for LocatorCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocatorCredentials")
            .field("project_name", &self.project_name)
            .field("deployment_id", &self.deployment_id)
            .field("login_token", &"<redacted>")
            .finish()
    }
}
