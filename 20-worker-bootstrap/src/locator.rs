//! Mediated connection through a locator service.
//!
//! The locator authenticates the worker with a login token, may keep it
//! waiting in a queue, and finally admits it to a deployment endpoint.

use tokio::time::timeout;
use tracing::{debug, info};

use crate::{
    config::{self, ConnectionParameters, LocatorCredentials, ReceptionistAddress},
    connection::{dial, TcpConnection},
    error::{ConnectionError, WorkerError},
    message::{read_message, write_message, LocatorToWorker, WorkerToLocator},
};

pub const DEFAULT_LOCATOR_PORT: u16 = 444;

/// Progress report delivered while the worker waits in the locator queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStatus {
    pub error: Option<String>,
}

impl QueueStatus {
    /// The queue error, ignoring empty strings.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().filter(|error| !error.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct Locator {
    host: String,
    port: u16,
    credentials: LocatorCredentials,
}

impl Locator {
    /// `hostname` is `host`, `host:port` or `[ipv6]:port`. A bare IPv6 address
    /// takes the default port.
    pub fn new(hostname: &str, credentials: LocatorCredentials) -> Self {
        let (host, port) = split_host_port(hostname);
        Self {
            host,
            port,
            credentials,
        }
    }

    pub fn authority(&self) -> String {
        config::authority(&self.host, self.port)
    }

    /// Logs in and waits for admission, calling `queue_callback` for every
    /// queue status. The callback returns `Ok(false)` to give up waiting.
    pub async fn connect<F>(
        &self,
        params: &ConnectionParameters,
        mut queue_callback: F,
    ) -> Result<TcpConnection, WorkerError>
    where
        F: FnMut(&QueueStatus) -> Result<bool, WorkerError>,
    {
        let addr = self.authority();
        let (mut reader, mut writer) =
            match timeout(params.connect_timeout, dial(&self.host, self.port)).await {
                Ok(result) => result?,
                Err(_) => return Err(ConnectionError::Timeout { addr }.into()),
            };
        let io_error = |source| ConnectionError::Io {
            addr: addr.clone(),
            source,
        };

        write_message(
            &mut writer,
            &WorkerToLocator::Login {
                project_name: self.credentials.project_name.clone(),
                deployment_id: self.credentials.deployment_id.clone(),
                login_token: self.credentials.login_token.clone(),
                worker_type: params.worker_type.clone(),
                use_external_ip: params.use_external_ip,
            },
        )
        .await
        .map_err(io_error)?;

        info!(
            %addr,
            project = %self.credentials.project_name,
            deployment = %self.credentials.deployment_id,
            "logged in to locator"
        );

        let endpoint = loop {
            match read_message::<_, LocatorToWorker>(&mut reader)
                .await
                .map_err(io_error)?
            {
                Some(LocatorToWorker::Queued { error }) => {
                    let status = QueueStatus { error };
                    debug!(?status, "queue status");
                    if !queue_callback(&status)? {
                        return Err(ConnectionError::Cancelled.into());
                    }
                }
                Some(LocatorToWorker::Admitted {
                    hostname,
                    port,
                    worker_id,
                }) => {
                    break ReceptionistAddress {
                        hostname,
                        port,
                        worker_id,
                    };
                }
                Some(LocatorToWorker::Denied { reason }) => {
                    return Err(ConnectionError::Rejected { addr, reason }.into());
                }
                None => return Err(ConnectionError::Closed { addr }.into()),
            }
        };

        info!(endpoint = %endpoint.authority(), worker_id = %endpoint.worker_id, "admitted by locator");
        Ok(TcpConnection::connect(&endpoint, params).await?)
    }
}

fn split_host_port(hostname: &str) -> (String, u16) {
    if let Some(rest) = hostname.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            let port = match tail.strip_prefix(':') {
                Some(port) => port.parse().ok(),
                None if tail.is_empty() => Some(DEFAULT_LOCATOR_PORT),
                None => None,
            };
            if let Some(port) = port.filter(|_| !host.is_empty()) {
                return (host.to_string(), port);
            }
        }
        return (hostname.to_string(), DEFAULT_LOCATOR_PORT);
    }

    // More than one colon is an unbracketed IPv6 address with no port.
    if let Some((host, port)) = hostname.split_once(':') {
        if !host.is_empty() && !port.contains(':') {
            if let Ok(port) = port.parse::<u16>() {
                return (host.to_string(), port);
            }
        }
    }
    (hostname.to_string(), DEFAULT_LOCATOR_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> LocatorCredentials {
        LocatorCredentials {
            project_name: "proj".into(),
            deployment_id: "dep1".into(),
            login_token: "tok".into(),
        }
    }

    #[test]
    fn hostname_without_port_uses_default() {
        let locator = Locator::new("locator.example.com", credentials());
        assert_eq!(locator.authority(), "locator.example.com:444");
    }

    #[test]
    fn hostname_with_port_is_split() {
        let locator = Locator::new("127.0.0.1:9000", credentials());
        assert_eq!(locator.authority(), "127.0.0.1:9000");

        let locator = Locator::new("host:notaport", credentials());
        assert_eq!((locator.host.as_str(), locator.port), ("host:notaport", 444));
    }

    #[test]
    fn ipv6_hosts_are_understood() {
        let locator = Locator::new("::1", credentials());
        assert_eq!((locator.host.as_str(), locator.port), ("::1", 444));

        let locator = Locator::new("[::1]:9000", credentials());
        assert_eq!((locator.host.as_str(), locator.port), ("::1", 9000));
        assert_eq!(locator.authority(), "[::1]:9000");

        let locator = Locator::new("[fe80::1]", credentials());
        assert_eq!((locator.host.as_str(), locator.port), ("fe80::1", 444));

        let locator = Locator::new("2001:db8::7:9000", credentials());
        assert_eq!(locator.port, 444);
    }

    #[test]
    fn empty_queue_error_is_not_an_error() {
        assert_eq!(QueueStatus { error: Some(String::new()) }.error(), None);
        assert_eq!(QueueStatus::default().error(), None);
        assert_eq!(
            QueueStatus {
                error: Some("invalid token".into())
            }
            .error(),
            Some("invalid token")
        );
    }

    #[test]
    fn credentials_debug_hides_token() {
        let rendered = format!("{:?}", credentials());
        assert!(rendered.contains("proj"));
        assert!(!rendered.contains("tok\""));
    }
}
