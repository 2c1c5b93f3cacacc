//! Fake platform endpoints shared by the integration tests.
#![allow(dead_code)]

use std::{net::SocketAddr, time::Duration};

use anyhow::{anyhow, Context, Result};
use tokio::{
    io::BufReader,
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpListener,
    },
    time::timeout,
};
use worker_bootstrap::{
    message::{
        read_message, write_message, EndpointToWorker, LocatorToWorker, WorkerToEndpoint,
        WorkerToLocator,
    },
    op::{LogLevel, Op},
};

pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// A receptionist that accepts one worker at a time.
pub struct FakeEndpoint {
    listener: TcpListener,
}

pub struct Handshake {
    pub worker_type: String,
    pub worker_id: String,
    pub use_external_ip: bool,
}

pub struct LogRecord {
    pub level: LogLevel,
    pub logger_name: String,
    pub message: String,
}

pub struct EndpointSession {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl FakeEndpoint {
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Ok(Self { listener })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts a worker and answers its handshake with `accepted`.
    pub async fn accept(&self) -> Result<(EndpointSession, Handshake)> {
        let (mut session, handshake) = self.accept_handshake().await?;
        session
            .send(&EndpointToWorker::Accepted {
                worker_id: handshake.worker_id.clone(),
            })
            .await?;
        Ok((session, handshake))
    }

    pub async fn accept_handshake(&self) -> Result<(EndpointSession, Handshake)> {
        let (stream, _) = timeout(READ_TIMEOUT, self.listener.accept())
            .await
            .context("timed out waiting for worker to connect")??;
        let (reader, writer) = stream.into_split();
        let mut session = EndpointSession {
            reader: BufReader::new(reader),
            writer,
        };

        match session.next().await? {
            Some(WorkerToEndpoint::Handshake {
                worker_type,
                worker_id,
                use_external_ip,
                ..
            }) => Ok((
                session,
                Handshake {
                    worker_type,
                    worker_id,
                    use_external_ip,
                },
            )),
            other => Err(anyhow!("expected handshake, got {other:?}")),
        }
    }
}

impl EndpointSession {
    pub async fn send(&mut self, message: &EndpointToWorker) -> Result<()> {
        write_message(&mut self.writer, message).await?;
        Ok(())
    }

    pub async fn send_op(&mut self, op: Op) -> Result<()> {
        self.send(&EndpointToWorker::Operation { op }).await
    }

    pub async fn next(&mut self) -> Result<Option<WorkerToEndpoint>> {
        let message = timeout(READ_TIMEOUT, read_message(&mut self.reader))
            .await
            .context("timed out waiting for worker message")??;
        Ok(message)
    }

    pub async fn expect_log(&mut self) -> Result<LogRecord> {
        match self.next().await? {
            Some(WorkerToEndpoint::Log {
                level,
                logger_name,
                message,
            }) => Ok(LogRecord {
                level,
                logger_name,
                message,
            }),
            other => Err(anyhow!("expected log message, got {other:?}")),
        }
    }
}

/// A locator that serves a single scripted login.
pub struct FakeLocator {
    listener: TcpListener,
}

pub struct Login {
    pub project_name: String,
    pub deployment_id: String,
    pub login_token: String,
    pub use_external_ip: bool,
}

impl FakeLocator {
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Ok(Self { listener })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Reads the login and then plays `responses` back to the worker.
    pub async fn serve(&self, responses: Vec<LocatorToWorker>) -> Result<Login> {
        let (stream, _) = timeout(READ_TIMEOUT, self.listener.accept())
            .await
            .context("timed out waiting for worker to reach the locator")??;
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let login = match timeout(READ_TIMEOUT, read_message(&mut reader)).await?? {
            Some(WorkerToLocator::Login {
                project_name,
                deployment_id,
                login_token,
                use_external_ip,
                ..
            }) => Login {
                project_name,
                deployment_id,
                login_token,
                use_external_ip,
            },
            None => return Err(anyhow!("worker closed before logging in")),
        };

        for response in responses {
            write_message(&mut writer, &response).await?;
        }

        Ok(login)
    }
}

pub fn queued() -> LocatorToWorker {
    LocatorToWorker::Queued { error: None }
}

pub fn admitted(addr: SocketAddr, worker_id: &str) -> LocatorToWorker {
    LocatorToWorker::Admitted {
        hostname: addr.ip().to_string(),
        port: addr.port(),
        worker_id: worker_id.to_string(),
    }
}
