//! Worker sessions with the platform.
//!
//! [`Connection`] is the seam the worker loop drives. [`TcpConnection`] is the
//! JSON-lines implementation used by the binaries: a reader task frames inbound
//! lines into operations so a poll timeout never abandons a half-read line.

use std::{collections::VecDeque, future::Future, time::Duration};

use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::mpsc,
    task::JoinHandle,
    time::{timeout, timeout_at, Instant},
};
use tracing::{debug, info, warn};

use crate::{
    config::{self, ConnectionParameters, ReceptionistAddress},
    error::ConnectionError,
    message::{read_message, write_message, EndpointToWorker, WorkerToEndpoint},
    op::{LogLevel, Op, OpList},
};

/// Upper bound on the number of operations returned by one poll.
pub const MAX_OPS_PER_POLL: usize = 512;

const INBOUND_CAPACITY: usize = 1024;

/// Upper bound on flushing queued logs and shutting the writer down in `close`.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

pub trait Connection {
    /// Queues a log message for the platform. Delivered on the next poll or on close.
    fn send_log_message(&mut self, level: LogLevel, logger_name: &str, message: &str);

    /// Waits up to `timeout` for operations and returns whatever arrived.
    fn poll_operations(&mut self, timeout: Duration) -> impl Future<Output = OpList>;

    /// Flushes queued log messages and shuts the session down.
    fn close(self) -> impl Future<Output = ()>;
}

pub struct TcpConnection {
    worker_id: String,
    writer: OwnedWriteHalf,
    inbound: mpsc::Receiver<Op>,
    outbound: VecDeque<WorkerToEndpoint>,
    reader_task: JoinHandle<()>,
    write_failed: bool,
}

impl TcpConnection {
    /// Connects to a receptionist endpoint and performs the worker handshake.
    pub async fn connect(
        address: &ReceptionistAddress,
        params: &ConnectionParameters,
    ) -> Result<Self, ConnectionError> {
        let addr = address.authority();
        match timeout(params.connect_timeout, handshake(address, params)).await {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::Timeout { addr }),
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    async fn flush_outbound(&mut self) -> std::io::Result<()> {
        while let Some(message) = self.outbound.front() {
            write_message(&mut self.writer, message).await?;
            self.outbound.pop_front();
        }
        Ok(())
    }
}

impl Connection for TcpConnection {
    fn send_log_message(&mut self, level: LogLevel, logger_name: &str, message: &str) {
        self.outbound.push_back(WorkerToEndpoint::Log {
            level,
            logger_name: logger_name.to_string(),
            message: message.to_string(),
        });
    }

    async fn poll_operations(&mut self, wait: Duration) -> OpList {
        let deadline = Instant::now() + wait;
        let mut ops = Vec::new();

        // A flush cut off mid-line leaves the stream unusable, so expiry ends the session.
        if !self.write_failed {
            let failure = match timeout_at(deadline, self.flush_outbound()).await {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(err.to_string()),
                Err(_) => Some(format!("write blocked for {wait:?}")),
            };
            if let Some(reason) = failure {
                self.write_failed = true;
                self.outbound.clear();
                ops.push(Op::disconnect(format!("failed to send to platform: {reason}")));
                return OpList::new(ops);
            }
        } else {
            self.outbound.clear();
        }

        match timeout_at(deadline, self.inbound.recv()).await {
            Ok(Some(op)) => ops.push(op),
            Ok(None) | Err(_) => return OpList::new(ops),
        }

        while ops.len() < MAX_OPS_PER_POLL {
            match self.inbound.try_recv() {
                Ok(op) => ops.push(op),
                Err(_) => break,
            }
        }

        OpList::new(ops)
    }

    async fn close(mut self) {
        let write_failed = self.write_failed;
        let shutdown = async {
            if !write_failed {
                if let Err(error) = self.flush_outbound().await {
                    warn!(?error, "failed to flush pending log messages");
                }
            }
            if let Err(error) = self.writer.shutdown().await {
                debug!(?error, "failed to shutdown connection writer cleanly");
            }
        };
        if timeout(CLOSE_TIMEOUT, shutdown).await.is_err() {
            warn!(
                worker_id = %self.worker_id,
                pending = self.outbound.len(),
                "platform stopped reading, dropping pending log messages"
            );
        }
        self.reader_task.abort();
        info!(worker_id = %self.worker_id, "connection closed");
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

/// Opens a JSON-lines stream to `host:port`.
pub(crate) async fn dial(
    host: &str,
    port: u16,
) -> Result<(BufReader<OwnedReadHalf>, OwnedWriteHalf), ConnectionError> {
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|source| ConnectionError::Unreachable {
            addr: config::authority(host, port),
            source,
        })?;
    let (reader, writer) = stream.into_split();
    Ok((BufReader::new(reader), writer))
}

async fn handshake(
    address: &ReceptionistAddress,
    params: &ConnectionParameters,
) -> Result<TcpConnection, ConnectionError> {
    let addr = address.authority();
    let (mut reader, mut writer) = dial(&address.hostname, address.port).await?;
    let io_error = |source| ConnectionError::Io {
        addr: addr.clone(),
        source,
    };

    write_message(
        &mut writer,
        &WorkerToEndpoint::Handshake {
            worker_type: params.worker_type.clone(),
            worker_id: address.worker_id.clone(),
            use_external_ip: params.use_external_ip,
            transport: params.transport,
        },
    )
    .await
    .map_err(io_error)?;

    let worker_id = match read_message::<_, EndpointToWorker>(&mut reader)
        .await
        .map_err(io_error)?
    {
        Some(EndpointToWorker::Accepted { worker_id }) => worker_id,
        Some(EndpointToWorker::Rejected { reason }) => {
            return Err(ConnectionError::Rejected { addr, reason });
        }
        Some(EndpointToWorker::Operation { .. }) => {
            return Err(ConnectionError::Rejected {
                addr,
                reason: "operation received before handshake completed".to_string(),
            });
        }
        None => return Err(ConnectionError::Closed { addr }),
    };

    info!(%addr, worker_id, "handshake accepted");

    let (tx, inbound) = mpsc::channel(INBOUND_CAPACITY);
    let reader_task = tokio::spawn(read_operations(reader, tx));

    Ok(TcpConnection {
        worker_id,
        writer,
        inbound,
        outbound: VecDeque::new(),
        reader_task,
        write_failed: false,
    })
}

async fn read_operations(mut reader: BufReader<OwnedReadHalf>, tx: mpsc::Sender<Op>) {
    let reason = loop {
        match read_message::<_, EndpointToWorker>(&mut reader).await {
            Ok(Some(EndpointToWorker::Operation { op })) => {
                if tx.send(op).await.is_err() {
                    return;
                }
            }
            Ok(Some(other)) => debug!(?other, "ignoring control message after handshake"),
            Ok(None) => break "connection closed by platform".to_string(),
            Err(err) => break format!("connection lost: {err}"),
        }
    };
    let _ = tx.send(Op::disconnect(reason)).await;
}
