use std::io;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    config::TransportMode,
    op::{LogLevel, Op},
};

const LINE_ENDINGS: &[char] = &['\n', '\r'];

/// Longest line `read_message` accepts, delimiter included.
pub const MAX_LINE_BYTES: u64 = 1024 * 1024;

/// Messages a worker sends to a receptionist endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerToEndpoint {
    Handshake {
        worker_type: String,
        worker_id: String,
        use_external_ip: bool,
        transport: TransportMode,
    },
    Log {
        level: LogLevel,
        logger_name: String,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EndpointToWorker {
    Accepted { worker_id: String },
    Rejected { reason: String },
    Operation { op: Op },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerToLocator {
    Login {
        project_name: String,
        deployment_id: String,
        login_token: String,
        worker_type: String,
        use_external_ip: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocatorToWorker {
    Queued {
        #[serde(default)]
        error: Option<String>,
    },
    Admitted {
        hostname: String,
        port: u16,
        worker_id: String,
    },
    Denied {
        reason: String,
    },
}

/// Reads the next non-blank JSON line. `Ok(None)` means the peer closed the stream.
pub async fn read_message<R, T>(reader: &mut R) -> io::Result<Option<T>>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    let mut line = String::new();
    loop {
        line.clear();
        // Capped so a peer that never sends a newline cannot grow the buffer without bound.
        let bytes = (&mut *reader)
            .take(MAX_LINE_BYTES)
            .read_line(&mut line)
            .await?;
        if bytes == 0 {
            return Ok(None);
        }
        if bytes as u64 == MAX_LINE_BYTES && !line.ends_with('\n') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("message longer than {MAX_LINE_BYTES} bytes"),
            ));
        }

        let trimmed = line.trim_end_matches(LINE_ENDINGS);
        if trimmed.is_empty() {
            continue;
        }

        let parsed = serde_json::from_str(trimmed).map_err(to_io_error)?;
        return Ok(Some(parsed));
    }
}

/// Writes one message as a single JSON line and flushes it.
pub async fn write_message<W, T>(writer: &mut W, message: &T) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut encoded = serde_json::to_vec(message).map_err(to_io_error)?;
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}

fn to_io_error(err: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}
