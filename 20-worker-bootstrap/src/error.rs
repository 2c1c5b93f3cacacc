use std::io;

use thiserror::Error;

/// Exit status used for every failure path, including disconnects.
pub const ERROR_EXIT_STATUS: u8 = 1;

/// Failures while establishing a connection to a receptionist or locator.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to reach {addr}: {source}")]
    Unreachable {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("timed out connecting to {addr}")]
    Timeout { addr: String },

    #[error("connection rejected by {addr}: {reason}")]
    Rejected { addr: String, reason: String },

    #[error("{addr} closed the connection during the handshake")]
    Closed { addr: String },

    #[error("i/o error talking to {addr}: {source}")]
    Io {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("connection attempt cancelled while queueing")]
    Cancelled,
}

/// Conditions that end the worker process.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to connect: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Error while queueing: {0}")]
    Queueing(String),

    #[error("Fatal error: {0}")]
    FatalLog(String),
}
