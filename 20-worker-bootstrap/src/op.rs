//! Inbound operations delivered by the platform.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectOp {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessageOp {
    pub level: LogLevel,
    pub message: String,
}

/// A worker flag was set (`Some`) or cleared (`None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagUpdateOp {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Any operation the bootstrap layer does not interpret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherOp {
    pub name: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Op {
    Disconnect(DisconnectOp),
    LogMessage(LogMessageOp),
    FlagUpdate(FlagUpdateOp),
    Other(OtherOp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Disconnect,
    LogMessage,
    FlagUpdate,
    Other,
}

impl Op {
    pub fn kind(&self) -> OpKind {
        match self {
            Op::Disconnect(_) => OpKind::Disconnect,
            Op::LogMessage(_) => OpKind::LogMessage,
            Op::FlagUpdate(_) => OpKind::FlagUpdate,
            Op::Other(_) => OpKind::Other,
        }
    }

    pub fn disconnect(reason: impl Into<String>) -> Self {
        Op::Disconnect(DisconnectOp {
            reason: reason.into(),
        })
    }

    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Op::LogMessage(LogMessageOp {
            level,
            message: message.into(),
        })
    }
}

/// The operations returned by a single poll.
///
/// Consumed by value when dispatched, so a batch can only be walked once and
/// is released as soon as dispatch returns.
#[derive(Debug, Default)]
pub struct OpList {
    ops: Vec<Op>,
}

impl OpList {
    pub fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl From<Vec<Op>> for OpList {
    fn from(ops: Vec<Op>) -> Self {
        Self::new(ops)
    }
}

impl IntoIterator for OpList {
    type Item = Op;
    type IntoIter = std::vec::IntoIter<Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}
