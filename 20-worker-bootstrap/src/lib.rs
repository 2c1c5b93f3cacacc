//! Worker bootstrap for a remote simulation platform.
//!
//! A worker process connects through one of two strategies, then polls the
//! platform for batches of operations and dispatches them until it is
//! disconnected. Each module focuses on a concrete responsibility:
//!
//! - [`cli`] parses the command lines of the `external` and `managed` binaries.
//! - [`config`] holds worker settings and the per-attempt connection parameters.
//! - [`strategy`] selects between the receptionist and locator connect paths.
//! - [`locator`] logs in through the locator and waits out its queue.
//! - [`connection`] defines the [`connection::Connection`] seam and its TCP
//!   implementation.
//! - [`message`] provides the JSON line framing spoken over TCP.
//! - [`op`] describes inbound operations and the per-poll batch.
//! - [`dispatcher`] routes operations to handlers by kind.
//! - [`worker`] runs the poll-and-dispatch loop.
//! - [`bootstrap`] ties it together and maps outcomes to exit codes.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod locator;
pub mod message;
pub mod op;
pub mod strategy;
pub mod worker;
