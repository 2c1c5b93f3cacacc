//! Poll-and-dispatch loop that runs once a connection is established.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::{
    config::WorkerSettings,
    connection::Connection,
    dispatcher::Dispatcher,
    error::WorkerError,
    op::{LogLevel, LogMessageOp},
};

/// How the loop ended when no fatal error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Disconnected { reason: String },
}

/// State owned by the loop and mutated by its handlers.
pub struct LoopState<C> {
    connection: C,
    logger_name: String,
    is_connected: bool,
    disconnect_reason: Option<String>,
}

impl<C> LoopState<C> {
    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }
}

pub struct WorkerLoop<C> {
    state: LoopState<C>,
    dispatcher: Dispatcher<LoopState<C>>,
    poll_timeout: Duration,
}

impl<C: Connection + 'static> WorkerLoop<C> {
    /// Wraps an established connection and registers the disconnect and
    /// log-message handlers.
    pub fn new(connection: C, settings: &WorkerSettings) -> Self {
        let mut dispatcher = Dispatcher::new();

        dispatcher.on_disconnect(|state: &mut LoopState<C>, op| {
            eprintln!("[disconnect] {}", op.reason);
            state.is_connected = false;
            state.disconnect_reason = Some(op.reason.clone());
            Ok(())
        });

        dispatcher.on_log_message(|state: &mut LoopState<C>, op| {
            state
                .connection
                .send_log_message(op.level, &state.logger_name, &op.message);
            log_locally(op);
            if op.level == LogLevel::Fatal {
                return Err(WorkerError::FatalLog(op.message.clone()));
            }
            Ok(())
        });

        Self {
            state: LoopState {
                connection,
                logger_name: settings.logger_name.clone(),
                is_connected: true,
                disconnect_reason: None,
            },
            dispatcher,
            poll_timeout: settings.poll_timeout,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected
    }

    /// Extra handlers must be registered before [`WorkerLoop::run`].
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher<LoopState<C>> {
        &mut self.dispatcher
    }

    /// Polls once and dispatches the batch.
    pub async fn step(&mut self) -> Result<(), WorkerError> {
        let ops = self
            .state
            .connection
            .poll_operations(self.poll_timeout)
            .await;
        if !ops.is_empty() {
            debug!(count = ops.len(), "dispatching operations");
        }
        self.dispatcher.process(&mut self.state, ops)
    }

    /// Runs until the platform disconnects the worker or a fatal error is
    /// raised. The connection is closed exactly once on either path.
    pub async fn run(mut self) -> Result<Termination, WorkerError> {
        info!(poll_timeout = ?self.poll_timeout, "worker loop running");
        let outcome = self.drive().await;

        let WorkerLoop { state, .. } = self;
        let reason = state
            .disconnect_reason
            .unwrap_or_else(|| "disconnected".to_string());
        state.connection.close().await;

        outcome.map(|()| Termination::Disconnected { reason })
    }

    async fn drive(&mut self) -> Result<(), WorkerError> {
        while self.state.is_connected {
            self.step().await?;
        }
        Ok(())
    }
}

fn log_locally(op: &LogMessageOp) {
    match op.level {
        LogLevel::Debug => debug!(text = %op.message, "platform log"),
        LogLevel::Info => info!(text = %op.message, "platform log"),
        LogLevel::Warn => warn!(text = %op.message, "platform log"),
        LogLevel::Error | LogLevel::Fatal => {
            error!(text = %op.message, level = ?op.level, "platform log")
        }
    }
}
