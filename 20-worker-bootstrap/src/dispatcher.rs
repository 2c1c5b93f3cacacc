//! Routes operations to the handlers registered for their kind.

use std::collections::HashMap;

use crate::{
    error::WorkerError,
    op::{DisconnectOp, FlagUpdateOp, LogMessageOp, Op, OpKind, OpList, OtherOp},
};

pub type HandlerResult = Result<(), WorkerError>;

type Handler<S> = Box<dyn FnMut(&mut S, &Op) -> HandlerResult>;

/// Handler registry, generic over the state the handlers mutate.
///
/// Handlers for the same kind run in registration order. A handler error
/// stops the rest of the batch and is returned from [`Dispatcher::process`].
pub struct Dispatcher<S> {
    handlers: HashMap<OpKind, Vec<Handler<S>>>,
}

impl<S> Default for Dispatcher<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Dispatcher<S> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, kind: OpKind, handler: F)
    where
        F: FnMut(&mut S, &Op) -> HandlerResult + 'static,
    {
        self.handlers
            .entry(kind)
            .or_default()
            .push(Box::new(handler));
    }

    pub fn on_disconnect<F>(&mut self, mut handler: F)
    where
        F: FnMut(&mut S, &DisconnectOp) -> HandlerResult + 'static,
    {
        self.register(OpKind::Disconnect, move |state, op| match op {
            Op::Disconnect(op) => handler(state, op),
            _ => Ok(()),
        });
    }

    pub fn on_log_message<F>(&mut self, mut handler: F)
    where
        F: FnMut(&mut S, &LogMessageOp) -> HandlerResult + 'static,
    {
        self.register(OpKind::LogMessage, move |state, op| match op {
            Op::LogMessage(op) => handler(state, op),
            _ => Ok(()),
        });
    }

    pub fn on_flag_update<F>(&mut self, mut handler: F)
    where
        F: FnMut(&mut S, &FlagUpdateOp) -> HandlerResult + 'static,
    {
        self.register(OpKind::FlagUpdate, move |state, op| match op {
            Op::FlagUpdate(op) => handler(state, op),
            _ => Ok(()),
        });
    }

    pub fn on_other<F>(&mut self, mut handler: F)
    where
        F: FnMut(&mut S, &OtherOp) -> HandlerResult + 'static,
    {
        self.register(OpKind::Other, move |state, op| match op {
            Op::Other(op) => handler(state, op),
            _ => Ok(()),
        });
    }

    pub fn handler_count(&self, kind: OpKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    pub fn process(&mut self, state: &mut S, ops: OpList) -> HandlerResult {
        for op in ops {
            let Some(handlers) = self.handlers.get_mut(&op.kind()) else {
                continue;
            };
            for handler in handlers.iter_mut() {
                handler(state, &op)?;
            }
        }
        Ok(())
    }
}
