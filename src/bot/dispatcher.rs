//! Handler registry routing [`IncomingEvent`]s to commands, filters and the error handler

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, warn};

use super::events::{CommandInvocation, ErrorEvent, IncomingEvent, Messenger};

pub type HandlerResult = anyhow::Result<()>;
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

type CommandHandler = Arc<dyn Fn(Arc<dyn Messenger>, CommandInvocation) -> HandlerFuture + Send + Sync>;
type EventPredicate = Arc<dyn Fn(&IncomingEvent) -> bool + Send + Sync>;
type EventHandler = Arc<dyn Fn(Arc<dyn Messenger>, IncomingEvent) -> HandlerFuture + Send + Sync>;
type ErrorHandler = Arc<dyn Fn(ErrorEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// What happened to a dispatched event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler ran and succeeded
    Handled,
    /// A handler ran and failed; the error handler was invoked
    Failed,
    /// An error event was passed to the error handler
    ErrorReported,
    /// No handler matched
    Unhandled,
}

#[derive(Default)]
pub struct ChatDispatcher {
    commands: HashMap<String, CommandHandler>,
    filters: Vec<(EventPredicate, EventHandler)>,
    error_handler: Option<ErrorHandler>,
}

impl ChatDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler of `/name`. Names are matched case-insensitively.
    pub fn register_command<F, Fut>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(Arc<dyn Messenger>, CommandInvocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let name = name.trim_start_matches('/').to_lowercase();
        let boxed: CommandHandler = Arc::new(
            move |messenger: Arc<dyn Messenger>, cmd: CommandInvocation| -> HandlerFuture {
                Box::pin(handler(messenger, cmd))
            },
        );
        self.commands.insert(name, boxed);
        self
    }

    /// Register a handler for events matching `predicate`. First match wins.
    pub fn register_message_filter<P, F, Fut>(&mut self, predicate: P, handler: F) -> &mut Self
    where
        P: Fn(&IncomingEvent) -> bool + Send + Sync + 'static,
        F: Fn(Arc<dyn Messenger>, IncomingEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let boxed: EventHandler = Arc::new(
            move |messenger: Arc<dyn Messenger>, event: IncomingEvent| -> HandlerFuture {
                Box::pin(handler(messenger, event))
            },
        );
        self.filters.push((Arc::new(predicate), boxed));
        self
    }

    pub fn register_error_handler<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(ErrorEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let boxed: ErrorHandler = Arc::new(
            move |event: ErrorEvent| -> Pin<Box<dyn Future<Output = ()> + Send>> {
                Box::pin(handler(event))
            },
        );
        self.error_handler = Some(boxed);
        self
    }

    /// Route one event. Handler errors never escape this call.
    pub async fn dispatch(&self, messenger: Arc<dyn Messenger>, event: IncomingEvent) -> DispatchOutcome {
        let origin = event.origin();

        let result = match event {
            IncomingEvent::Error(error) => {
                self.report(error).await;
                return DispatchOutcome::ErrorReported;
            }
            IncomingEvent::Command(cmd) => match self.commands.get(&cmd.name) {
                Some(handler) => {
                    debug!(command = %cmd.name, chat_id = cmd.origin.chat_id, "Dispatching command");
                    handler(messenger, cmd).await
                }
                None => match self.find_filter(&IncomingEvent::Command(cmd.clone())) {
                    Some(handler) => handler(messenger, IncomingEvent::Command(cmd)).await,
                    None => {
                        debug!(command = %cmd.name, "No handler for command");
                        return DispatchOutcome::Unhandled;
                    }
                },
            },
            event => match self.find_filter(&event) {
                Some(handler) => handler(messenger, event).await,
                None => {
                    debug!(?origin, "No handler for event");
                    return DispatchOutcome::Unhandled;
                }
            },
        };

        match result {
            Ok(()) => DispatchOutcome::Handled,
            Err(cause) => {
                self.report(ErrorEvent { origin, cause }).await;
                DispatchOutcome::Failed
            }
        }
    }

    fn find_filter(&self, event: &IncomingEvent) -> Option<EventHandler> {
        self.filters
            .iter()
            .find(|(predicate, _)| predicate(event))
            .map(|(_, handler)| Arc::clone(handler))
    }

    async fn report(&self, error: ErrorEvent) {
        match &self.error_handler {
            Some(handler) => handler(error).await,
            None => warn!(origin = ?error.origin, error = %error.cause, "Unhandled error event"),
        }
    }
}
