//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `events`: platform-neutral events and the `Messenger` seam
//! - `dispatcher`: handler registry routing events to handlers
//! - `command_handler`: `/start` and `/hello`
//! - `photo_handler`: photo download, description and reply
//! - `telegram`: teloxide adapter and webhook/polling runtime

pub mod command_handler;
pub mod dispatcher;
pub mod events;
pub mod photo_handler;
pub mod telegram;

use std::sync::Arc;

use tracing::warn;

pub use dispatcher::{ChatDispatcher, DispatchOutcome};
pub use events::{IncomingEvent, Messenger, Origin};
pub use photo_handler::PhotoHandler;
pub use telegram::{TelegramMessenger, TelegramRuntime};

/// Build the dispatcher with the bot's fixed set of handlers
pub fn build_dispatcher(photo_handler: Arc<PhotoHandler>) -> ChatDispatcher {
    let mut dispatcher = ChatDispatcher::new();

    dispatcher
        .register_command("start", command_handler::answer_start)
        .register_command("hello", command_handler::answer_hello)
        .register_message_filter(IncomingEvent::is_photo, move |messenger, event| {
            let photo_handler = Arc::clone(&photo_handler);
            async move {
                if let IncomingEvent::Photo(photo) = event {
                    photo_handler.handle(messenger.as_ref(), &photo).await?;
                }
                Ok::<(), anyhow::Error>(())
            }
        })
        // Unknown commands get the usage text
        .register_message_filter(IncomingEvent::is_command, |messenger, event| async move {
            if let IncomingEvent::Command(cmd) = event {
                command_handler::answer_start(messenger, cmd).await?;
            }
            Ok::<(), anyhow::Error>(())
        })
        .register_error_handler(|event| async move {
            warn!(origin = ?event.origin, error = %event.cause, "Update caused error");
        });

    dispatcher
}
