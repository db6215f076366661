//! Platform-neutral events and the messaging seam used by the handlers

use async_trait::async_trait;

use crate::errors::PlatformDeliveryError;

/// The chat and message an event originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub chat_id: i64,
    pub message_id: i32,
}

/// One of the sizes the platform provides for a photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoVariant {
    pub file_ref: String,
    pub width: u32,
    pub height: u32,
    pub file_size: Option<u32>,
}

/// A `/command arg1 arg2` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub origin: Origin,
    pub name: String,
    pub args: Vec<String>,
}

/// A photo message; `variants` are ordered from smallest to largest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoMessage {
    pub origin: Origin,
    pub variants: Vec<PhotoVariant>,
}

impl PhotoMessage {
    /// The highest-resolution variant, i.e. the last one
    pub fn largest(&self) -> Option<&PhotoVariant> {
        self.variants.last()
    }
}

/// An error surfaced by a handler or by the platform
#[derive(Debug)]
pub struct ErrorEvent {
    pub origin: Option<Origin>,
    pub cause: anyhow::Error,
}

#[derive(Debug)]
pub enum IncomingEvent {
    Command(CommandInvocation),
    Photo(PhotoMessage),
    Error(ErrorEvent),
    /// Any other message (plain text, stickers, ...)
    Unsupported { origin: Origin },
}

impl IncomingEvent {
    pub fn origin(&self) -> Option<Origin> {
        match self {
            IncomingEvent::Command(cmd) => Some(cmd.origin),
            IncomingEvent::Photo(photo) => Some(photo.origin),
            IncomingEvent::Error(err) => err.origin,
            IncomingEvent::Unsupported { origin } => Some(*origin),
        }
    }

    pub fn is_photo(&self) -> bool {
        matches!(self, IncomingEvent::Photo(_))
    }

    pub fn is_command(&self) -> bool {
        matches!(self, IncomingEvent::Command(_))
    }

    /// Build an event from the text of a message, if it is a command
    ///
    /// `/hello@my_bot John   Smith` gives the command `hello` with the
    /// arguments `["John", "Smith"]`. A command mentioning a bot other than
    /// `bot_username` is addressed to that bot and becomes `Unsupported`.
    /// Without a known username every mention is accepted.
    pub fn parse_command(origin: Origin, text: &str, bot_username: Option<&str>) -> Option<Self> {
        let mut words = text.split_whitespace();
        let head = words.next()?.strip_prefix('/')?;
        let (name, mention) = match head.split_once('@') {
            Some((name, mention)) => (name, Some(mention)),
            None => (head, None),
        };
        if name.is_empty() {
            return None;
        }

        if let (Some(mention), Some(username)) = (mention, bot_username) {
            if !mention.eq_ignore_ascii_case(username.trim_start_matches('@')) {
                return Some(IncomingEvent::Unsupported { origin });
            }
        }

        Some(IncomingEvent::Command(CommandInvocation {
            origin,
            name: name.to_lowercase(),
            args: words.map(str::to_string).collect(),
        }))
    }
}

/// Sends replies and fetches files on the messaging platform
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Reply to the message identified by `origin`
    async fn send_reply(&self, origin: Origin, text: &str) -> Result<(), PlatformDeliveryError>;

    /// Download the content of a platform file
    async fn fetch_file(&self, file_ref: &str) -> Result<Vec<u8>, PlatformDeliveryError>;
}
