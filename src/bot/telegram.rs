//! Telegram transport: converts teloxide updates into [`IncomingEvent`]s and
//! runs the dispatcher in webhook or polling mode.

use std::fmt::Debug;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use teloxide::dispatching::{DefaultKey, ShutdownToken};
use teloxide::error_handlers::{ErrorHandler, LoggingErrorHandler};
use teloxide::prelude::*;
use teloxide::types::{FileId, MessageId, ReplyParameters};
use teloxide::update_listeners::{webhooks, Polling};
use tracing::{debug, info};

use crate::config::{TransportMode, TELEGRAM_FILE_TIMEOUT_SECS};
use crate::errors::PlatformDeliveryError;

use super::dispatcher::ChatDispatcher;
use super::events::{ErrorEvent, IncomingEvent, Messenger, Origin, PhotoMessage, PhotoVariant};

/// [`Messenger`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
    http: reqwest::Client,
}

impl TelegramMessenger {
    /// `download_timeout` bounds each file download, body included
    pub fn new(bot: Bot, download_timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(download_timeout).build()?;
        Ok(Self { bot, http })
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.bot.api_url().as_str().trim_end_matches('/'),
            self.bot.token(),
            file_path
        )
    }
}

/// Reply to `origin`, still delivered if that message was deleted meanwhile
pub fn reply_parameters(origin: Origin) -> ReplyParameters {
    ReplyParameters::new(MessageId(origin.message_id)).allow_sending_without_reply()
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_reply(&self, origin: Origin, text: &str) -> Result<(), PlatformDeliveryError> {
        self.bot
            .send_message(ChatId(origin.chat_id), text.to_owned())
            .reply_parameters(reply_parameters(origin))
            .await?;
        Ok(())
    }

    async fn fetch_file(&self, file_ref: &str) -> Result<Vec<u8>, PlatformDeliveryError> {
        let file = self.bot.get_file(FileId(file_ref.to_owned())).await?;
        let response = self
            .http
            .get(self.file_url(&file.path))
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// Convert a Telegram message into a platform-neutral event
///
/// Photo sizes keep Telegram's smallest-to-largest order. A photo wins over
/// its caption.
pub fn event_from_message(msg: &Message, bot_username: Option<&str>) -> IncomingEvent {
    let origin = Origin {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
    };

    if let Some(photos) = msg.photo() {
        return IncomingEvent::Photo(PhotoMessage {
            origin,
            variants: photos
                .iter()
                .map(|size| PhotoVariant {
                    file_ref: size.file.id.0.clone(),
                    width: size.width,
                    height: size.height,
                    file_size: Some(size.file.size),
                })
                .collect(),
        });
    }

    msg.text()
        .and_then(|text| IncomingEvent::parse_command(origin, text, bot_username))
        .unwrap_or(IncomingEvent::Unsupported { origin })
}

/// `<public_url>/<token>`, the URL registered with Telegram in webhook mode
pub fn webhook_url(public_url: &Url, token: &str) -> Result<Url> {
    let mut url = public_url.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("webhook public URL cannot be a base URL"))?
        .pop_if_empty()
        .push(token);
    Ok(url)
}

/// Forwards update listener errors to the chat dispatcher's error handler
struct ListenerErrorForwarder {
    chat_dispatcher: Arc<ChatDispatcher>,
    messenger: Arc<dyn Messenger>,
}

impl<E> ErrorHandler<E> for ListenerErrorForwarder
where
    E: Debug + Send + 'static,
{
    fn handle_error(self: Arc<Self>, error: E) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            let event = IncomingEvent::Error(ErrorEvent {
                origin: None,
                cause: anyhow::anyhow!("update listener error: {error:?}"),
            });
            self.chat_dispatcher
                .dispatch(Arc::clone(&self.messenger), event)
                .await;
        })
    }
}

/// The teloxide dispatcher wired to a [`ChatDispatcher`]
pub struct TelegramRuntime {
    bot: Bot,
    dispatcher: Dispatcher<Bot, anyhow::Error, DefaultKey>,
    listener_errors: Arc<ListenerErrorForwarder>,
}

impl TelegramRuntime {
    /// `bot_username` filters out commands addressed to other bots
    pub fn new(bot: Bot, chat_dispatcher: Arc<ChatDispatcher>, bot_username: Option<String>) -> Result<Self> {
        let messenger: Arc<dyn Messenger> = Arc::new(TelegramMessenger::new(
            bot.clone(),
            Duration::from_secs(TELEGRAM_FILE_TIMEOUT_SECS),
        )?);
        let listener_errors = Arc::new(ListenerErrorForwarder {
            chat_dispatcher: Arc::clone(&chat_dispatcher),
            messenger: Arc::clone(&messenger),
        });
        let bot_username: Arc<Option<String>> = Arc::new(bot_username);

        let handler = dptree::entry().branch(Update::filter_message().endpoint(
            move |msg: Message| {
                let chat_dispatcher = Arc::clone(&chat_dispatcher);
                let messenger = Arc::clone(&messenger);
                let bot_username = Arc::clone(&bot_username);
                async move {
                    let event = event_from_message(&msg, bot_username.as_deref());
                    let outcome = chat_dispatcher.dispatch(messenger, event).await;
                    debug!(user_id = %msg.chat.id, ?outcome, "Message dispatched");
                    Ok::<(), anyhow::Error>(())
                }
            },
        ));

        let dispatcher = Dispatcher::builder(bot.clone(), handler)
            .default_handler(|update| async move {
                debug!(update_id = ?update.id, "Ignoring non-message update");
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build();

        Ok(Self {
            bot,
            dispatcher,
            listener_errors,
        })
    }

    /// Token that stops [`TelegramRuntime::run`] from another task
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.dispatcher.shutdown_token()
    }

    /// Serve updates until Ctrl-C or until the shutdown token fires
    pub async fn run(mut self, mode: &TransportMode) -> Result<()> {
        match mode {
            TransportMode::Webhook {
                bind_address,
                port,
                public_url,
            } => {
                let address = SocketAddr::new(*bind_address, *port);
                let url = webhook_url(public_url, self.bot.token())?;
                info!(%address, public_url = %public_url, "Starting webhook listener");

                let listener =
                    webhooks::axum(self.bot.clone(), webhooks::Options::new(address, url)).await?;
                self.dispatcher
                    .dispatch_with_listener(listener, Arc::clone(&self.listener_errors))
                    .await;
            }
            TransportMode::Polling => {
                info!("Starting long polling");
                let listener = Polling::builder(self.bot.clone())
                    .delete_webhook()
                    .await
                    .build();
                self.dispatcher
                    .dispatch_with_listener(listener, Arc::clone(&self.listener_errors))
                    .await;
            }
        }

        info!("Dispatcher stopped");
        Ok(())
    }
}

impl ChatDispatcher {
    /// Serve Telegram updates with this dispatcher until terminated
    pub async fn run(self, bot: Bot, mode: &TransportMode) -> Result<()> {
        let me = bot.get_me().await?;
        let bot_username = me.user.username.clone();
        info!(username = ?bot_username, "Bot identity fetched");

        TelegramRuntime::new(bot, Arc::new(self), bot_username)?
            .run(mode)
            .await
    }
}
