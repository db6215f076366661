use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use tracing::{error, info};

use photo_describer::bot::{build_dispatcher, PhotoHandler};
use photo_describer::config::{BotConfig, LogFormat};
use photo_describer::logging::init_logging;
use photo_describer::recognition::CloudmersiveClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let log_format = LogFormat::from_lookup(|key| std::env::var(key).ok()).unwrap_or_default();
    init_logging(log_format);

    info!("Starting Photo Describer Telegram Bot");

    // Startup errors are fatal: nothing is served with a broken configuration
    let config = BotConfig::from_env().inspect_err(|e| error!(error = %e, "Invalid configuration"))?;

    let describer = CloudmersiveClient::new(config.recognition_api_key.clone(), &config.recognition)?;
    let photo_handler = Arc::new(PhotoHandler::new(Arc::new(describer)));
    let dispatcher = build_dispatcher(photo_handler);

    let bot = Bot::new(config.telegram_token.expose());

    info!(transport = config.transport.name(), "Bot initialized, starting dispatcher");
    dispatcher.run(bot, &config.transport).await
}
