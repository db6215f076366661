//! Command Handler module for `/start` and `/hello`

use std::sync::Arc;

use tracing::debug;

use crate::localization::{t, t_args};

use super::dispatcher::HandlerResult;
use super::events::{CommandInvocation, Messenger};

/// Greeting for `/hello [name...]`
pub fn greeting(args: &[String]) -> String {
    if args.is_empty() {
        t("hello-generic")
    } else {
        let name = args.join(" ");
        t_args("hello-named", &[("name", name.as_str())])
    }
}

/// Usage text for `/start`
pub fn usage() -> String {
    t("start-usage")
}

pub async fn answer_hello(messenger: Arc<dyn Messenger>, cmd: CommandInvocation) -> HandlerResult {
    debug!(user_id = cmd.origin.chat_id, args = cmd.args.len(), "Answering /hello");
    messenger.send_reply(cmd.origin, &greeting(&cmd.args)).await?;
    Ok(())
}

pub async fn answer_start(messenger: Arc<dyn Messenger>, cmd: CommandInvocation) -> HandlerResult {
    debug!(user_id = cmd.origin.chat_id, command = %cmd.name, "Answering with usage text");
    messenger.send_reply(cmd.origin, &usage()).await?;
    Ok(())
}
