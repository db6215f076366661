//! # Photo Describer Telegram Bot
//!
//! A Telegram bot that sends the photos it receives to the Cloudmersive image
//! recognition API and replies with a natural-language description.

pub mod bot;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod localization;
pub mod logging;
pub mod recognition;
