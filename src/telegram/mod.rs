//! # Telegram Transport
//!
//! This module connects the affiliate pipeline to Telegram through `teloxide`.
//! It receives text messages, hands them to [`AffiliateBot`], and carries out
//! the resulting delete-and-repost.
//!
//! ## Update Sources
//!
//! - **Long polling**: default when no public host is configured
//! - **Webhook**: when `WEBHOOK_HOST` or `RENDER_EXTERNAL_HOSTNAME` is set, an
//!   axum server listens on `0.0.0.0:<PORT>` and Telegram is pointed at
//!   `https://<host>/webhook`. Pending updates are dropped on registration.
//!
//! ## Permissions
//!
//! Deleting the original message needs the bot to be a chat admin with the
//! "delete messages" right. Without it the repost is still sent and the
//! failure is logged.
//!
//! ## Concurrency
//!
//! Every accepted message is processed on its own Tokio task, so a slow
//! product page never holds up other chats. The pipeline shares no mutable
//! state between tasks.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::payloads::{SendPhotoSetters, SendVideoSetters};
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId};
use teloxide::update_listeners::webhooks;
use tracing::{debug, info};
use url::Url;

use crate::config::{Config, RunMode};
use crate::error::TransportError;
use crate::models::IncomingMessage;
use crate::pipeline::AffiliateBot;
use crate::traits::Transport;

const WEBHOOK_PATH: &str = "/webhook";

/// [`Transport`] backed by the Telegram Bot API.
///
/// Cheap to clone: `teloxide::Bot` shares its HTTP client internally.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await
            .map_err(|e| TransportError::Delete(e.to_string()))?;
        Ok(())
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.bot
            .send_message(ChatId(chat_id), text.to_string())
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: &str,
    ) -> Result<(), TransportError> {
        let photo = media_file(photo_url)?;
        self.bot
            .send_photo(ChatId(chat_id), photo)
            .caption(caption.to_string())
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        Ok(())
    }

    async fn send_video(
        &self,
        chat_id: i64,
        video_url: &str,
        caption: &str,
    ) -> Result<(), TransportError> {
        let video = media_file(video_url)?;
        self.bot
            .send_video(ChatId(chat_id), video)
            .caption(caption.to_string())
            .await
            .map_err(|e| TransportError::Send(e.to_string()))?;
        Ok(())
    }
}

fn media_file(url: &str) -> Result<InputFile, TransportError> {
    Url::parse(url)
        .map(InputFile::url)
        .map_err(|e| TransportError::InvalidMedia(format!("{url}: {e}")))
}

/// Converts a Telegram message into pipeline input.
///
/// Returns `None` for messages without text and for bot commands.
pub fn incoming_message(msg: &Message) -> Option<IncomingMessage> {
    let text = msg.text()?;
    if text.starts_with('/') {
        return None;
    }

    Some(IncomingMessage {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
        sender_name: msg.from.as_ref().map(|user| user.first_name.clone()),
        text: text.to_string(),
    })
}

/// Starts receiving updates and processes them until the process is stopped.
pub async fn run(config: &Config, app: AffiliateBot) -> Result<()> {
    let bot = Bot::new(&config.bot_token);
    let transport = Arc::new(TelegramTransport::new(bot.clone()));

    let handler = move |msg: Message| {
        let app = app.clone();
        let transport = transport.clone();

        async move {
            match incoming_message(&msg) {
                Some(incoming) => {
                    debug!(
                        chat_id = incoming.chat_id,
                        message_id = incoming.message_id,
                        "Received text message"
                    );
                    tokio::spawn(async move {
                        app.handle(transport.as_ref(), &incoming).await;
                    });
                }
                None => debug!(chat_id = msg.chat.id.0, "Skipping non-text message"),
            }
            respond(())
        }
    };

    match &config.mode {
        RunMode::Polling => {
            info!("Starting long polling");
            teloxide::repl(bot, handler).await;
        }
        RunMode::Webhook { host, port } => {
            let address = SocketAddr::from(([0, 0, 0, 0], *port));
            let url = webhook_url(host)?;
            let options = webhooks::Options::new(address, url).drop_pending_updates();
            let listener = webhooks::axum(bot.clone(), options)
                .await
                .context("failed to register webhook")?;

            info!(host = %host, port = *port, "Webhook registered");
            teloxide::repl_with_listener(bot, handler, listener).await;
        }
    }

    Ok(())
}

fn webhook_url(host: &str) -> Result<Url> {
    let host = host
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    Url::parse(&format!("https://{host}{WEBHOOK_PATH}"))
        .with_context(|| format!("invalid webhook host: {host}"))
}
