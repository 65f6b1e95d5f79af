//! Environment configuration.
//!
//! `TELEGRAM_BOT_TOKEN` is required; everything else has a default. Setting
//! `WEBHOOK_HOST` (or `RENDER_EXTERNAL_HOSTNAME`) switches from long polling to
//! webhook mode.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::affiliate::AffiliateStrategy;
use crate::describer::{DEFAULT_API_BASE, DEFAULT_MODEL};

pub const DEFAULT_AFFILIATE_ID: &str = "_EHN0NeQ";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub generate_images: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Polling,
    Webhook { host: String, port: u16 },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub affiliate_id: String,
    pub strategy: AffiliateStrategy,
    pub generic_fallback: bool,
    pub openai: Option<OpenAiConfig>,
    pub mode: RunMode,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_token = get("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN not set")?;
        let affiliate_id =
            get("AFFILIATE_ID").unwrap_or_else(|| DEFAULT_AFFILIATE_ID.to_string());
        let strategy = get("AFFILIATE_STRATEGY")
            .map(|s| s.parse::<AffiliateStrategy>())
            .transpose()?
            .unwrap_or_default();
        let generic_fallback =
            parse_flag(get("AFFILIATE_GENERIC_FALLBACK"), "AFFILIATE_GENERIC_FALLBACK")?;

        let openai = match get("OPENAI_API_KEY") {
            Some(api_key) => Some(OpenAiConfig {
                api_key,
                api_base: get("OPENAI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                generate_images: parse_flag(
                    get("OPENAI_GENERATE_IMAGES"),
                    "OPENAI_GENERATE_IMAGES",
                )?,
            }),
            None => None,
        };

        let mode = match get("WEBHOOK_HOST").or_else(|| get("RENDER_EXTERNAL_HOSTNAME")) {
            Some(host) => {
                let port = get("PORT")
                    .map(|p| p.parse::<u16>().with_context(|| format!("invalid PORT: {p}")))
                    .transpose()?
                    .unwrap_or(DEFAULT_PORT);
                RunMode::Webhook { host, port }
            }
            None => RunMode::Polling,
        };

        let timeout_secs = get("HTTP_TIMEOUT_SECS")
            .map(|s| {
                s.parse::<u64>()
                    .with_context(|| format!("invalid HTTP_TIMEOUT_SECS: {s}"))
            })
            .transpose()?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            bot_token,
            affiliate_id,
            strategy,
            generic_fallback,
            openai,
            mode,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_flag(value: Option<String>, key: &str) -> Result<bool> {
    match value.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => anyhow::bail!("invalid {key}: {other}"),
    }
}
