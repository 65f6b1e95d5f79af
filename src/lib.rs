//! Telegram bot that reposts AliExpress links as affiliate links.

pub mod affiliate;
pub mod caption;
pub mod config;
pub mod describer;
pub mod error;
pub mod links;
pub mod models;
pub mod pipeline;
pub mod resolver;
pub mod scraper;
pub mod telegram;
pub mod traits;
