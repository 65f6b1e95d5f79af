use anyhow::Result;
use tracing::info;

use aliexpress_affiliate_bot::config::Config;
use aliexpress_affiliate_bot::pipeline::AffiliateBot;
use aliexpress_affiliate_bot::telegram;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("Starting AliExpress affiliate bot");

    let config = Config::from_env()?;
    info!(
        strategy = ?config.strategy,
        ai = config.openai.is_some(),
        mode = ?config.mode,
        "Configuration loaded"
    );

    let app = AffiliateBot::new(&config)?;
    telegram::run(&config, app).await
}
