use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::affiliate::AffiliateBuilder;
use crate::caption;
use crate::config::Config;
use crate::describer::{FALLBACK_DESCRIPTION, OpenAiDescriber};
use crate::links::{self, LinkExtractor};
use crate::models::{
    AffiliateLink, IncomingMessage, Media, OutgoingCaption, ProductId, ProductMetadata, Reply,
};
use crate::resolver::LinkResolver;
use crate::scraper::MetadataScraper;
use crate::traits::{Describer, Transport};

/// Everything needed to turn an incoming message into an affiliate repost.
///
/// Holds no per-message state, so one instance is shared by all handlers.
#[derive(Clone)]
pub struct AffiliateBot {
    extractor: LinkExtractor,
    resolver: LinkResolver,
    scraper: MetadataScraper,
    builder: AffiliateBuilder,
    describer: Option<Arc<dyn Describer>>,
    generate_images: bool,
    generic_fallback: bool,
}

impl AffiliateBot {
    pub fn new(config: &Config) -> Result<Self> {
        let describer = match &config.openai {
            Some(openai) => Some(Arc::new(OpenAiDescriber::new(
                openai.api_key.clone(),
                openai.api_base.clone(),
                openai.model.clone(),
                config.http_timeout,
            )?) as Arc<dyn Describer>),
            None => {
                info!("OPENAI_API_KEY not set - AI descriptions disabled");
                None
            }
        };

        Ok(Self {
            extractor: LinkExtractor::default(),
            resolver: LinkResolver::new(config.http_timeout)?,
            scraper: MetadataScraper::new(config.http_timeout)?,
            builder: AffiliateBuilder::new(config.affiliate_id.clone(), config.strategy),
            describer,
            generate_images: config.openai.as_ref().is_some_and(|o| o.generate_images),
            generic_fallback: config.generic_fallback,
        })
    }

    pub fn with_extractor(mut self, extractor: LinkExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_describer(mut self, describer: Arc<dyn Describer>, generate_images: bool) -> Self {
        self.describer = Some(describer);
        self.generate_images = generate_images;
        self
    }

    /// Runs the link pipeline for one message and returns what the transport should do.
    ///
    /// Links are tried in message order and the first one that yields a product id
    /// is reposted. When none does, a bare home-page link gets the generic partner
    /// link if that fallback is enabled; everything else is [`Reply::Ignore`].
    pub async fn process(&self, message: &IncomingMessage) -> Reply {
        let candidates: Vec<_> = self.extractor.extract(&message.text).collect();
        if candidates.is_empty() {
            return Reply::Ignore;
        }

        let mut saw_bare_link = false;
        let mut found = None;
        for candidate in candidates {
            info!(chat_id = message.chat_id, url = %candidate.url, "AliExpress link found");
            if links::is_bare_apex(&candidate.url) {
                saw_bare_link = true;
                continue;
            }

            let resolved = self.resolver.resolve_link(candidate).await;
            match links::parse_product_id(&resolved.url) {
                Some(product_id) => {
                    found = Some((product_id, resolved));
                    break;
                }
                None => warn!(url = %resolved.url, "No product id found"),
            }
        }

        let Some((product_id, resolved)) = found else {
            if !(saw_bare_link && self.generic_fallback) {
                return Reply::Ignore;
            }
            info!(chat_id = message.chat_id, "Bare AliExpress link, using generic partner link");
            let caption = caption::compose(
                &ProductMetadata::default(),
                None,
                &self.builder.generic(),
                message.sender_name.as_deref(),
                None,
            );
            return Self::repost(message, caption);
        };
        info!(product_id = %product_id, "Product id found");

        let link = self.builder.build(&product_id, &resolved.url);
        info!(product_id = %product_id, link = %link, "Affiliate link built");

        let (metadata, description) = tokio::join!(
            self.scraper.scrape(&resolved.url),
            self.describe(&product_id)
        );
        let metadata = metadata.into_metadata();

        let generated_image = if metadata.video_url.is_none() && metadata.image_url.is_none() {
            self.generated_image(&product_id).await
        } else {
            None
        };

        let caption = caption::compose(
            &metadata,
            description.as_deref(),
            &link,
            message.sender_name.as_deref(),
            generated_image,
        );
        Self::repost(message, caption)
    }

    /// Processes `message` and performs the resulting delete and send.
    pub async fn handle(&self, transport: &dyn Transport, message: &IncomingMessage) -> Reply {
        let reply = self.process(message).await;
        deliver(transport, &reply).await;
        reply
    }

    pub fn affiliate_link(&self, product_id: &ProductId, resolved_url: &str) -> AffiliateLink {
        self.builder.build(product_id, resolved_url)
    }

    async fn describe(&self, product_id: &ProductId) -> Option<String> {
        let describer = self.describer.as_ref()?;
        match describer.describe(product_id).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(product_id = %product_id, error = %e, "Description generation failed");
                Some(FALLBACK_DESCRIPTION.to_string())
            }
        }
    }

    async fn generated_image(&self, product_id: &ProductId) -> Option<String> {
        if !self.generate_images {
            return None;
        }
        let describer = self.describer.as_ref()?;
        match describer.generate_image(product_id).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(product_id = %product_id, error = %e, "Image generation failed");
                None
            }
        }
    }

    fn repost(message: &IncomingMessage, caption: OutgoingCaption) -> Reply {
        Reply::Repost {
            chat_id: message.chat_id,
            delete_message_id: message.message_id,
            caption,
        }
    }
}

/// Deletes the original message, then sends the caption. Failures are logged, never retried.
pub async fn deliver(transport: &dyn Transport, reply: &Reply) {
    let Reply::Repost {
        chat_id,
        delete_message_id,
        caption,
    } = reply
    else {
        return;
    };

    match transport.delete_message(*chat_id, *delete_message_id).await {
        Ok(()) => info!(chat_id, message_id = delete_message_id, "Original message deleted"),
        Err(e) => warn!(chat_id, error = %e, "Could not delete original message"),
    }

    let sent = match &caption.media {
        Some(Media::Video(url)) => transport.send_video(*chat_id, url, &caption.text).await,
        Some(Media::Photo(url)) => transport.send_photo(*chat_id, url, &caption.text).await,
        None => transport.send_text(*chat_id, &caption.text).await,
    };

    match sent {
        Ok(()) => info!(chat_id, "Affiliate message sent"),
        Err(e) => error!(chat_id, error = %e, "Failed to send affiliate message"),
    }
}
