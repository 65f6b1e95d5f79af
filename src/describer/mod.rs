//! # OpenAI Describer
//!
//! Generates a short advertising blurb and, optionally, a product picture
//! through an OpenAI-compatible API using `async-openai`. The client runs on a
//! `reqwest` client built with the shared timeout, so a stalled API call ends
//! like any other outbound request.
//!
//! Failures are returned as [`FetchError`]; the pipeline turns them into the
//! fixed fallback text or into "no image".

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
        CreateImageRequestArgs, Image, ImageSize,
    },
};
use async_trait::async_trait;
use tracing::info;

use crate::error::FetchError;
use crate::models::ProductId;
use crate::traits::Describer;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const FALLBACK_DESCRIPTION: &str = "(Descrizione non disponibile.)";

const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f32 = 0.7;

#[derive(Clone)]
pub struct OpenAiDescriber {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiDescriber {
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        let config = OpenAIConfig::new()
            .with_api_key(api_key.into())
            .with_api_base(api_base.into().trim_end_matches('/').to_string());
        let client = Client::with_config(config).with_http_client(http_client);

        Ok(Self {
            client: Arc::new(client),
            model: model.into(),
        })
    }
}

#[async_trait]
impl Describer for OpenAiDescriber {
    async fn describe(&self, product_id: &ProductId) -> Result<String, FetchError> {
        let prompt = format!(
            "Genera una descrizione pubblicitaria per il prodotto AliExpress con ID {product_id}."
        );
        let message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?
            .into();
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message])
            .max_tokens(MAX_TOKENS)
            .temperature(TEMPERATURE)
            .build()?;

        let response = self.client.chat().create(request).await?;
        let description = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(FetchError::Missing("description"))?;

        info!(product_id = %product_id, "Description generated");
        Ok(description)
    }

    async fn generate_image(&self, product_id: &ProductId) -> Result<String, FetchError> {
        let request = CreateImageRequestArgs::default()
            .prompt(format!(
                "Fotografia realistica di un prodotto AliExpress (ID {product_id}), su sfondo bianco"
            ))
            .n(1)
            .size(ImageSize::S512x512)
            .build()?;

        let response = self.client.images().create(request).await?;
        let url = response
            .data
            .iter()
            .find_map(|image| match image.as_ref() {
                Image::Url { url, .. } => Some(url.clone()),
                _ => None,
            })
            .ok_or(FetchError::Missing("image url"))?;

        info!(product_id = %product_id, image_url = %url, "Image generated");
        Ok(url)
    }
}
