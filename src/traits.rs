//! Traits for the external collaborators the pipeline talks to

use async_trait::async_trait;

use crate::error::{FetchError, TransportError};
use crate::models::ProductId;

/// AI text and image generation for a product
#[async_trait]
pub trait Describer: Send + Sync {
    /// Short marketing description for the product
    ///
    /// # Returns
    /// * `Result<String, FetchError>` - Generated text or the reason none was produced
    async fn describe(&self, product_id: &ProductId) -> Result<String, FetchError>;

    /// URL of a generated product picture
    ///
    /// # Returns
    /// * `Result<String, FetchError>` - Image URL or the reason none was produced
    async fn generate_image(&self, product_id: &ProductId) -> Result<String, FetchError>;
}

/// Chat operations needed to repost a message
#[async_trait]
pub trait Transport: Send + Sync {
    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), TransportError>;

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError>;

    async fn send_photo(&self, chat_id: i64, photo_url: &str, caption: &str)
    -> Result<(), TransportError>;

    async fn send_video(&self, chat_id: i64, video_url: &str, caption: &str)
    -> Result<(), TransportError>;
}
