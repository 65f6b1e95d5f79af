//! Data models for inbound messages and product links

/// A text message received from a chat, as seen by the pipeline
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub message_id: i32,
    pub sender_name: Option<String>,
    pub text: String,
}

/// A URL found in message text whose host belongs to AliExpress.
///
/// After resolution `url` holds the final destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    pub url: String,
}

/// Numeric AliExpress product identifier, kept as the digit string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outbound URL carrying the partner or invitation attribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffiliateLink(pub String);

impl AffiliateLink {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AffiliateLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Open Graph data scraped from a product page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductMetadata {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

/// Media attached to a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Media {
    Photo(String),
    Video(String),
}

/// Final message body plus the media it should be attached to, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingCaption {
    pub text: String,
    pub media: Option<Media>,
}

/// What the transport must do for one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Leave the original message alone
    Ignore,
    /// Delete the original message and post `caption` in the same chat
    Repost {
        chat_id: i64,
        delete_message_id: i32,
        caption: OutgoingCaption,
    },
}
