use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, redirect};
use tracing::{info, warn};

use crate::error::FetchError;
use crate::links;
use crate::models::CandidateLink;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const MAX_REDIRECTS: usize = 10;

/// Outcome of resolving a link. Both variants carry a usable URL.
#[derive(Debug)]
pub enum Resolution {
    Resolved(String),
    Fallback { url: String, reason: FetchError },
}

impl Resolution {
    pub fn url(&self) -> &str {
        match self {
            Self::Resolved(url) | Self::Fallback { url, .. } => url,
        }
    }

    pub fn into_url(self) -> String {
        match self {
            Self::Resolved(url) | Self::Fallback { url, .. } => url,
        }
    }
}

/// Follows short and tracking links to their final destination.
#[derive(Clone)]
pub struct LinkResolver {
    client: Client,
}

impl LinkResolver {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Resolves `link` and returns it with `url` replaced by the destination.
    /// Never fails: network problems keep the original URL.
    pub async fn resolve_link(&self, link: CandidateLink) -> CandidateLink {
        CandidateLink {
            url: self.resolve(&link.url).await.into_url(),
        }
    }

    pub async fn resolve(&self, url: &str) -> Resolution {
        match self.follow(url).await {
            Ok(final_url) => {
                let final_url = links::redirect_target(&final_url).unwrap_or(final_url);
                info!(original = %url, resolved = %final_url, "Link resolved");
                Resolution::Resolved(final_url)
            }
            Err(reason) => {
                warn!(url = %url, error = %reason, "Link resolution failed, keeping original");
                Resolution::Fallback {
                    url: url.to_string(),
                    reason,
                }
            }
        }
    }

    async fn follow(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        Ok(response.url().to_string())
    }
}
