use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{info, warn};

use crate::error::FetchError;
use crate::models::ProductMetadata;
use crate::resolver::BROWSER_USER_AGENT;

pub const DEFAULT_TITLE: &str = "Prodotto AliExpress";

/// Result of scraping a product page.
///
/// `Failed` is handled exactly like a page without tags, the variant only
/// tells the caller why nothing was found.
#[derive(Debug)]
pub enum ScrapeOutcome {
    Found(ProductMetadata),
    Failed(FetchError),
}

impl ScrapeOutcome {
    pub fn into_metadata(self) -> ProductMetadata {
        match self {
            Self::Found(metadata) => metadata,
            Self::Failed(_) => ProductMetadata::default(),
        }
    }
}

/// Fetches product pages and reads their Open Graph tags.
#[derive(Clone)]
pub struct MetadataScraper {
    client: Client,
}

impl MetadataScraper {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    pub async fn scrape(&self, url: &str) -> ScrapeOutcome {
        match self.fetch_page(url).await {
            Ok(html) => {
                let metadata = parse_metadata(&html);
                info!(
                    url = %url,
                    title = ?metadata.title,
                    has_image = metadata.image_url.is_some(),
                    has_video = metadata.video_url.is_some(),
                    "Product page scraped"
                );
                ScrapeOutcome::Found(metadata)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to scrape product page");
                ScrapeOutcome::Failed(e)
            }
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }
}

/// Reads `og:title`, `og:image` and `og:video` from a page.
///
/// A missing `og:title` falls back to the `<title>` element. Empty values
/// count as missing.
pub fn parse_metadata(html: &str) -> ProductMetadata {
    let document = Html::parse_document(html);

    let title = meta_property(&document, "og:title").or_else(|| document_title(&document));
    let image_url = meta_property(&document, "og:image")
        .or_else(|| meta_property(&document, "og:image:url"))
        .map(absolute_media_url);
    let video_url = meta_property(&document, "og:video")
        .or_else(|| meta_property(&document, "og:video:url"))
        .map(absolute_media_url);

    ProductMetadata {
        title,
        image_url,
        video_url,
    }
}

fn meta_property(document: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[property=\"{property}\"]")).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(ToString::to_string)
}

fn document_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
}

fn absolute_media_url(src: String) -> String {
    if src.starts_with("//") {
        format!("https:{src}")
    } else {
        src
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_PAGE: &str = r#"<!DOCTYPE html>
<html><head>
<title>Fallback title</title>
<meta property="og:title" content="Cuffie Bluetooth 5.3 " />
<meta property="og:image" content="//ae01.alicdn.com/kf/S123.jpg" />
<meta property="og:video" content="https://video.aliexpress-media.com/play/1.mp4" />
</head><body></body></html>"#;

    /// Accepts connections and never answers them.
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_parse_open_graph_tags() {
        let metadata = parse_metadata(PRODUCT_PAGE);
        assert_eq!(metadata.title.as_deref(), Some("Cuffie Bluetooth 5.3"));
        assert_eq!(
            metadata.image_url.as_deref(),
            Some("https://ae01.alicdn.com/kf/S123.jpg")
        );
        assert_eq!(
            metadata.video_url.as_deref(),
            Some("https://video.aliexpress-media.com/play/1.mp4")
        );
    }

    #[test]
    fn test_title_element_fallback() {
        let metadata = parse_metadata("<html><head><title> Solo titolo </title></head></html>");
        assert_eq!(metadata.title.as_deref(), Some("Solo titolo"));
        assert!(metadata.image_url.is_none());
        assert!(metadata.video_url.is_none());
    }

    #[test]
    fn test_empty_tags_are_missing() {
        let metadata = parse_metadata(r#"<meta property="og:image" content="  ">"#);
        assert_eq!(metadata, ProductMetadata::default());
    }

    #[tokio::test]
    async fn test_scrape_page() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/item/1.html")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(PRODUCT_PAGE)
            .create_async()
            .await;

        let scraper = MetadataScraper::new(Duration::from_secs(5)).unwrap();
        let outcome = scraper.scrape(&format!("{}/item/1.html", server.url())).await;

        let ScrapeOutcome::Found(metadata) = outcome else {
            panic!("expected metadata");
        };
        assert_eq!(metadata.title.as_deref(), Some("Cuffie Bluetooth 5.3"));
    }

    #[tokio::test]
    async fn test_scrape_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/item/2.html")
            .with_status(503)
            .create_async()
            .await;

        let scraper = MetadataScraper::new(Duration::from_secs(5)).unwrap();
        let outcome = scraper.scrape(&format!("{}/item/2.html", server.url())).await;

        assert!(matches!(outcome, ScrapeOutcome::Failed(FetchError::Status(503))));
        assert_eq!(outcome.into_metadata(), ProductMetadata::default());
    }

    #[tokio::test]
    async fn test_scrape_connection_refused() {
        let scraper = MetadataScraper::new(Duration::from_secs(5)).unwrap();
        let outcome = scraper.scrape("http://127.0.0.1:1/item/3.html").await;

        assert!(matches!(outcome, ScrapeOutcome::Failed(_)));
        assert_eq!(outcome.into_metadata(), ProductMetadata::default());
    }

    #[tokio::test]
    async fn test_scrape_timeout() {
        let url = format!("{}/item/4.html", silent_server().await);
        let scraper = MetadataScraper::new(Duration::from_millis(200)).unwrap();

        let outcome = scraper.scrape(&url).await;

        assert!(matches!(outcome, ScrapeOutcome::Failed(FetchError::Timeout)));
    }
}
