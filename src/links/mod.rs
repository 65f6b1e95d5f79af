//! Link extraction and product id parsing for AliExpress URLs

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::models::{CandidateLink, ProductId};

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid url regex"));

/// Product id patterns in priority order: `/item/<id>.html`, `/i/<id>.html`, `productId=<id>`
static PRODUCT_ID_REGEXES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"/item/(\d+)\.html").expect("valid item regex"),
        Regex::new(r"/i/(\d+)\.html").expect("valid short item regex"),
        Regex::new(r"productId=(\d+)").expect("valid productId regex"),
    ]
});

/// Host fragments that identify AliExpress links: apex, short-link and mobile share hosts
/// all live under these.
pub const DEFAULT_DOMAINS: &[&str] = &["aliexpress.com", "aliexpress.us", "aliexpress.ru"];

/// Punctuation commonly glued to the end of a pasted link
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '>', '"', '\''];

/// Finds AliExpress links in free-form message text.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    domains: Vec<String>,
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::with_domains(DEFAULT_DOMAINS.iter().map(|d| (*d).to_string()).collect())
    }
}

impl LinkExtractor {
    pub fn with_domains(domains: Vec<String>) -> Self {
        Self { domains }
    }

    /// Yields every URL in `text` whose host contains one of the configured
    /// domain fragments, left to right.
    pub fn extract<'a>(&'a self, text: &'a str) -> impl Iterator<Item = CandidateLink> + 'a {
        URL_REGEX
            .find_iter(text)
            .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION))
            .filter(|candidate| self.is_known_host(candidate))
            .map(|candidate| CandidateLink {
                url: candidate.to_string(),
            })
    }

    fn is_known_host(&self, candidate: &str) -> bool {
        let Ok(url) = Url::parse(candidate) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.domains.iter().any(|domain| host.contains(domain.as_str()))
    }
}

/// Returns the product id of a resolved URL, trying each known shape in order.
pub fn parse_product_id(url: &str) -> Option<ProductId> {
    PRODUCT_ID_REGEXES.iter().find_map(|re| {
        re.captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| ProductId(m.as_str().to_string()))
    })
}

/// Value of the `invitationCode` query parameter, when present and non-empty.
pub fn invitation_code(url: &str) -> Option<String> {
    query_param(url, "invitationCode").filter(|code| !code.is_empty())
}

/// Decoded `redirectUrl` query parameter, if it is itself an http(s) URL.
///
/// Share links land on an intermediate page that carries the real product
/// page in this parameter.
pub fn redirect_target(url: &str) -> Option<String> {
    let target = query_param(url, "redirectUrl")?;
    let parsed = Url::parse(&target).ok()?;
    matches!(parsed.scheme(), "http" | "https").then(|| parsed.to_string())
}

/// True for links to the AliExpress home page itself, e.g. `https://www.aliexpress.com/`.
pub fn is_bare_apex(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
    let apex = host.strip_prefix("www.").unwrap_or(&host);
    DEFAULT_DOMAINS.contains(&apex) && matches!(parsed.path(), "" | "/")
}

fn query_param(url: &str, key: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
