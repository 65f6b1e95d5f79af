//! # Affiliate Link Builder
//!
//! Renders the outbound URL that attributes a purchase to the bot operator.
//! Several link shapes are in use for AliExpress, so the template is chosen by
//! configuration through [`AffiliateStrategy`].
//!
//! Every function here is pure: the same product id, partner identifier and
//! strategy always produce the same string.

use std::str::FromStr;

use crate::links;
use crate::models::{AffiliateLink, ProductId};

const PRODUCT_BASE_URL: &str = "https://it.aliexpress.com/item";
const DEEP_LINK_BASE_URL: &str = "https://s.click.aliexpress.com/deep_link.htm";
const GENERIC_TARGET_URL: &str = "https://www.aliexpress.com/";

/// URL template used for per-product affiliate links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AffiliateStrategy {
    /// `item/<id>.html?aff_fcid=P&aff_fsk=P&aff_platform=default&sk=P`
    #[default]
    ProductPage,
    /// `item/<id>.html?affid=P`
    QueryParam,
    /// `deep_link.htm?aff_short_key=P&dl_target_url=<product page>`
    DeepLink,
}

impl FromStr for AffiliateStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product-page" => Ok(Self::ProductPage),
            "query-param" => Ok(Self::QueryParam),
            "deep-link" => Ok(Self::DeepLink),
            other => Err(anyhow::anyhow!("unknown affiliate strategy: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AffiliateBuilder {
    partner_id: String,
    strategy: AffiliateStrategy,
}

impl AffiliateBuilder {
    pub fn new(partner_id: impl Into<String>, strategy: AffiliateStrategy) -> Self {
        Self {
            partner_id: partner_id.into(),
            strategy,
        }
    }

    /// Builds the link for a product found at `resolved_url`.
    ///
    /// An `invitationCode` on the resolved URL wins over the partner template.
    pub fn build(&self, product_id: &ProductId, resolved_url: &str) -> AffiliateLink {
        match links::invitation_code(resolved_url) {
            Some(code) => self.for_invitation(product_id, &code),
            None => self.for_product(product_id),
        }
    }

    pub fn for_product(&self, product_id: &ProductId) -> AffiliateLink {
        let partner = urlencoding::encode(&self.partner_id);
        let url = match self.strategy {
            AffiliateStrategy::ProductPage => format!(
                "{PRODUCT_BASE_URL}/{product_id}.html?aff_fcid={partner}&aff_fsk={partner}&aff_platform=default&sk={partner}"
            ),
            AffiliateStrategy::QueryParam => {
                format!("{PRODUCT_BASE_URL}/{product_id}.html?affid={partner}")
            }
            AffiliateStrategy::DeepLink => {
                let target = format!("{PRODUCT_BASE_URL}/{product_id}.html");
                format!(
                    "{DEEP_LINK_BASE_URL}?aff_short_key={partner}&dl_target_url={}",
                    urlencoding::encode(&target)
                )
            }
        };
        AffiliateLink(url)
    }

    pub fn for_invitation(&self, product_id: &ProductId, code: &str) -> AffiliateLink {
        AffiliateLink(format!(
            "{PRODUCT_BASE_URL}/{product_id}.html?invitationCode={}",
            urlencoding::encode(code)
        ))
    }

    /// Partner tracking link to the AliExpress home page, for links that carry no product.
    pub fn generic(&self) -> AffiliateLink {
        AffiliateLink(format!(
            "{DEEP_LINK_BASE_URL}?aff_short_key={}&dl_target_url={}",
            urlencoding::encode(&self.partner_id),
            urlencoding::encode(GENERIC_TARGET_URL)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ProductId {
        ProductId(s.to_string())
    }

    #[test]
    fn test_product_page_template() {
        let builder = AffiliateBuilder::new("P", AffiliateStrategy::ProductPage);
        assert_eq!(
            builder.for_product(&id("12345")).as_str(),
            "https://it.aliexpress.com/item/12345.html?aff_fcid=P&aff_fsk=P&aff_platform=default&sk=P"
        );
    }

    #[test]
    fn test_query_param_template() {
        let builder = AffiliateBuilder::new("_EHN0NeQ", AffiliateStrategy::QueryParam);
        assert_eq!(
            builder.for_product(&id("12345")).as_str(),
            "https://it.aliexpress.com/item/12345.html?affid=_EHN0NeQ"
        );
    }

    #[test]
    fn test_deep_link_template() {
        let builder = AffiliateBuilder::new("P", AffiliateStrategy::DeepLink);
        assert_eq!(
            builder.for_product(&id("12345")).as_str(),
            "https://s.click.aliexpress.com/deep_link.htm?aff_short_key=P&dl_target_url=https%3A%2F%2Fit.aliexpress.com%2Fitem%2F12345.html"
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        for strategy in [
            AffiliateStrategy::ProductPage,
            AffiliateStrategy::QueryParam,
            AffiliateStrategy::DeepLink,
        ] {
            let builder = AffiliateBuilder::new("P", strategy);
            let url = "https://it.aliexpress.com/item/12345.html";
            let first = builder.build(&id("12345"), url);
            for _ in 0..5 {
                assert_eq!(builder.build(&id("12345"), url), first);
            }
            assert_eq!(
                AffiliateBuilder::new("P", strategy).build(&id("12345"), url),
                first
            );
        }
    }

    #[test]
    fn test_invitation_code_takes_precedence() {
        let builder = AffiliateBuilder::new("P", AffiliateStrategy::ProductPage);
        let link = builder.build(
            &id("999"),
            "https://it.aliexpress.com/item/999.html?invitationCode=ABC123",
        );
        assert_eq!(
            link.as_str(),
            "https://it.aliexpress.com/item/999.html?invitationCode=ABC123"
        );
        assert!(!link.as_str().contains("aff_fcid"));
    }

    #[test]
    fn test_generic_link() {
        let builder = AffiliateBuilder::new("P", AffiliateStrategy::QueryParam);
        assert_eq!(
            builder.generic().as_str(),
            "https://s.click.aliexpress.com/deep_link.htm?aff_short_key=P&dl_target_url=https%3A%2F%2Fwww.aliexpress.com%2F"
        );
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(
            "deep-link".parse::<AffiliateStrategy>().unwrap(),
            AffiliateStrategy::DeepLink
        );
        assert_eq!(
            " Query-Param ".parse::<AffiliateStrategy>().unwrap(),
            AffiliateStrategy::QueryParam
        );
        assert!("bogus".parse::<AffiliateStrategy>().is_err());
    }
}
