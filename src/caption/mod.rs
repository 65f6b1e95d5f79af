use crate::models::{AffiliateLink, Media, OutgoingCaption, ProductMetadata};
use crate::scraper::DEFAULT_TITLE;

const ANONYMOUS_SENDER: &str = "amico";
const ELLIPSIS: char = '…';

/// Telegram limit for photo and video captions, in characters
pub const CAPTION_LIMIT: usize = 1024;
/// Telegram limit for text messages, in characters
pub const MESSAGE_LIMIT: usize = 4096;

/// Builds the reposted message.
///
/// Media priority is scraped video, scraped image, then `generated_image`.
/// Without any of them the reply is text-only. Text longer than the Telegram
/// limit for the chosen delivery is shortened by trimming the description
/// first and then the title; the greeting and the link are always kept whole.
pub fn compose(
    metadata: &ProductMetadata,
    description: Option<&str>,
    link: &AffiliateLink,
    sender_name: Option<&str>,
    generated_image: Option<String>,
) -> OutgoingCaption {
    let name = sender_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(ANONYMOUS_SENDER);
    let media = non_empty(metadata.video_url.as_deref())
        .map(|url| Media::Video(url.to_string()))
        .or_else(|| non_empty(metadata.image_url.as_deref()).map(|url| Media::Photo(url.to_string())))
        .or_else(|| generated_image.filter(|url| !url.is_empty()).map(Media::Photo));
    let limit = if media.is_some() {
        CAPTION_LIMIT
    } else {
        MESSAGE_LIMIT
    };

    let mut title = metadata.title.as_deref().unwrap_or(DEFAULT_TITLE).to_string();
    let mut description = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(ToString::to_string);

    let mut text = render(name, &title, description.as_deref(), link);
    let overflow = text.chars().count().saturating_sub(limit);
    if overflow > 0 {
        if let Some(full) = description.take() {
            description = shorten(&full, overflow);
            text = render(name, &title, description.as_deref(), link);
        }
    }
    let overflow = text.chars().count().saturating_sub(limit);
    if overflow > 0 {
        title = shorten(&title, overflow).unwrap_or_else(|| ELLIPSIS.to_string());
        text = render(name, &title, description.as_deref(), link);
    }

    OutgoingCaption { text, media }
}

fn render(name: &str, title: &str, description: Option<&str>, link: &AffiliateLink) -> String {
    let mut text = format!("🙂 Grazie {name} per aver inviato questo prodotto!\n\n{title}");
    if let Some(description) = description {
        text.push_str("\n\n");
        text.push_str(description);
    }
    text.push_str(&format!("\n\n🔗 Link affiliato: {link}"));
    text
}

/// Drops `overflow` characters plus room for the ellipsis from the end of `value`.
/// `None` when nothing would be left.
fn shorten(value: &str, overflow: usize) -> Option<String> {
    let keep = value.chars().count().checked_sub(overflow + 1)?;
    if keep == 0 {
        return None;
    }
    let mut shortened: String = value.chars().take(keep).collect::<String>().trim_end().to_string();
    shortened.push(ELLIPSIS);
    Some(shortened)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link() -> AffiliateLink {
        AffiliateLink("https://it.aliexpress.com/item/1.html?affid=P".to_string())
    }

    #[test]
    fn test_text_only_with_defaults() {
        let caption = compose(&ProductMetadata::default(), None, &link(), Some("Nello"), None);

        assert_eq!(
            caption.text,
            "🙂 Grazie Nello per aver inviato questo prodotto!\n\nProdotto AliExpress\n\n🔗 Link affiliato: https://it.aliexpress.com/item/1.html?affid=P"
        );
        assert!(caption.media.is_none());
    }

    #[test]
    fn test_description_line() {
        let metadata = ProductMetadata {
            title: Some("Cuffie".to_string()),
            ..Default::default()
        };
        let caption = compose(&metadata, Some(" Suono pazzesco. "), &link(), None, None);

        assert!(caption.text.starts_with("🙂 Grazie amico per"));
        assert!(caption.text.contains("\n\nCuffie\n\nSuono pazzesco.\n\n🔗 Link affiliato: "));
    }

    #[test]
    fn test_media_priority() {
        let mut metadata = ProductMetadata {
            title: None,
            image_url: Some("https://img/1.jpg".to_string()),
            video_url: Some("https://vid/1.mp4".to_string()),
        };
        let generated = Some("https://ai/1.png".to_string());

        let caption = compose(&metadata, None, &link(), None, generated.clone());
        assert_eq!(caption.media, Some(Media::Video("https://vid/1.mp4".to_string())));

        metadata.video_url = Some(String::new());
        let caption = compose(&metadata, None, &link(), None, generated.clone());
        assert_eq!(caption.media, Some(Media::Photo("https://img/1.jpg".to_string())));

        metadata.image_url = None;
        let caption = compose(&metadata, None, &link(), None, generated);
        assert_eq!(caption.media, Some(Media::Photo("https://ai/1.png".to_string())));
    }

    #[test]
    fn test_long_caption_fits_photo_limit() {
        let metadata = ProductMetadata {
            title: Some("T".repeat(250)),
            image_url: Some("https://ae01.alicdn.com/kf/S1.jpg".to_string()),
            video_url: None,
        };
        let link = AffiliateLink(
            "https://it.aliexpress.com/item/1005006789012345.html?aff_fcid=_EHN0NeQ&aff_fsk=_EHN0NeQ&aff_platform=default&sk=_EHN0NeQ"
                .to_string(),
        );
        let description = "D".repeat(700);

        let caption = compose(&metadata, Some(&description), &link, Some("Nello"), None);

        assert!(caption.text.chars().count() <= CAPTION_LIMIT);
        assert!(caption.text.ends_with(&format!("🔗 Link affiliato: {link}")));
        assert!(caption.text.contains(&"T".repeat(250)));
        assert!(caption.text.contains("D…"));
        assert!(matches!(caption.media, Some(Media::Photo(_))));
    }

    #[test]
    fn test_oversized_title_is_shortened_after_description() {
        let metadata = ProductMetadata {
            title: Some("T".repeat(2000)),
            video_url: Some("https://vid/1.mp4".to_string()),
            ..Default::default()
        };

        let caption = compose(&metadata, Some("breve"), &link(), None, None);

        assert_eq!(caption.text.chars().count(), CAPTION_LIMIT);
        assert!(!caption.text.contains("breve"));
        assert!(caption.text.contains("T…\n\n🔗 Link affiliato: "));
    }

    #[test]
    fn test_text_only_uses_message_limit() {
        let description = "D".repeat(1500);

        let caption = compose(&ProductMetadata::default(), Some(&description), &link(), None, None);

        assert!(caption.media.is_none());
        assert!(caption.text.contains(&description));

        let description = "D".repeat(5000);
        let caption = compose(&ProductMetadata::default(), Some(&description), &link(), None, None);
        assert_eq!(caption.text.chars().count(), MESSAGE_LIMIT);
    }
}
