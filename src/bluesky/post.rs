use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::scrape::Listing;

pub const POST_COLLECTION: &str = "app.bsky.feed.post";
pub const MAX_POST_LENGTH: usize = 300;
pub const SEPARATOR: &str = " - ";
pub const ELLIPSIS: &str = "...";

const LINK_FEATURE: &str = "app.bsky.richtext.facet#link";
const IMAGES_EMBED: &str = "app.bsky.embed.images";

#[derive(Debug, PartialEq, Eq)]
pub struct ComposedText {
    pub text: String,
    /// Byte length of the title as it appears at the start of `text`.
    pub title_bytes: usize,
}

/// `title - summary`, cut to `max_chars` characters with a trailing ellipsis when it overflows.
pub fn compose_text(title: &str, summary: &str, max_chars: usize) -> ComposedText {
    let full = format!("{title}{SEPARATOR}{summary}");
    if full.chars().count() <= max_chars {
        return ComposedText { text: full, title_bytes: title.len() };
    }

    let keep = max_chars.saturating_sub(ELLIPSIS.chars().count());
    let cut = full.char_indices().nth(keep).map(|(i, _)| i).unwrap_or(full.len());
    let mut text = full[..cut].to_string();
    text.push_str(ELLIPSIS);
    ComposedText { text, title_bytes: title.len().min(cut) }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostRecord {
    #[serde(rename = "$type")]
    pub kind: &'static str,
    pub text: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    pub langs: Vec<String>,
    pub facets: Vec<Facet>,
    pub embed: ImagesEmbed,
}

#[derive(Debug, Clone, Serialize)]
pub struct Facet {
    pub index: ByteSlice,
    pub features: Vec<LinkFeature>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteSlice {
    pub byte_start: usize,
    pub byte_end: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkFeature {
    #[serde(rename = "$type")]
    pub kind: &'static str,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImagesEmbed {
    #[serde(rename = "$type")]
    pub kind: &'static str,
    pub images: Vec<EmbedImage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedImage {
    pub alt: String,
    pub image: Value,
}

pub fn build_post(listing: &Listing, blob: Value, langs: &[String], now: DateTime<Utc>) -> PostRecord {
    let composed = compose_text(&listing.title, &listing.summary, MAX_POST_LENGTH);
    PostRecord {
        kind: POST_COLLECTION,
        text: composed.text,
        created_at: now.to_rfc3339_opts(SecondsFormat::Micros, true),
        langs: langs.to_vec(),
        facets: vec![Facet {
            index: ByteSlice { byte_start: 0, byte_end: composed.title_bytes },
            features: vec![LinkFeature { kind: LINK_FEATURE, uri: listing.source_url.clone() }],
        }],
        embed: ImagesEmbed {
            kind: IMAGES_EMBED,
            images: vec![EmbedImage { alt: listing.title.clone(), image: blob }],
        },
    }
}
