//! Type definitions for the rec-grid application.
//!
//! This module contains the wire format returned by the recommendation
//! endpoint and the normalized [`RecommendationItem`] the rest of the
//! pipeline works with.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use uuid::Uuid;

/// Error code the feed endpoint returns when the access key is rejected.
///
/// The service hands this out intermittently even for valid keys, so it is
/// treated as retryable.
pub const AUTH_FAILED_CODE: i64 = -663;

/// Anything that can be deduplicated by a stable logical key.
pub trait Keyed {
    fn unique_key(&self) -> &str;
}

/// Top-level envelope returned by the feed endpoint.
///
/// On success `data` is present. On failure `data` is absent and
/// `code`/`message` describe what went wrong.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<FeedData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedData {
    #[serde(default)]
    pub items: Vec<RawRecItem>,
}

/// A single card as returned by the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRecItem {
    /// Stable identifier of the recommended content.
    pub param: String,

    /// Kind of content: "av", "bangumi", "live", ...
    #[serde(default)]
    pub goto: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub uri: Option<String>,

    #[serde(default)]
    pub args: Option<RawArgs>,

    #[serde(default)]
    pub player_args: Option<RawPlayerArgs>,

    /// Human readable play count, e.g. "12.3万".
    #[serde(default)]
    pub cover_left_text_1: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawArgs {
    #[serde(default)]
    pub up_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPlayerArgs {
    #[serde(default)]
    pub aid: Option<u64>,
    /// Duration in seconds.
    #[serde(default)]
    pub duration: Option<u64>,
}

impl Keyed for RawRecItem {
    fn unique_key(&self) -> &str {
        &self.param
    }
}

/// A normalized recommendation ready for filtering and display.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationItem {
    /// Stable per logical item; used for deduplication.
    pub unique_key: String,
    /// Unique per occurrence, so a re-fetched item never collides with an
    /// earlier rendering of itself.
    pub render_id: String,
    pub title: String,
    pub author: Option<String>,
    pub goto: Option<String>,
    pub uri: Option<String>,
    pub play_count: Option<u64>,
    pub duration_secs: Option<u64>,
}

impl Keyed for RecommendationItem {
    fn unique_key(&self) -> &str {
        &self.unique_key
    }
}

impl RecommendationItem {
    /// Build an item from its wire form, stamping a fresh render id.
    pub fn from_raw(raw: RawRecItem) -> Self {
        let render_id = format!("{}-{}", raw.param, Uuid::new_v4());
        let play_count = raw.cover_left_text_1.as_deref().and_then(parse_play_count);
        let duration_secs = raw.player_args.as_ref().and_then(|p| p.duration);

        Self {
            unique_key: raw.param,
            render_id,
            title: raw.title,
            author: raw.args.and_then(|a| a.up_name),
            goto: raw.goto,
            uri: raw.uri,
            play_count,
            duration_secs,
        }
    }

    /// Web link for the item when one can be derived.
    pub fn link(&self) -> Option<String> {
        match self.goto.as_deref() {
            Some("av") | None => Some(format!("https://www.bilibili.com/video/av{}", self.unique_key)),
            _ => self.uri.clone(),
        }
    }

    /// Play count formatted for a card footer.
    pub fn play_display(&self) -> String {
        match self.play_count {
            Some(n) if n >= 10_000 => format!("{:.1}w plays", n as f64 / 10_000.0),
            Some(n) => format!("{} plays", n),
            None => "-".to_string(),
        }
    }

    /// Duration formatted as `m:ss` or `h:mm:ss`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rec_grid::types::{RawPlayerArgs, RawRecItem, RecommendationItem};
    ///
    /// let raw = RawRecItem {
    ///     param: "1".to_string(),
    ///     player_args: Some(RawPlayerArgs { aid: None, duration: Some(3725) }),
    ///     ..Default::default()
    /// };
    /// assert_eq!(RecommendationItem::from_raw(raw).duration_display(), "1:02:05");
    /// ```
    pub fn duration_display(&self) -> String {
        match self.duration_secs {
            Some(d) if d > 0 => {
                let (h, m, s) = (d / 3600, (d % 3600) / 60, d % 60);
                if h > 0 {
                    format!("{}:{:02}:{:02}", h, m, s)
                } else {
                    format!("{}:{:02}", m, s)
                }
            }
            _ => "--:--".to_string(),
        }
    }
}

fn play_count_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*([0-9]+(?:\.[0-9]+)?)\s*(万|亿)?").expect("valid regex"))
}

/// Parse a play-count label such as "987", "12.3万" or "1.2亿".
///
/// Returns `None` when the label carries no leading number.
pub fn parse_play_count(label: &str) -> Option<u64> {
    let caps = play_count_regex().captures(label)?;
    let value: f64 = caps[1].parse().ok()?;
    let multiplier = match caps.get(2).map(|m| m.as_str()) {
        Some("万") => 10_000.0,
        Some("亿") => 100_000_000.0,
        _ => 1.0,
    };
    Some((value * multiplier).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(param: &str) -> RawRecItem {
        RawRecItem {
            param: param.to_string(),
            title: format!("Video {}", param),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_play_count_plain() {
        assert_eq!(parse_play_count("987"), Some(987));
    }

    #[test]
    fn test_parse_play_count_units() {
        assert_eq!(parse_play_count("12.3万"), Some(123_000));
        assert_eq!(parse_play_count("1.2亿"), Some(120_000_000));
        assert_eq!(parse_play_count("3万观看"), Some(30_000));
    }

    #[test]
    fn test_parse_play_count_garbage() {
        assert_eq!(parse_play_count(""), None);
        assert_eq!(parse_play_count("--"), None);
    }

    #[test]
    fn test_from_raw_render_id_is_unique_per_occurrence() {
        let a = RecommendationItem::from_raw(raw("42"));
        let b = RecommendationItem::from_raw(raw("42"));
        assert_eq!(a.unique_key, b.unique_key);
        assert_ne!(a.render_id, b.render_id);
        assert!(a.render_id.starts_with("42-"));
    }

    #[test]
    fn test_from_raw_extracts_filter_attributes() {
        let item = RecommendationItem::from_raw(RawRecItem {
            cover_left_text_1: Some("1.5万".to_string()),
            player_args: Some(RawPlayerArgs {
                aid: Some(42),
                duration: Some(95),
            }),
            args: Some(RawArgs {
                up_name: Some("someone".to_string()),
            }),
            ..raw("42")
        });
        assert_eq!(item.play_count, Some(15_000));
        assert_eq!(item.duration_secs, Some(95));
        assert_eq!(item.author.as_deref(), Some("someone"));
        assert_eq!(item.duration_display(), "1:35");
    }

    #[test]
    fn test_missing_attributes_stay_unknown() {
        let item = RecommendationItem::from_raw(raw("7"));
        assert_eq!(item.play_count, None);
        assert_eq!(item.duration_secs, None);
        assert_eq!(item.play_display(), "-");
        assert_eq!(item.duration_display(), "--:--");
    }

    #[test]
    fn test_feed_response_deserialization() {
        let json = r#"{"code":0,"data":{"items":[{"param":"1","title":"a"},{"param":"2"}]}}"#;
        let resp: FeedResponse = serde_json::from_str(json).unwrap();
        let items = resp.data.unwrap().items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].title, "");
    }

    #[test]
    fn test_feed_response_error_envelope() {
        let json = r#"{"code":-663,"message":"auth failed","ttl":1}"#;
        let resp: FeedResponse = serde_json::from_str(json).unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.code, AUTH_FAILED_CODE);
        assert_eq!(resp.message.as_deref(), Some("auth failed"));
    }

    #[test]
    fn test_link_for_video() {
        let item = RecommendationItem::from_raw(RawRecItem {
            goto: Some("av".to_string()),
            ..raw("99")
        });
        assert_eq!(
            item.link().as_deref(),
            Some("https://www.bilibili.com/video/av99")
        );
    }
}
