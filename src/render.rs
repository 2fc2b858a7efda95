//! Shapes a recovered result into what the page shows: per-platform
//! sections, copy-ready hashtag lines and the JSON download.

use crate::models::{GenerationResult, Platform, QuickResult};
use serde::Serialize;
use serde_json::Value;

pub const DOWNLOAD_MIME: &str = "application/json";
const FILE_STEM_CHARS: usize = 20;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PlatformSection {
    pub platform: Platform,
    pub caption: String,
    pub hashtags: Vec<String>,
    pub hashtag_line: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Download {
    pub file_name: String,
    pub mime: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StudioContent {
    pub result: GenerationResult,
    /// One entry per requested platform, in request order.
    pub sections: Vec<PlatformSection>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct QuickContent {
    pub result: QuickResult,
    pub hashtag_line: String,
}

pub fn studio_content(result: GenerationResult, platforms: &[Platform]) -> StudioContent {
    let sections = platforms.iter().map(|&platform| {
        let caption = lookup(&result.captions, platform).cloned().unwrap_or_default();
        let hashtags = lookup(&result.hashtags, platform).cloned().unwrap_or_default();
        let hashtag_line = hashtag_line(&hashtags);
        PlatformSection { platform, caption, hashtags, hashtag_line }
    }).collect();
    StudioContent { result, sections }
}

pub fn quick_content(result: QuickResult) -> QuickContent {
    let hashtag_line = hashtag_line(&result.hashtags);
    QuickContent { result, hashtag_line }
}

/// Models are inconsistent about key casing ("TikTok", "tiktok").
fn lookup<V>(map: &std::collections::BTreeMap<String, V>, platform: Platform) -> Option<&V> {
    map.get(platform.as_str())
        .or_else(|| map.iter().find(|(k, _)| k.trim().eq_ignore_ascii_case(platform.as_str())).map(|(_, v)| v))
}

/// `#tag` tokens separated by spaces; inner whitespace is dropped and a
/// leading `#` the model already added is not doubled.
pub fn hashtag_line(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.trim().trim_start_matches('#').split_whitespace().collect::<String>())
        .filter(|t| !t.is_empty())
        .map(|t| format!("#{t}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn download_file_name(product_name: &str) -> String {
    let stem: String = product_name
        .chars()
        .take(FILE_STEM_CHARS)
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{stem}_content.json")
}

/// Pretty JSON with two-space indent; non-ASCII text is written as-is.
pub fn download(product_name: &str, value: &Value) -> Download {
    Download {
        file_name: download_file_name(product_name),
        mime: DOWNLOAD_MIME,
        content: serde_json::to_string_pretty(value).unwrap_or_default(),
    }
}
