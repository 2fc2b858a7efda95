use serde::{Serialize, Deserialize};
use serde_with::{serde_as, DefaultOnError};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub const MAX_PRODUCT_NAME_CHARS: usize = 120;
pub const MIN_HASHTAGS: u32 = 3;
pub const MAX_HASHTAGS: u32 = 30;
pub const DEFAULT_HASHTAGS: u32 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("enter the product name to continue")]
    MissingProductName,
    #[error("product name is longer than {max} characters")]
    ProductNameTooLong { max: usize },
    #[error("hashtag limit must be between {min} and {max}, got {got}")]
    HashtagLimit { min: u32, max: u32, got: u32 },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Friendly,
    Professional,
    Promotional,
    Technical,
}

impl Tone {
    pub fn label(self) -> &'static str {
        match self {
            Tone::Friendly => "friendly",
            Tone::Professional => "professional",
            Tone::Promotional => "promotional",
            Tone::Technical => "technical",
        }
    }
}

/// Tone choices offered by the quick form.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuickTone {
    #[default]
    Casual,
    Professional,
    Sales,
}

impl QuickTone {
    pub fn label(self) -> &'static str {
        match self {
            QuickTone::Casual => "friendly / casual",
            QuickTone::Professional => "professional",
            QuickTone::Sales => "sales-driven with a call to action",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Greek,
    English,
}

impl Language {
    pub fn label(self) -> &'static str {
        match self {
            Language::Greek => "Greek",
            Language::English => "English",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Instagram,
    Facebook,
    TikTok,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "Instagram",
            Platform::Facebook => "Facebook",
            Platform::TikTok => "TikTok",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn default_platforms() -> Vec<Platform> {
    vec![Platform::Instagram, Platform::Facebook]
}

fn default_hashtag_limit() -> u32 {
    DEFAULT_HASHTAGS
}

/// Studio form body as posted by the page.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerateForm {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub category: Option<String>,
    /// One feature per line.
    #[serde(default)]
    pub features: String,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default = "default_platforms")]
    pub platforms: Vec<Platform>,
    #[serde(default = "default_hashtag_limit")]
    pub hashtag_limit: u32,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct GenerationRequest {
    pub product_name: String,
    pub category: Option<String>,
    pub features: Vec<String>,
    pub tone: Tone,
    pub platforms: Vec<Platform>,
    pub hashtag_limit: u32,
    pub language: Language,
}

impl TryFrom<GenerateForm> for GenerationRequest {
    type Error = ValidationError;

    fn try_from(form: GenerateForm) -> Result<Self, Self::Error> {
        let product_name = validate_product_name(&form.product_name)?;
        if !(MIN_HASHTAGS..=MAX_HASHTAGS).contains(&form.hashtag_limit) {
            return Err(ValidationError::HashtagLimit { min: MIN_HASHTAGS, max: MAX_HASHTAGS, got: form.hashtag_limit });
        }

        let mut platforms = Vec::with_capacity(form.platforms.len());
        for p in form.platforms {
            if !platforms.contains(&p) { platforms.push(p); }
        }

        Ok(Self {
            product_name,
            category: non_blank(form.category),
            features: split_features(&form.features),
            tone: form.tone,
            platforms,
            hashtag_limit: form.hashtag_limit,
            language: form.language,
        })
    }
}

/// Quick form body as posted by the page.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuickForm {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub tone: QuickTone,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct QuickRequest {
    pub product_name: String,
    pub keywords: Option<String>,
    pub language: Language,
    pub tone: QuickTone,
}

impl TryFrom<QuickForm> for QuickRequest {
    type Error = ValidationError;

    fn try_from(form: QuickForm) -> Result<Self, Self::Error> {
        Ok(Self {
            product_name: validate_product_name(&form.product_name)?,
            keywords: non_blank(form.keywords),
            language: form.language,
            tone: form.tone,
        })
    }
}

fn validate_product_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingProductName);
    }
    if name.chars().count() > MAX_PRODUCT_NAME_CHARS {
        return Err(ValidationError::ProductNameTooLong { max: MAX_PRODUCT_NAME_CHARS });
    }
    Ok(name.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn split_features(text: &str) -> Vec<String> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect()
}

/// Studio output as returned by the model. The model is untrusted, so every
/// field falls back to its default when missing or of the wrong JSON type.
#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct GenerationResult {
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub title: String,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub short_description: String,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub long_description: String,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub seo_keywords: Vec<String>,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub captions: BTreeMap<String, String>,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub hashtags: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub bullets: Vec<String>,
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct QuickResult {
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub description: String,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub instagram_caption: String,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub facebook_post: String,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub hashtags: Vec<String>,
}
