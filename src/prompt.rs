use crate::models::{GenerationRequest, Language, Platform, QuickRequest};

pub const NO_FEATURES: &str = "No particular features provided.";

const STUDIO_EXAMPLE: &str = r#"{"title":"...","short_description":"...","long_description":"...","seo_keywords":["..."],"captions":{"Instagram":"..."},"hashtags":{"Instagram":["..."]},"bullets":["..."]}"#;

pub fn studio_system_prompt(language: Language) -> String {
    format!("You are a professional {} copywriter specialized in e-commerce.", language.label())
}

pub fn build_studio_prompt(req: &GenerationRequest) -> String {
    let platforms = if req.platforms.is_empty() {
        "none".to_string()
    } else {
        req.platforms.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ")
    };

    format!(
        "Write e-shop content in {language}. Return JSON with the fields:
\"title\", \"short_description\", \"long_description\", \"seo_keywords\" (list),
\"captions\" (object with one key per requested platform),
\"hashtags\" (object with a list per requested platform),
\"bullets\" (list of bullet points).

Product: {product}
Category: {category}
Features:
{features}

Tone: {tone}
Platforms: {platforms}

Instructions:
- Every description must read naturally and suit an online store.
- short_description: 1-2 sentences (for product listings).
- long_description: 3-6 sentences (for the product page).
- captions: 1-2 short sentences for each platform.
- hashtags: {hashtags}
- seo_keywords: 5 important words or phrases.
- bullets: 4-6 short bullet points.
- Answer STRICTLY with valid JSON (a single JSON object). Do not put any descriptive text outside the JSON.

Example output (short):
{example}
",
        language = req.language.label(),
        product = req.product_name,
        category = req.category.as_deref().unwrap_or(""),
        features = features_block(&req.features),
        tone = req.tone.label(),
        platforms = platforms,
        hashtags = hashtag_guidance(&req.platforms, req.hashtag_limit),
        example = STUDIO_EXAMPLE,
    )
}

pub fn build_quick_prompt(req: &QuickRequest) -> String {
    let keywords = match &req.keywords {
        Some(k) => format!("Keywords: {k}. "),
        None => String::new(),
    };
    format!(
        "You are an expert digital marketer for e-shops. \
         Create content for the product: {product}. {keywords}\
         Language: {language}. Tone: {tone}. \
         Please answer ONLY with JSON containing the fields: \
         \"description\" (string), \"instagram_caption\" (string), \
         \"facebook_post\" (string), \"hashtags\" (array of strings).",
        product = req.product_name,
        language = req.language.label(),
        tone = req.tone.label(),
    )
}

fn features_block(features: &[String]) -> String {
    if features.is_empty() {
        return NO_FEATURES.to_string();
    }
    features.iter().map(|f| format!("- {f}")).collect::<Vec<_>>().join("\n")
}

fn hashtag_guidance(platforms: &[Platform], instagram_limit: u32) -> String {
    if platforms.is_empty() {
        return "no platforms requested, return empty captions and hashtags objects.".to_string();
    }
    platforms
        .iter()
        .map(|p| match p {
            Platform::Instagram => format!("Instagram up to {instagram_limit}"),
            Platform::Facebook => "Facebook 3-5".to_string(),
            Platform::TikTok => "TikTok 4-8".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
        + "."
}
