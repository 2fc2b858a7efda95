use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_CALLS: u32 = 15;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub api_base: String,
    pub studio_model: String,
    pub quick_model: String,
    /// Inference calls allowed per session.
    pub max_calls: u32,
    pub request_timeout: Duration,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            studio_model: "gpt-4o-mini".to_string(),
            quick_model: "gpt-3.5-turbo".to_string(),
            max_calls: DEFAULT_MAX_CALLS,
            request_timeout: Duration::from_secs(60),
            port: 8080,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            api_key: text("OPENAI_API_KEY"),
            api_base: text("OPENAI_API_BASE").unwrap_or(defaults.api_base),
            studio_model: text("OPENAI_MODEL").unwrap_or(defaults.studio_model),
            quick_model: text("OPENAI_QUICK_MODEL").unwrap_or(defaults.quick_model),
            max_calls: text("DEMO_MAX_CALLS").and_then(|v| v.parse().ok()).unwrap_or(defaults.max_calls),
            request_timeout: text("OPENAI_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            port: text("PORT").and_then(|v| v.parse().ok()).unwrap_or(defaults.port),
        }
    }

    /// First few characters of the key, for startup logs.
    pub fn key_hint(&self) -> Option<String> {
        self.api_key.as_ref().map(|k| format!("{}...", k.chars().take(7).collect::<String>()))
    }
}
