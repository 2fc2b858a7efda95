use axum::{extract::rejection::JsonRejection, http::StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    config::Settings,
    extract::{recover_as, Recovered},
    models::{GenerationRequest, GenerationResult, QuickRequest, ValidationError},
    openai::{preview, ChatBackend, ChatMessage, ChatRequest, InferenceError},
    prompt::{build_quick_prompt, build_studio_prompt, studio_system_prompt},
    render::{download, quick_content, studio_content, Download, QuickContent, StudioContent},
    session::SessionQuota,
};

const STUDIO_TEMPERATURE: f32 = 0.2;
const STUDIO_MAX_TOKENS: u32 = 900;
const QUICK_TEMPERATURE: f32 = 0.7;
const QUICK_MAX_TOKENS: u32 = 500;

pub const RAW_WARNING: &str =
    "The model did not return clean JSON. Showing the raw answer so you can copy it or try again.";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no OpenAI API key found; set OPENAI_API_KEY in the environment or in a .env file")]
    MissingCredentials,
    #[error("you reached the demo limit of {max} calls for this session; get in touch with us for a full trial")]
    QuotaExceeded { max: u32 },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("error while calling the OpenAI API: {0}")]
    Inference(#[from] InferenceError),
    #[error("could not read the form: {0}")]
    Body(#[from] JsonRejection),
}

impl SubmitError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SubmitError::MissingCredentials => StatusCode::SERVICE_UNAVAILABLE,
            SubmitError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            SubmitError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SubmitError::Inference(_) => StatusCode::BAD_GATEWAY,
            SubmitError::Body(rejection) => rejection.status(),
        }
    }
}

/// What one submission produced. Structured content and raw fallback text
/// never come together.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome<T> {
    Structured { content: T, download: Download },
    Raw { text: String, warning: &'static str },
}

/// Gatekeeping before any network traffic: credentials, then the session
/// quota, then form validation. On success the counter comes back already
/// incremented for the call about to be made; persisting it is the caller's
/// job.
pub fn admit<F, R>(
    backend: &dyn ChatBackend,
    max_calls: u32,
    quota: SessionQuota,
    form: F,
) -> Result<(SessionQuota, R), SubmitError>
where
    F: TryInto<R, Error = ValidationError>,
{
    if !backend.has_credentials() {
        return Err(SubmitError::MissingCredentials);
    }
    if quota.is_exhausted(max_calls) {
        warn!("🚫 Session quota exhausted ({} calls)", quota.calls_used());
        return Err(SubmitError::QuotaExceeded { max: max_calls });
    }
    let request = form.try_into()?;
    Ok((quota.consume(), request))
}

pub fn studio_chat(settings: &Settings, request: &GenerationRequest) -> ChatRequest {
    ChatRequest {
        model: settings.studio_model.clone(),
        messages: vec![
            ChatMessage::system(studio_system_prompt(request.language)),
            ChatMessage::user(build_studio_prompt(request)),
        ],
        temperature: STUDIO_TEMPERATURE,
        max_tokens: STUDIO_MAX_TOKENS,
    }
}

pub fn quick_chat(settings: &Settings, request: &QuickRequest) -> ChatRequest {
    ChatRequest {
        model: settings.quick_model.clone(),
        messages: vec![ChatMessage::user(build_quick_prompt(request))],
        temperature: QUICK_TEMPERATURE,
        max_tokens: QUICK_MAX_TOKENS,
    }
}

pub async fn generate_studio(
    backend: &dyn ChatBackend,
    settings: &Settings,
    request: &GenerationRequest,
) -> Result<Outcome<StudioContent>, SubmitError> {
    info!("🚀 Generating studio content for product: {}", request.product_name);
    let text = backend.complete(&studio_chat(settings, request)).await?;
    Ok(settle(text, &request.product_name, false, |r: GenerationResult| studio_content(r, &request.platforms)))
}

pub async fn generate_quick(
    backend: &dyn ChatBackend,
    settings: &Settings,
    request: &QuickRequest,
) -> Result<Outcome<QuickContent>, SubmitError> {
    info!("🚀 Generating quick content for product: {}", request.product_name);
    let text = backend.complete(&quick_chat(settings, request)).await?;
    // The quick form has nothing to show for `{}`, so it gets the raw text.
    Ok(settle(text, &request.product_name, true, quick_content))
}

fn settle<R, T>(text: String, product_name: &str, empty_is_failure: bool, shape: impl FnOnce(R) -> T) -> Outcome<T>
where
    R: serde::de::DeserializeOwned,
{
    let recovered = recover_as::<R>(&text)
        .filter(|r| !(empty_is_failure && r.value.as_object().is_some_and(|m| m.is_empty())));
    match recovered {
        Some(Recovered { record, value }) => {
            info!("✅ Structured content recovered for: {}", product_name);
            Outcome::Structured { content: shape(record), download: download(product_name, &value) }
        }
        None => {
            warn!("⚠️ No JSON object in model reply, falling back to raw text: {}", preview(&text, 120));
            Outcome::Raw { text, warning: RAW_WARNING }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{GenerateForm, Language, Platform, QuickForm};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend double that records every request and replies with a fixed
    /// result.
    pub(crate) struct FakeBackend {
        pub configured: bool,
        pub reply: Result<String, InferenceError>,
        pub calls: AtomicUsize,
        pub last: Mutex<Option<ChatRequest>>,
    }

    impl FakeBackend {
        pub fn replying(text: &str) -> Self {
            Self::new(true, Ok(text.to_string()))
        }

        pub fn failing(err: InferenceError) -> Self {
            Self::new(true, Err(err))
        }

        pub fn unconfigured() -> Self {
            Self::new(false, Err(InferenceError::MissingKey))
        }

        fn new(configured: bool, reply: Result<String, InferenceError>) -> Self {
            Self { configured, reply, calls: AtomicUsize::new(0), last: Mutex::new(None) }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        fn has_credentials(&self) -> bool {
            self.configured
        }

        async fn complete(&self, request: &ChatRequest) -> Result<String, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock() = Some(request.clone());
            self.reply.clone()
        }
    }

    fn form(name: &str) -> GenerateForm {
        serde_json::from_value(json!({ "product_name": name, "features": "cotton" })).unwrap()
    }

    fn request() -> GenerationRequest {
        GenerationRequest::try_from(form("Straw hat")).unwrap()
    }

    #[test]
    fn admit_increments_the_counter() {
        let backend = FakeBackend::replying("{}");
        let (quota, req): (_, GenerationRequest) = admit(&backend, 15, SessionQuota::new(3), form("Hat")).unwrap();
        assert_eq!(quota.calls_used(), 4);
        assert_eq!(req.product_name, "Hat");
    }

    #[test]
    fn admit_checks_credentials_first() {
        let backend = FakeBackend::unconfigured();
        let err = admit::<_, GenerationRequest>(&backend, 15, SessionQuota::new(15), form("")).unwrap_err();
        assert!(matches!(err, SubmitError::MissingCredentials));
    }

    #[test]
    fn admit_rejects_exhausted_quota_before_validation() {
        let backend = FakeBackend::replying("{}");
        let err = admit::<_, GenerationRequest>(&backend, 15, SessionQuota::new(15), form("")).unwrap_err();
        assert!(matches!(err, SubmitError::QuotaExceeded { max: 15 }));
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn admit_rejects_blank_name() {
        let backend = FakeBackend::replying("{}");
        let err = admit::<_, GenerationRequest>(&backend, 15, SessionQuota::new(0), form("   ")).unwrap_err();
        assert!(matches!(err, SubmitError::Validation(ValidationError::MissingProductName)));
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn studio_chat_uses_system_and_user_messages() {
        let chat = studio_chat(&Settings::default(), &request());
        assert_eq!(chat.model, "gpt-4o-mini");
        assert_eq!(chat.max_tokens, 900);
        assert_eq!(chat.messages.len(), 2);
        assert!(chat.messages[0].content.contains("copywriter"));
        assert!(chat.messages[1].content.contains("Product: Straw hat"));
    }

    #[tokio::test]
    async fn fenced_reply_becomes_structured_content() {
        let backend = FakeBackend::replying(
            "Here is your content:\n```json\n{\"title\":\"Hat\",\"captions\":{\"Instagram\":\"Sun!\"},\"hashtags\":{\"Instagram\":[\"summer\"]}}\n```\nEnjoy!",
        );
        let outcome = generate_studio(&backend, &Settings::default(), &request()).await.unwrap();
        let Outcome::Structured { content, download } = outcome else { panic!("expected structured outcome") };
        assert_eq!(content.result.title, "Hat");
        assert_eq!(content.sections.len(), 2);
        assert_eq!(content.sections[0].platform, Platform::Instagram);
        assert_eq!(content.sections[0].hashtag_line, "#summer");
        assert_eq!(content.sections[1].caption, "");
        assert_eq!(download.file_name, "Straw_hat_content.json");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn prose_reply_falls_back_to_raw_text() {
        let backend = FakeBackend::replying("I could not produce JSON, sorry.");
        let outcome = generate_studio(&backend, &Settings::default(), &request()).await.unwrap();
        assert_eq!(outcome, Outcome::Raw { text: "I could not produce JSON, sorry.".into(), warning: RAW_WARNING });
    }

    #[tokio::test]
    async fn inference_failure_carries_the_cause() {
        let backend = FakeBackend::failing(InferenceError::Status { status: 401, body: "invalid key".into() });
        let err = generate_studio(&backend, &Settings::default(), &request()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("invalid key"));
    }

    #[tokio::test]
    async fn quick_empty_object_falls_back_to_raw_text() {
        let backend = FakeBackend::replying("```json\n{}\n```");
        let form: QuickForm = serde_json::from_value(json!({ "product_name": "Blouse" })).unwrap();
        let req = QuickRequest::try_from(form).unwrap();
        let outcome = generate_quick(&backend, &Settings::default(), &req).await.unwrap();
        assert_eq!(outcome, Outcome::Raw { text: "```json\n{}\n```".into(), warning: RAW_WARNING });
    }

    #[tokio::test]
    async fn studio_empty_object_is_still_structured() {
        let backend = FakeBackend::replying("{}");
        let outcome = generate_studio(&backend, &Settings::default(), &request()).await.unwrap();
        assert!(matches!(outcome, Outcome::Structured { .. }));
    }

    #[tokio::test]
    async fn quick_variant_uses_its_own_model() {
        let backend = FakeBackend::replying(r#"{"description":"Nice","hashtags":["eshop"]}"#);
        let form: QuickForm = serde_json::from_value(json!({ "product_name": "Blouse", "language": "English" })).unwrap();
        let req = QuickRequest::try_from(form).unwrap();
        let outcome = generate_quick(&backend, &Settings::default(), &req).await.unwrap();
        let Outcome::Structured { content, .. } = outcome else { panic!("expected structured outcome") };
        assert_eq!(content.result.description, "Nice");
        assert_eq!(content.hashtag_line, "#eshop");

        let sent = backend.last.lock().clone().unwrap();
        assert_eq!(sent.model, "gpt-3.5-turbo");
        assert_eq!(sent.messages.len(), 1);
        assert_eq!(req.language, Language::English);
    }
}
