use axum::{
    Json, Router,
    extract::{rejection::JsonRejection, FromRequest, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use include_dir::{include_dir, Dir};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::{
    config::Settings,
    generate::{self, Outcome, SubmitError},
    models::{GenerateForm, GenerationRequest, QuickForm, QuickRequest},
    openai::ChatBackend,
    render::{QuickContent, StudioContent},
    session::{SessionQuota, SessionStatus, SessionStore},
};

static ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub backend: Arc<dyn ChatBackend>,
    pub settings: Arc<Settings>,
}

impl AppState {
    fn status(&self, session_id: Uuid, quota: SessionQuota) -> SessionStatus {
        SessionStatus::new(session_id, quota, self.settings.max_calls)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/generate", post(generate_studio))
        .route("/api/quick", post(generate_quick))
        .route("/api/session/:id", get(session_status))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub session: SessionStatus,
    pub generated_at: DateTime<Utc>,
    pub outcome: Outcome<T>,
}

#[derive(Debug)]
pub struct ApiError {
    /// Absent when the body could not be read far enough to find a session.
    pub session: Option<SessionStatus>,
    pub error: SubmitError,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self { session: None, error: SubmitError::Body(rejection) }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        if status.is_server_error() {
            tracing::error!("❌ Submission failed: {}", self.error);
        } else {
            tracing::info!("Submission rejected: {}", self.error);
        }
        (status, Json(json!({ "session": self.session, "error": self.error.to_string() }))).into_response()
    }
}

/// JSON body whose rejections come back in the usual error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct FormBody<T>(pub T);

pub async fn index() -> Response {
    match ASSETS.get_file("index.html").and_then(|f| f.contents_utf8()) {
        Some(page) => Html(page).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn generate_studio(
    State(state): State<AppState>,
    FormBody(form): FormBody<GenerateForm>,
) -> Result<Json<Envelope<StudioContent>>, ApiError> {
    let requested = form.session_id;
    // Check and increment happen under one lock; a failed call still spends quota.
    let (session_id, quota, admitted) = state.sessions.transact(requested, |quota| {
        generate::admit::<_, GenerationRequest>(state.backend.as_ref(), state.settings.max_calls, quota, form)
    });
    let request = admitted.map_err(|error| ApiError { session: Some(state.status(session_id, quota)), error })?;

    let outcome = generate::generate_studio(state.backend.as_ref(), &state.settings, &request)
        .await
        .map_err(|error| ApiError { session: Some(state.status(session_id, quota)), error })?;

    Ok(Json(Envelope { session: state.status(session_id, quota), generated_at: Utc::now(), outcome }))
}

pub async fn generate_quick(
    State(state): State<AppState>,
    FormBody(form): FormBody<QuickForm>,
) -> Result<Json<Envelope<QuickContent>>, ApiError> {
    let requested = form.session_id;
    let (session_id, quota, admitted) = state.sessions.transact(requested, |quota| {
        generate::admit::<_, QuickRequest>(state.backend.as_ref(), state.settings.max_calls, quota, form)
    });
    let request = admitted.map_err(|error| ApiError { session: Some(state.status(session_id, quota)), error })?;

    let outcome = generate::generate_quick(state.backend.as_ref(), &state.settings, &request)
        .await
        .map_err(|error| ApiError { session: Some(state.status(session_id, quota)), error })?;

    Ok(Json(Envelope { session: state.status(session_id, quota), generated_at: Utc::now(), outcome }))
}

pub async fn session_status(Path(id): Path<Uuid>, State(state): State<AppState>) -> Response {
    match state.sessions.get(id) {
        Some(quota) => Json(state.status(id, quota)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
