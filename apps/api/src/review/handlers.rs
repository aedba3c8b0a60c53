use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::ProviderStatus;
use crate::review::export::{export_report, ExportFormat};
use crate::review::extractor::ResumeSource;
use crate::review::models::ReviewSettings;
use crate::review::pipeline::{run_review, ReviewReport, ReviewSubmission};
use crate::review::session::SessionState;
use crate::state::AppState;

pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub resume_text: String,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub settings: ReviewSettings,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub session_id: Uuid,
    pub analysis_count: u32,
    pub report: ReviewReport,
}

fn requested_session(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
}

/// Echoes the session id on every response, errors included.
fn with_session(session_id: Uuid, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    if let Ok(value) = HeaderValue::from_str(&session_id.to_string()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

async fn review_and_record(
    state: &AppState,
    session_id: Uuid,
    submission: ReviewSubmission,
) -> Result<Json<ReviewResponse>, AppError> {
    let outcome = run_review(
        &state.providers,
        &state.validation,
        &state.scorer,
        submission,
    )
    .await?;

    // The session is only touched once the whole pipeline has succeeded. A session
    // purged during the provider call is recreated so the result is not lost.
    let report = outcome.report.clone();
    let session = state
        .sessions
        .upsert(session_id, |s| s.record_success(outcome.report, outcome.resume_text))
        .await;

    info!(
        "Session {} completed analysis #{}",
        session_id, session.analysis_count
    );

    Ok(Json(ReviewResponse {
        session_id,
        analysis_count: session.analysis_count,
        report,
    }))
}

/// POST /api/v1/reviews
pub async fn handle_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Response {
    let session = state.sessions.get_or_create(requested_session(&headers)).await;
    let result = match body {
        Ok(Json(req)) => {
            let submission = ReviewSubmission {
                source: ResumeSource::Text(req.resume_text),
                job_description: req.job_description,
                settings: req.settings,
            };
            review_and_record(&state, session.session_id, submission).await
        }
        Err(rejection) => Err(AppError::Validation(format!(
            "invalid request body: {}",
            rejection.body_text()
        ))),
    };
    with_session(session.session_id, result)
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::Validation(format!("malformed upload: {err}"))
}

async fn read_upload(mut multipart: Multipart) -> Result<ReviewSubmission, AppError> {
    let mut pdf = None;
    let mut pasted = None;
    let mut job_description = None;
    let mut settings = ReviewSettings::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if !bytes.is_empty() {
                    pdf = Some(bytes);
                }
            }
            "resume_text" => pasted = Some(field.text().await.map_err(multipart_error)?),
            "job_description" => {
                job_description = Some(field.text().await.map_err(multipart_error)?)
            }
            "settings" => {
                let raw = field.text().await.map_err(multipart_error)?;
                settings = serde_json::from_str(&raw)
                    .map_err(|e| AppError::Validation(format!("invalid settings: {e}")))?;
            }
            _ => {}
        }
    }

    // An uploaded file takes precedence over pasted text.
    let source = match (pdf, pasted) {
        (Some(bytes), _) => ResumeSource::Pdf(bytes),
        (None, Some(text)) if !text.trim().is_empty() => ResumeSource::Text(text),
        _ => {
            return Err(AppError::Validation(
                "no resume provided; upload a PDF or paste the resume text".to_string(),
            ))
        }
    };

    Ok(ReviewSubmission {
        source,
        job_description,
        settings,
    })
}

/// POST /api/v1/reviews/upload
pub async fn handle_upload_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let session = state.sessions.get_or_create(requested_session(&headers)).await;
    let result = match read_upload(multipart).await {
        Ok(submission) => review_and_record(&state, session.session_id, submission).await,
        Err(e) => Err(e),
    };
    with_session(session.session_id, result)
}

/// GET /api/v1/providers
pub async fn handle_providers(State(state): State<AppState>) -> Json<Vec<ProviderStatus>> {
    Json(state.providers.status())
}

/// GET /api/v1/session
pub async fn handle_get_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = state.sessions.get_or_create(requested_session(&headers)).await;
    with_session(session.session_id, Json(session))
}

/// POST /api/v1/session/reset
pub async fn handle_reset_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = state.sessions.get_or_create(requested_session(&headers)).await;
    let id = session.session_id;
    let result: Result<Json<SessionState>, AppError> = state
        .sessions
        .update(id, SessionState::reset)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Session {id} expired")));
    with_session(id, result)
}

/// GET /api/v1/session/export/:format
pub async fn handle_export(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(format): Path<ExportFormat>,
) -> Response {
    let session = state.sessions.get_or_create(requested_session(&headers)).await;
    let id = session.session_id;
    let result = match &session.last_result {
        None => Err(AppError::NotFound(
            "No analysis result in this session".to_string(),
        )),
        Some(report) => export_report(report, format, Utc::now())
            .map_err(AppError::from)
            .map(|file| {
                (
                    [
                        (header::CONTENT_TYPE, file.content_type.to_string()),
                        (
                            header::CONTENT_DISPOSITION,
                            format!("attachment; filename=\"{}\"", file.file_name),
                        ),
                    ],
                    file.body,
                )
            }),
    };
    with_session(id, result)
}
