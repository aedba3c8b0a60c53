pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::review::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/providers", get(handlers::handle_providers))
        // Reviews
        .route("/api/v1/reviews", post(handlers::handle_review))
        .route("/api/v1/reviews/upload", post(handlers::handle_upload_review))
        // Session
        .route("/api/v1/session", get(handlers::handle_get_session))
        .route("/api/v1/session/reset", post(handlers::handle_reset_session))
        .route(
            "/api/v1/session/export/:format",
            get(handlers::handle_export),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm_client::{Provider, ProviderRegistry};
    use crate::review::handlers::SESSION_HEADER;
    use crate::review::pipeline::tests::{
        sample_resume_pdf, FakeProvider, SAMPLE_ANALYSIS, SAMPLE_RESUME,
    };
    use crate::review::scoring::{GradeCutoffs, ScoringConfig};
    use crate::review::session::SessionStore;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state_with(fake: Arc<FakeProvider>) -> AppState {
        let registry = ProviderRegistry::default().with_provider(fake);
        AppState::new(Config::default(), registry)
    }

    fn app_with(fake: Arc<FakeProvider>) -> Router {
        build_router(state_with(fake))
    }

    /// Same as `app_with`, but sessions expire after `idle`.
    fn app_with_idle(fake: Arc<FakeProvider>, idle: chrono::Duration) -> Router {
        let mut state = state_with(fake);
        state.sessions = SessionStore::new(idle);
        build_router(state)
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    fn session_of(response: &Response) -> String {
        response.headers()[SESSION_HEADER].to_str().unwrap().to_string()
    }

    fn json_post(uri: &str, session: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(id) = session {
            builder = builder.header(SESSION_HEADER, id);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_with_session(uri: &str, session: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(SESSION_HEADER, session)
            .body(Body::empty())
            .unwrap()
    }

    /// Runs one successful review and returns the session id it was recorded under.
    async fn reviewed_session(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(json_post(
                "/api/v1/reviews",
                None,
                json!({ "resume_text": SAMPLE_RESUME }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        session_of(&response)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with(FakeProvider::replying(Provider::OpenAi, SAMPLE_ANALYSIS));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_provider_status_lists_all_three() {
        let app = app_with(FakeProvider::replying(Provider::Anthropic, SAMPLE_ANALYSIS));
        let response = app
            .oneshot(Request::builder().uri("/api/v1/providers").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        let providers = body.as_array().unwrap();
        assert_eq!(providers.len(), 3);
        let configured: Vec<&str> = providers
            .iter()
            .filter(|p| p["configured"] == true)
            .map(|p| p["provider"].as_str().unwrap())
            .collect();
        assert_eq!(configured, vec!["anthropic"]);
    }

    #[tokio::test]
    async fn test_review_records_result_in_session() {
        let fake = FakeProvider::replying(Provider::OpenAi, SAMPLE_ANALYSIS);
        let app = app_with(fake.clone());

        let response = app
            .clone()
            .oneshot(json_post(
                "/api/v1/reviews",
                None,
                json!({
                    "resume_text": SAMPLE_RESUME,
                    "job_description": "Backend engineer, Python",
                    "settings": {"job_role": "Backend Engineer", "experience_level": "senior"}
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let session = session_of(&response);
        let body = body_json(response).await;
        assert_eq!(body["session_id"], session.as_str());
        assert_eq!(body["analysis_count"], 1);
        assert_eq!(body["report"]["job_role"], "Backend Engineer");
        assert_eq!(body["report"]["scores"]["grade"].as_str().map(str::len), Some(1));
        assert_eq!(fake.call_count(), 1);

        let response = app
            .oneshot(get_with_session("/api/v1/session", &session))
            .await
            .unwrap();
        let snapshot = body_json(response).await;
        assert_eq!(snapshot["analysis_complete"], true);
        assert_eq!(snapshot["analysis_count"], 1);
        assert!(snapshot.get("resume_text").is_none());
    }

    #[tokio::test]
    async fn test_short_resume_is_rejected_without_provider_call() {
        let fake = FakeProvider::replying(Provider::OpenAi, SAMPLE_ANALYSIS);
        let app = app_with(fake.clone());

        let response = app
            .clone()
            .oneshot(json_post("/api/v1/reviews", None, json!({ "resume_text": "a b" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let session = session_of(&response);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["suggestion"].is_string());
        assert_eq!(fake.call_count(), 0);

        let snapshot = body_json(
            app.oneshot(get_with_session("/api/v1/session", &session))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(snapshot["analysis_count"], 0);
        assert_eq!(snapshot["last_result"], Value::Null);
    }

    #[tokio::test]
    async fn test_provider_timeout_leaves_session_untouched() {
        let app = app_with(FakeProvider::timing_out(Provider::OpenAi));

        let response = app
            .clone()
            .oneshot(json_post(
                "/api/v1/reviews",
                None,
                json!({ "resume_text": SAMPLE_RESUME }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let session = session_of(&response);
        assert_eq!(body_json(response).await["error"]["code"], "REQUEST_ERROR");

        let snapshot = body_json(
            app.oneshot(get_with_session("/api/v1/session", &session))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(snapshot["analysis_count"], 0);
        assert_eq!(snapshot["analysis_complete"], false);
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_service_unavailable() {
        let app = app_with(FakeProvider::replying(Provider::OpenAi, SAMPLE_ANALYSIS));
        let response = app
            .oneshot(json_post(
                "/api/v1/reviews",
                None,
                json!({ "resume_text": SAMPLE_RESUME, "settings": {"provider": "google"} }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["error"]["code"], "CONFIGURATION_ERROR");
    }

    #[tokio::test]
    async fn test_text_export_after_review() {
        let app = app_with(FakeProvider::replying(Provider::OpenAi, SAMPLE_ANALYSIS));
        let session = reviewed_session(&app).await;

        let response = app
            .oneshot(get_with_session("/api/v1/session/export/text", &session))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("resume_analysis_"));
        assert!(disposition.ends_with(".txt\""));
        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(text.starts_with("=== RESUME ANALYSIS SUMMARY ==="));
        assert!(text.contains("STRENGTHS:\n1. Quantified performance gains"));
    }

    #[tokio::test]
    async fn test_pdf_export_after_review() {
        let app = app_with(FakeProvider::replying(Provider::OpenAi, SAMPLE_ANALYSIS));
        let session = reviewed_session(&app).await;

        let response = app
            .oneshot(get_with_session("/api/v1/session/export/pdf", &session))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert!(body_bytes(response).await.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_export_without_result_is_not_found() {
        let app = app_with(FakeProvider::replying(Provider::OpenAi, SAMPLE_ANALYSIS));
        let response = app
            .oneshot(Request::builder().uri("/api/v1/session/export/json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key(SESSION_HEADER));
    }

    #[tokio::test]
    async fn test_unknown_export_format_is_rejected() {
        let app = app_with(FakeProvider::replying(Provider::OpenAi, SAMPLE_ANALYSIS));
        let response = app
            .oneshot(Request::builder().uri("/api/v1/session/export/docx").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_reset_clears_result_but_keeps_count() {
        let app = app_with(FakeProvider::replying(Provider::OpenAi, SAMPLE_ANALYSIS));
        let session = reviewed_session(&app).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/session/reset")
                    .header(SESSION_HEADER, &session)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(session_of(&response), session);
        let body = body_json(response).await;
        assert_eq!(body["analysis_complete"], false);
        assert_eq!(body["last_result"], Value::Null);
        assert_eq!(body["analysis_count"], 1);

        let response = app
            .oneshot(get_with_session("/api/v1/session/export/json", &session))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    fn multipart_body(boundary: &str, fields: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            let file_name = if *name == "resume" {
                "; filename=\"resume.pdf\"\r\nContent-Type: application/pdf"
            } else {
                ""
            };
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"{file_name}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(value);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        body
    }

    fn multipart_post(fields: &[(&str, &str)]) -> Request<Body> {
        let fields: Vec<(&str, &[u8])> = fields.iter().map(|(n, v)| (*n, v.as_bytes())).collect();
        multipart_post_bytes(&fields)
    }

    fn multipart_post_bytes(fields: &[(&str, &[u8])]) -> Request<Body> {
        let boundary = "reviewer-test-boundary";
        Request::builder()
            .method("POST")
            .uri("/api/v1/reviews/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(multipart_body(boundary, fields)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_multipart_upload_with_pasted_text() {
        let fake = FakeProvider::replying(Provider::Google, SAMPLE_ANALYSIS);
        let app = app_with(fake.clone());

        let response = app
            .oneshot(multipart_post(&[
                ("resume_text", SAMPLE_RESUME),
                ("job_description", "Senior Python developer"),
                ("settings", r#"{"provider": "google", "industry": "Finance"}"#),
            ]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["report"]["provider"], "google");
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn test_multipart_upload_with_broken_pdf() {
        let fake = FakeProvider::replying(Provider::OpenAi, SAMPLE_ANALYSIS);
        let app = app_with(fake.clone());

        let response = app
            .oneshot(multipart_post(&[("resume", "definitely not a pdf")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"]["code"], "EXTRACTION_ERROR");
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_multipart_upload_requires_a_resume() {
        let app = app_with(FakeProvider::replying(Provider::OpenAi, SAMPLE_ANALYSIS));
        let response = app
            .oneshot(multipart_post(&[("job_description", "Anything")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_multipart_upload_with_text_pdf() {
        let fake = FakeProvider::replying(Provider::OpenAi, SAMPLE_ANALYSIS);
        let app = app_with(fake.clone());
        let pdf = sample_resume_pdf();

        let response = app
            .oneshot(multipart_post_bytes(&[
                ("resume", pdf.as_slice()),
                ("job_description", b"Backend engineer".as_slice()),
            ]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["analysis_count"], 1);
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_json_body_gets_error_envelope() {
        let fake = FakeProvider::replying(Provider::OpenAi, SAMPLE_ANALYSIS);
        let app = app_with(fake.clone());

        let response = app
            .oneshot(json_post(
                "/api/v1/reviews",
                None,
                json!({ "job_description": "resume_text is missing" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().contains_key(SESSION_HEADER));
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("resume_text"));
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_scoring_config_reaches_the_scorer() {
        let registry = ProviderRegistry::default()
            .with_provider(FakeProvider::replying(Provider::OpenAi, SAMPLE_ANALYSIS));
        let unreachable = GradeCutoffs {
            a: 11.0,
            b: 11.0,
            c: 11.0,
            d: 11.0,
        };
        let scoring = ScoringConfig {
            cutoffs: unreachable,
            ..ScoringConfig::default()
        };
        let app = build_router(AppState::with_scoring(Config::default(), registry, scoring));

        let response = app
            .oneshot(json_post(
                "/api/v1/reviews",
                None,
                json!({ "resume_text": SAMPLE_RESUME }),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["report"]["scores"]["grade"], "F");
    }

    #[tokio::test]
    async fn test_reading_a_session_keeps_it_alive() {
        let app = app_with_idle(
            FakeProvider::replying(Provider::OpenAi, SAMPLE_ANALYSIS),
            chrono::Duration::milliseconds(300),
        );
        let session = reviewed_session(&app).await;

        // Four reads 150 ms apart span twice the idle window.
        for _ in 0..4 {
            tokio::time::sleep(Duration::from_millis(150)).await;
            let response = app
                .clone()
                .oneshot(get_with_session("/api/v1/session", &session))
                .await
                .unwrap();
            assert_eq!(session_of(&response), session);
            assert_eq!(body_json(response).await["analysis_count"], 1);
        }
    }

    #[tokio::test]
    async fn test_session_purged_during_review_keeps_the_result() {
        let app = app_with_idle(
            FakeProvider::slow(Provider::OpenAi, SAMPLE_ANALYSIS, Duration::from_millis(300)),
            chrono::Duration::milliseconds(100),
        );

        let review = tokio::spawn(app.clone().oneshot(json_post(
            "/api/v1/reviews",
            None,
            json!({ "resume_text": SAMPLE_RESUME }),
        )));

        // A concurrent request purges the in-flight session while the provider is busy.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let other = app
            .clone()
            .oneshot(Request::builder().uri("/api/v1/session").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(other.status(), StatusCode::OK);

        let response = review.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let session = session_of(&response);
        assert_eq!(body_json(response).await["analysis_count"], 1);

        let snapshot = body_json(
            app.oneshot(get_with_session("/api/v1/session", &session))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(snapshot["session_id"], session.as_str());
        assert_eq!(snapshot["analysis_complete"], true);
        assert_ne!(snapshot["last_result"], Value::Null);
    }
}
