pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::export::handlers::handle_export_pdf;
use crate::extraction::handlers::handle_parse_resume;
use crate::generation::handlers::handle_generate;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Document Text Extractor
        .route(
            "/api/v1/resumes/parse",
            post(handle_parse_resume).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Generation Orchestrator
        .route("/api/v1/generate", post(handle_generate))
        .route("/generate", post(handle_generate))
        // PDF Renderer
        .route("/api/v1/export/pdf", post(handle_export_pdf))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::extraction::docx_fixture;
    use crate::generation::orchestrator::testing::ScriptedBackend;
    use crate::llm_client::{LlmError, ModelBackend, ModelSlot};

    const BOUNDARY: &str = "tailor-test-boundary";

    fn test_state(model: ModelSlot) -> AppState {
        AppState {
            model,
            config: Config::from_lookup(|_| None).unwrap(),
        }
    }

    fn ready_app(backend: impl ModelBackend + 'static) -> Router {
        build_router(test_state(ModelSlot::ready(Arc::new(backend))))
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn upload_request(filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/v1/resumes/parse")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn generation_body() -> Value {
        json!({
            "resume_text": "Jane Doe\nBackend engineer, 6 years of Rust",
            "job_description": "Senior Rust Engineer, distributed systems"
        })
    }

    #[tokio::test]
    async fn test_health_reports_model_readiness() {
        let app = build_router(test_state(ModelSlot::new()));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"]["state"], "uninitialized");
    }

    #[tokio::test]
    async fn test_generate_returns_all_four_fields() {
        let app = ready_app(ScriptedBackend::happy_path());
        let response = app
            .oneshot(json_request("/api/v1/generate", generation_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["tailored_resume"], "TAILORED RESUME");
        assert_eq!(body["cover_letter"], "COVER LETTER");
        assert_eq!(body["score"], 87);
        assert_eq!(body["analysis"], "Strong keyword alignment.");
    }

    #[tokio::test]
    async fn test_generate_without_ready_backend_is_503() {
        let slot = ModelSlot::new();
        slot.set_failed("Model is not ready: no API key configured.");
        let app = build_router(test_state(slot));

        let response = app
            .oneshot(json_request("/generate", generation_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "BACKEND_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_generate_requires_job_description() {
        let app = ready_app(ScriptedBackend::happy_path());
        let response = app
            .oneshot(json_request(
                "/api/v1/generate",
                json!({ "resume_text": "Jane Doe", "job_description": "   " }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            body["error"]["message"],
            "Please paste the job description to proceed."
        );
    }

    #[tokio::test]
    async fn test_stage_failure_surfaces_cause_without_partial_result() {
        let app = ready_app(ScriptedBackend::new(vec![
            Ok("TAILORED RESUME".to_string()),
            Err(LlmError::Api {
                status: 529,
                message: "overloaded".to_string(),
            }),
        ]));

        let response = app
            .oneshot(json_request("/api/v1/generate", generation_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "GENERATION_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("overloaded"));
        assert!(body.get("tailored_resume").is_none());
    }

    struct StallingBackend;

    #[async_trait]
    impl ModelBackend for StallingBackend {
        async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }

        fn model_name(&self) -> &str {
            "stalling"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_whole_request_timeout_is_504() {
        let mut state = test_state(ModelSlot::ready(Arc::new(StallingBackend)));
        state.config.generation_timeout_secs = 5;
        let app = build_router(state);

        let response = app
            .oneshot(json_request("/api/v1/generate", generation_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "GENERATION_TIMEOUT");
    }

    #[tokio::test]
    async fn test_parse_txt_upload() {
        let app = build_router(test_state(ModelSlot::new()));
        let response = app
            .oneshot(upload_request("resume.txt", b"Jane Doe\nRust"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["format"], "txt");
        assert_eq!(body["text"], "Jane Doe\nRust");
    }

    #[tokio::test]
    async fn test_parse_docx_upload() {
        let app = build_router(test_state(ModelSlot::new()));
        let docx = docx_fixture(&["Jane Doe", "Rust Engineer"]);
        let response = app
            .oneshot(upload_request("Resume.DOCX", &docx))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["format"], "docx");
        assert_eq!(body["text"], "Jane Doe\nRust Engineer\n");
    }

    #[tokio::test]
    async fn test_parse_unsupported_upload_is_422_with_marker() {
        let app = build_router(test_state(ModelSlot::new()));
        let response = app
            .oneshot(upload_request("resume.rtf", b"{\\rtf1}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "EXTRACTION_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_export_pdf_returns_attachment() {
        let app = build_router(test_state(ModelSlot::new()));
        let response = app
            .oneshot(json_request(
                "/api/v1/export/pdf",
                json!({ "text": "Dear Hiring Manager,", "title": "Cover Letter" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Cover_Letter.pdf\""
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_export_pdf_rejects_empty_text() {
        let app = build_router(test_state(ModelSlot::new()));
        let response = app
            .oneshot(json_request("/api/v1/export/pdf", json!({ "text": "" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
