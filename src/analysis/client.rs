//! HTTP client for the analysis backend.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Response;
use tracing::{debug, error, info};

use super::models::{AnalysisRequest, AnalysisResult, ErrorBody, Profile, ProfilesEnvelope};
use crate::cache::ImageUpload;
use crate::config::Config;
use crate::error::{CacheError, Result};

/// Health checks never wait for the full analysis timeout.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    base_url: String,
}

impl AnalysisClient {
    /// Builds a client for `base_url` (including its `/api` prefix).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CacheError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.analysis_api_url.clone(),
            Duration::from_secs(config.analysis_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// `POST /analyze` with a JSON body.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        info!(
            has_image = request.image_base64.is_some(),
            profile = ?request.profile_key,
            "Sending analysis request"
        );

        let response = self
            .http
            .post(self.url("analyze"))
            .json(request)
            .send()
            .await?;

        parse_json(response, "Analysis failed").await
    }

    /// `POST /analyze-upload` with the raw file as multipart.
    pub async fn analyze_upload(
        &self,
        upload: &ImageUpload,
        message: &str,
        profile_key: Option<&str>,
        api_key: &str,
    ) -> Result<AnalysisResult> {
        info!(file_name = %upload.file_name, size = upload.size(), "Uploading image for analysis");

        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.file_type)
            .map_err(|e| CacheError::Validation(format!("invalid MIME type: {}", e)))?;

        let mut form = Form::new()
            .part("file", part)
            .text("message", message.to_string())
            .text("api_key", api_key.to_string());

        if let Some(profile) = profile_key {
            form = form.text("profile_key", profile.to_string());
        }

        let response = self
            .http
            .post(self.url("analyze-upload"))
            .multipart(form)
            .send()
            .await?;

        parse_json(response, "Analysis failed").await
    }

    /// `GET /profiles`, keyed by profile key.
    pub async fn profiles(&self) -> Result<HashMap<String, Profile>> {
        let response = self.http.get(self.url("profiles")).send().await?;
        let envelope: ProfilesEnvelope = parse_json(response, "Failed to fetch profiles").await?;
        Ok(envelope.profiles)
    }

    /// `GET /health`. Any 2xx counts as healthy.
    pub async fn health(&self) -> Result<()> {
        let response = self
            .http
            .get(self.url("health"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(CacheError::Upstream(format!(
                "Health check failed: {}",
                response.status()
            )))
        }
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response, fallback: &str) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    debug!(%status, bytes = body.len(), "Analysis backend responded");

    if !status.is_success() {
        error!(%status, body = %body, "Analysis backend error");
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail)
            .map(|d| match d {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_else(|| format!("{} ({})", fallback, status));
        return Err(CacheError::Upstream(detail));
    }

    serde_json::from_str(&body)
        .map_err(|e| CacheError::Upstream(format!("Failed to parse response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Multipart,
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};

    async fn spawn_backend() -> String {
        let app = Router::new()
            .route(
                "/api/analyze",
                post(|Json(body): Json<Value>| async move {
                    if body["profile_key"] == "missing" {
                        return (
                            StatusCode::NOT_FOUND,
                            Json(json!({"detail": "Profile not found"})),
                        );
                    }
                    let echo = format!(
                        "{}|{}",
                        body["message"].as_str().unwrap_or_default(),
                        body["image_base64"].as_str().unwrap_or("-")
                    );
                    (
                        StatusCode::OK,
                        Json(json!({"status": "success", "summarized_report": echo})),
                    )
                }),
            )
            .route(
                "/api/analyze-upload",
                post(|mut multipart: Multipart| async move {
                    let mut fields = Vec::new();
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        let name = field.name().unwrap_or_default().to_string();
                        let len = field.bytes().await.unwrap().len();
                        fields.push(format!("{}:{}", name, len));
                    }
                    Json(json!({
                        "status": "success",
                        "structured_result": {"analysis_result": fields.join(",")}
                    }))
                }),
            )
            .route(
                "/api/profiles",
                get(|| async {
                    Json(json!({
                        "status": "success",
                        "profiles": {
                            "designer": {"name": "Designer", "description": "UI focus", "analysis_steps": []}
                        }
                    }))
                }),
            )
            .route("/api/health", get(|| async { Json(json!({"status": "healthy"})) }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    #[tokio::test]
    async fn test_analyze_json() {
        let client = AnalysisClient::new(spawn_backend().await, Duration::from_secs(5)).unwrap();

        let result = client
            .analyze(&AnalysisRequest {
                image_base64: Some("AAAA".into()),
                image_filename: Some("a.png".into()),
                message: "describe".into(),
                profile_key: Some("designer".into()),
                api_key: "sk-x".into(),
            })
            .await
            .unwrap();

        assert_eq!(result.report(), "describe|AAAA");
    }

    #[tokio::test]
    async fn test_analyze_error_detail_is_surfaced() {
        let client = AnalysisClient::new(spawn_backend().await, Duration::from_secs(5)).unwrap();

        let err = client
            .analyze(&AnalysisRequest {
                image_base64: None,
                image_filename: None,
                message: "x".into(),
                profile_key: Some("missing".into()),
                api_key: "sk-x".into(),
            })
            .await
            .unwrap_err();

        match err {
            CacheError::Upstream(msg) => assert_eq!(msg, "Profile not found"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_analyze_upload_multipart() {
        let client = AnalysisClient::new(spawn_backend().await, Duration::from_secs(5)).unwrap();
        let upload = ImageUpload::new("a.png", "image/png", vec![1u8; 10]);

        let result = client
            .analyze_upload(&upload, "go", Some("designer"), "sk-x")
            .await
            .unwrap();

        let report = result.report();
        assert!(report.contains("file:10"));
        assert!(report.contains("message:2"));
        assert!(report.contains("profile_key:8"));
        assert!(report.contains("api_key:4"));
    }

    #[tokio::test]
    async fn test_profiles_and_health() {
        let client = AnalysisClient::new(spawn_backend().await, Duration::from_secs(5)).unwrap();

        let profiles = client.profiles().await.unwrap();
        assert_eq!(profiles["designer"].name, "Designer");
        assert!(profiles["designer"].extra.contains_key("analysis_steps"));

        client.health().await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_upstream_error() {
        // port 9 (discard) is almost never listening locally
        let client = AnalysisClient::new("http://127.0.0.1:9/api", Duration::from_secs(2)).unwrap();
        assert!(matches!(client.health().await, Err(CacheError::Upstream(_))));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = AnalysisClient::new("http://x/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("health"), "http://x/api/health");
    }
}
