//! Prompt Enhancement
//!
//! Combines the image store, the credential slot and the analysis client into
//! the single "enhance this prompt" action.

use std::sync::Arc;

use tracing::info;

use crate::analysis::{AnalysisClient, AnalysisRequest};
use crate::cache::{ImageCacheStore, ImageUpload};
use crate::credentials::CredentialStore;
use crate::error::{CacheError, Result};

/// Instruction used when an image is sent without any text.
pub const DEFAULT_IMAGE_MESSAGE: &str = "Analyze this image and create a detailed design prompt";
/// Instruction used when neither image nor text is given.
pub const DEFAULT_TEXT_MESSAGE: &str = "Create a detailed design prompt";

fn effective_message(message: Option<&str>, with_image: bool) -> String {
    match message.map(str::trim).filter(|m| !m.is_empty()) {
        Some(m) => m.to_string(),
        None if with_image => DEFAULT_IMAGE_MESSAGE.to_string(),
        None => DEFAULT_TEXT_MESSAGE.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct EnhanceService {
    store: Arc<ImageCacheStore>,
    credentials: Arc<CredentialStore>,
    client: AnalysisClient,
}

impl EnhanceService {
    pub fn new(
        store: Arc<ImageCacheStore>,
        credentials: Arc<CredentialStore>,
        client: AnalysisClient,
    ) -> Self {
        Self {
            store,
            credentials,
            client,
        }
    }

    pub fn client(&self) -> &AnalysisClient {
        &self.client
    }

    async fn api_key(&self) -> Result<String> {
        self.credentials
            .get()
            .await
            .ok_or(CacheError::MissingCredential)
    }

    /// Enhances a prompt, optionally grounded on a cached image.
    ///
    /// Returns the backend's report text verbatim. A cached image that is
    /// missing or expired is `NotFound`.
    pub async fn enhance(
        &self,
        image_id: Option<&str>,
        message: Option<&str>,
        profile_key: Option<&str>,
    ) -> Result<String> {
        let api_key = self.api_key().await?;

        let (image_base64, image_filename) = match image_id {
            Some(id) => {
                let image = self
                    .store
                    .get(id)
                    .await?
                    .ok_or_else(|| CacheError::NotFound(format!("cached image {}", id)))?;
                (
                    Some(image.encoded_payload().to_string()),
                    Some(image.file_name),
                )
            }
            None => (None, None),
        };

        let request = AnalysisRequest {
            message: effective_message(message, image_base64.is_some()),
            image_base64,
            image_filename,
            profile_key: profile_key.map(str::to_string),
            api_key,
        };

        let report = self.client.analyze(&request).await?.report();
        info!(image = ?image_id, chars = report.len(), "Prompt enhanced");
        Ok(report)
    }

    /// Enhances a prompt from a file that was never cached.
    pub async fn enhance_upload(
        &self,
        upload: &ImageUpload,
        message: Option<&str>,
        profile_key: Option<&str>,
    ) -> Result<String> {
        let api_key = self.api_key().await?;
        self.store.validate(upload)?;

        let message = effective_message(message, true);
        let result = self
            .client
            .analyze_upload(upload, &message, profile_key, &api_key)
            .await?;
        Ok(result.report())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Backend, StoreOptions};
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::time::Duration;

    async fn spawn_echo_backend() -> String {
        let app = Router::new().route(
            "/api/analyze",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "status": "success",
                    "summarized_report": body.to_string()
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    async fn service(with_key: bool) -> EnhanceService {
        let store = Arc::new(ImageCacheStore::new(Backend::Memory, StoreOptions::default()));
        store.init().await.unwrap();
        let credentials = Arc::new(CredentialStore::in_memory());
        if with_key {
            credentials.set("sk-test").await.unwrap();
        }
        let client = AnalysisClient::new(spawn_echo_backend().await, Duration::from_secs(5)).unwrap();
        EnhanceService::new(store, credentials, client)
    }

    #[test]
    fn test_effective_message() {
        assert_eq!(effective_message(Some("  make it pop "), true), "make it pop");
        assert_eq!(effective_message(Some("   "), true), DEFAULT_IMAGE_MESSAGE);
        assert_eq!(effective_message(None, false), DEFAULT_TEXT_MESSAGE);
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let svc = service(false).await;
        let result = svc.enhance(None, Some("hi"), None).await;
        assert!(matches!(result, Err(CacheError::MissingCredential)));
    }

    #[tokio::test]
    async fn test_enhance_with_cached_image() {
        let svc = service(true).await;
        let id = svc
            .store
            .cache(ImageUpload::new("mockup.png", "image/png", vec![1, 2, 3]))
            .await
            .unwrap();

        let report = svc.enhance(Some(&id), None, Some("designer")).await.unwrap();
        let sent: Value = serde_json::from_str(&report).unwrap();

        assert_eq!(sent["image_base64"], "AQID");
        assert_eq!(sent["image_filename"], "mockup.png");
        assert_eq!(sent["message"], DEFAULT_IMAGE_MESSAGE);
        assert_eq!(sent["profile_key"], "designer");
        assert_eq!(sent["api_key"], "sk-test");
    }

    #[tokio::test]
    async fn test_enhance_text_only() {
        let svc = service(true).await;
        let report = svc.enhance(None, Some("a landing page"), None).await.unwrap();
        let sent: Value = serde_json::from_str(&report).unwrap();

        assert_eq!(sent["message"], "a landing page");
        assert!(sent.get("image_base64").is_none());
    }

    #[tokio::test]
    async fn test_enhance_unknown_image() {
        let svc = service(true).await;
        let result = svc.enhance(Some("img_nope"), None, None).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_enhance_upload_validates_before_sending() {
        let svc = service(true).await;
        let upload = ImageUpload::new("notes.txt", "text/plain", b"hello".to_vec());
        let result = svc.enhance_upload(&upload, None, None).await;
        assert!(matches!(result, Err(CacheError::Validation(_))));
    }
}
