//! API Handlers
//!
//! HTTP request handlers for each endpoint of the image cache service.

use std::sync::Arc;

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::analysis::AnalysisClient;
use crate::cache::{CachedImage, ImageCacheStore, ImageUpload};
use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::enhance::EnhanceService;
use crate::error::{CacheError, Result};
use crate::models::{
    CacheImageResponse, ClearResponse, CredentialStatusResponse, EnhanceRequest,
    EnhanceResponse, HealthResponse, ImageSummary, PayloadResponse, ProfilesResponse,
    RemoveResponse, SetApiKeyRequest, SizeResponse, SweepResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Image store, initialized before the router is served
    pub store: Arc<ImageCacheStore>,
    /// API key slot
    pub credentials: Arc<CredentialStore>,
    /// Enhancement flow over the store and the analysis backend
    pub enhancer: Arc<EnhanceService>,
}

impl AppState {
    /// Creates a new AppState from its parts.
    pub fn new(
        store: Arc<ImageCacheStore>,
        credentials: Arc<CredentialStore>,
        client: AnalysisClient,
    ) -> Self {
        let enhancer = EnhanceService::new(store.clone(), credentials.clone(), client);
        Self {
            store,
            credentials,
            enhancer: Arc::new(enhancer),
        }
    }

    /// Builds the state from configuration, opening the store and loading
    /// any persisted API key.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = Arc::new(ImageCacheStore::from_config(config));
        store.init().await?;

        let credentials = Arc::new(CredentialStore::with_file(config.credentials_path()));
        credentials.load().await?;

        let client = AnalysisClient::from_config(config)?;
        Ok(Self::new(store, credentials, client))
    }
}

fn not_found(id: &str) -> CacheError {
    CacheError::NotFound(format!("image {}", id))
}

fn multipart_error(e: impl std::fmt::Display) -> CacheError {
    CacheError::InvalidRequest(format!("malformed multipart body: {}", e))
}

async fn read_upload(field: Field<'_>) -> Result<ImageUpload> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let file_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field.bytes().await.map_err(multipart_error)?;
    Ok(ImageUpload::new(file_name, file_type, bytes.to_vec()))
}

/// Handler for POST /images
///
/// Caches the multipart field `file`.
pub async fn cache_image_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CacheImageResponse>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            let upload = read_upload(field).await?;
            let id = state.store.cache(upload).await?;
            return Ok(Json(CacheImageResponse::new(id)));
        }
    }

    Err(CacheError::InvalidRequest(
        "multipart field 'file' is required".to_string(),
    ))
}

/// Handler for GET /images
pub async fn list_images_handler(State(state): State<AppState>) -> Result<Json<Vec<ImageSummary>>> {
    let images = state.store.list_all().await?;
    Ok(Json(images.iter().map(ImageSummary::from).collect()))
}

/// Handler for GET /images/:id
///
/// Returns the full entry, content included.
pub async fn get_image_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CachedImage>> {
    let image = state.store.get(&id).await?.ok_or_else(|| not_found(&id))?;
    Ok(Json(image))
}

/// Handler for GET /images/:id/payload
pub async fn get_payload_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PayloadResponse>> {
    let payload = state
        .store
        .get_encoded_payload(&id)
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(PayloadResponse { id, payload }))
}

/// Handler for GET /images/:id/raw
///
/// Serves the decoded image with its own MIME type.
pub async fn get_raw_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let (mime, bytes) = state
        .store
        .get_bytes(&id)
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(([(header::CONTENT_TYPE, mime)], bytes).into_response())
}

/// Handler for DELETE /images/:id
///
/// Succeeds whether or not the id exists.
pub async fn remove_image_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RemoveResponse>> {
    state.store.remove(&id).await?;
    Ok(Json(RemoveResponse::new(id)))
}

/// Handler for DELETE /images
pub async fn clear_images_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    state.store.clear_all().await?;
    Ok(Json(ClearResponse::new()))
}

/// Handler for GET /images/size
pub async fn size_handler(State(state): State<AppState>) -> Result<Json<SizeResponse>> {
    let size = state.store.size().await?;
    Ok(Json(size.into()))
}

/// Handler for POST /maintenance/sweep
pub async fn sweep_handler(State(state): State<AppState>) -> Result<Json<SweepResponse>> {
    let removed = state.store.sweep_expired().await?;
    Ok(Json(SweepResponse { removed }))
}

/// Handler for PUT /credentials
pub async fn set_api_key_handler(
    State(state): State<AppState>,
    Json(req): Json<SetApiKeyRequest>,
) -> Result<Json<CredentialStatusResponse>> {
    state.credentials.set(&req.api_key).await?;
    Ok(Json(CredentialStatusResponse { configured: true }))
}

/// Handler for GET /credentials
///
/// Never echoes the key itself.
pub async fn credential_status_handler(
    State(state): State<AppState>,
) -> Json<CredentialStatusResponse> {
    Json(CredentialStatusResponse {
        configured: state.credentials.is_configured().await,
    })
}

/// Handler for DELETE /credentials
pub async fn clear_api_key_handler(
    State(state): State<AppState>,
) -> Result<Json<CredentialStatusResponse>> {
    state.credentials.clear().await?;
    Ok(Json(CredentialStatusResponse { configured: false }))
}

/// Handler for POST /enhance
pub async fn enhance_handler(
    State(state): State<AppState>,
    Json(req): Json<EnhanceRequest>,
) -> Result<Json<EnhanceResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let report = state
        .enhancer
        .enhance(
            req.image_id.as_deref(),
            req.message.as_deref(),
            req.profile_key.as_deref(),
        )
        .await?;
    Ok(Json(EnhanceResponse { report }))
}

/// Handler for POST /enhance/upload
///
/// Multipart fields: `file` (required), `message`, `profile_key`.
pub async fn enhance_upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<EnhanceResponse>> {
    let mut upload = None;
    let mut message = None;
    let mut profile_key = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => upload = Some(read_upload(field).await?),
            Some("message") => message = Some(field.text().await.map_err(multipart_error)?),
            Some("profile_key") => {
                profile_key = Some(field.text().await.map_err(multipart_error)?)
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| {
        CacheError::InvalidRequest("multipart field 'file' is required".to_string())
    })?;
    let report = state
        .enhancer
        .enhance_upload(&upload, message.as_deref(), profile_key.as_deref())
        .await?;
    Ok(Json(EnhanceResponse { report }))
}

/// Handler for GET /profiles
///
/// Proxies the analysis backend's role profiles.
pub async fn profiles_handler(State(state): State<AppState>) -> Result<Json<ProfilesResponse>> {
    let profiles = state.enhancer.client().profiles().await?;
    Ok(Json(ProfilesResponse { profiles }))
}

/// Handler for GET /health
///
/// Also checks the analysis backend; an unreachable backend is reported but
/// does not degrade the status.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let reachable = match state.enhancer.client().health().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Analysis backend health check failed");
            false
        }
    };
    Json(HealthResponse::with_store(state.store.is_ready()).with_analysis_backend(reachable))
}
