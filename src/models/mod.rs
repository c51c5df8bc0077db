//! Request and Response models for the HTTP API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{EnhanceRequest, SetApiKeyRequest};
pub use responses::{
    CacheImageResponse, ClearResponse, CredentialStatusResponse, EnhanceResponse, ErrorResponse,
    HealthResponse, ImageSummary, PayloadResponse, ProfilesResponse, RemoveResponse, SizeResponse,
    SweepResponse,
};
