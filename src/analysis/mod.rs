//! Analysis Backend Module
//!
//! Client and wire types for the remote service that turns an image and an
//! instruction into an enhanced prompt. The service itself is opaque.

mod client;
mod models;

pub use client::AnalysisClient;
pub use models::{AnalysisRequest, AnalysisResult, Profile, FALLBACK_REPORT};
