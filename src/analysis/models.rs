//! Wire types for the analysis backend.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Shown when the backend answers successfully without any report text.
pub const FALLBACK_REPORT: &str = "Enhancement completed";

/// JSON body of `POST /analyze`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_filename: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_key: Option<String>,
    pub api_key: String,
}

/// Response of both analyze endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub structured_result: serde_json::Value,
    #[serde(default)]
    pub markdown_report: Option<String>,
    #[serde(default)]
    pub summarized_report: Option<String>,
}

impl AnalysisResult {
    /// The text handed back to the user, used verbatim.
    ///
    /// Prefers the summarized report, then the plain `analysis_result` of a
    /// message-only analysis, then a fixed fallback.
    pub fn report(&self) -> String {
        self.summarized_report
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.structured_result
                    .get("analysis_result")
                    .and_then(|v| v.as_str())
            })
            .unwrap_or(FALLBACK_REPORT)
            .to_string()
    }
}

/// A role profile as described by the backend. Only the fields the service
/// displays are typed; the rest is kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfilesEnvelope {
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// FastAPI-style error body.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}
