//! Vibe Cache - local image cache and prompt-enhancement companion service
//!
//! Caches uploaded images for a fixed retention window and forwards them,
//! with an instruction and a role profile, to a remote analysis backend.

pub mod analysis;
pub mod api;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod enhance;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{ImageCacheStore, ImageUpload};
pub use config::Config;
pub use tasks::spawn_sweep_task;
