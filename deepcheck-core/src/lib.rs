//! # DeepCheck Core
//!
//! Shared data model, error type and transport encoding for DeepCheck,
//! together with the client for the external deepfake-analysis backend.
//! Nothing in this crate touches a camera; it only knows how to describe
//! media, ship it to the backend and normalize what comes back.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod datauri;
pub mod error;
pub mod model;

// Re-export main types
pub use client::{
    AnalysisClient, AnalysisClientBuilder, AnalysisService, ANALYZE_PATH, VERIFY_PATH,
};
pub use datauri::{mime_for_path, DataUri};
pub use error::{DeepCheckError, DeepCheckResult, ErrorCategory};
pub use model::{AnalysisResult, ImageInfo, Label, MediaInfo, PermissionState};
