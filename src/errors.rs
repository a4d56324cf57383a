//! Error Types
//!
//! This module defines the error types used by the pipeline.
//!
//! # Overview
//!
//! Frame-time code never fails: over-budget shadow requests, degenerate bloom
//! buffers and missing post-processing settings all degrade gracefully. The
//! errors below are raised only when a pipeline is built from settings that
//! cannot produce a valid frame:
//! - Out-of-range numeric settings
//! - Unsupported LUT resolutions and shadow atlas sizes
//! - Malformed settings documents
//!
//! # Usage
//!
//! ```rust,ignore
//! use custom_rp::errors::Result;
//! use custom_rp::{PipelineSettings, RenderPipeline};
//!
//! fn build(json: &str) -> Result<RenderPipeline> {
//!     let settings = PipelineSettings::from_json(json)?;
//!     RenderPipeline::new(settings)
//! }
//! ```

use thiserror::Error;

/// The main error type for pipeline construction.
#[derive(Error, Debug)]
pub enum PipelineError {
    // ========================================================================
    // Settings Validation
    // ========================================================================
    /// A settings field holds a value outside its accepted range.
    #[error("Invalid setting `{field}`: {reason}")]
    InvalidSettings {
        /// Dotted path of the offending field
        field: &'static str,
        /// Human-readable description of the accepted range
        reason: String,
    },

    /// The color grading LUT resolution is not one of 16, 32 or 64.
    #[error("Unsupported color LUT resolution: {0} (expected 16, 32 or 64)")]
    InvalidLutResolution(u32),

    /// A shadow atlas size is not a power of two in `256..=8192`.
    #[error("Unsupported shadow atlas size: {0} (expected a power of two in 256..=8192)")]
    InvalidAtlasSize(u32),

    /// The render scale is not finite or outside `0.1..=2.0`.
    #[error("Render scale out of range: {0} (expected 0.1..=2.0)")]
    InvalidRenderScale(f32),

    // ========================================================================
    // Format & Parsing Errors
    // ========================================================================
    /// JSON parsing error while loading settings.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Alias for `Result<T, PipelineError>`.
pub type Result<T> = std::result::Result<T, PipelineError>;
