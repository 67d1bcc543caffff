//! Error types for zzload
//!
//! Two families exist and they never mix:
//! - `ConfigError` is raised while building options, before anything is watched
//! - `MarkupError` describes elements whose declarative markup cannot be served;
//!   it is logged and reported, never raised past the dispatch boundary

use thiserror::Error;

/// Errors produced while turning user configuration into options
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid root margin {margin:?}: {reason}")]
    InvalidRootMargin { margin: String, reason: String },

    #[error("Threshold {0} is outside [0, 1]")]
    ThresholdOutOfRange(f64),

    #[error("Threshold list is empty")]
    EmptyThresholds,

    #[error("Attribute prefix must not be empty")]
    EmptyAttributePrefix,

    #[error("Intersection observer rejected its settings: {0}")]
    ObserverRejected(String),

    #[error("Invalid configuration document: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Problems with an element's declarative markup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("No `img` inside `picture`")]
    PictureWithoutImage,

    #[error("No `source-img` on the picture child matching the rendered candidate {current:?}")]
    PictureCandidateMismatch { current: String },

    #[error("`source-image` requires a nested SVG `image` element")]
    SvgImageMissing,

    #[error("Element has no zzload source")]
    NoSource,
}

impl MarkupError {
    /// Caller-side configuration problem (as opposed to a benign no-op)
    pub fn is_configuration(&self) -> bool {
        !matches!(self, MarkupError::NoSource)
    }
}

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;
