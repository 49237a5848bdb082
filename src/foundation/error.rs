use std::{fmt, path::PathBuf};

/// Result alias used across the engine.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Pipeline stage at which a failure happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Request validation and normalization.
    Validate,
    /// Image index lookup.
    Resolve,
    /// Region decode from the source raster.
    Decode,
    /// Color table application.
    Colorize,
    /// Instrument alpha mask.
    Mask,
    /// Resampling to the requested scale.
    Resize,
    /// Canvas extent / padding.
    Pad,
    /// Layer merge.
    Composite,
    /// Watermark overlay.
    Watermark,
    /// File encoding.
    Encode,
    /// Cache directory or file write.
    CacheWrite,
    /// Loading deployment inputs such as the catalog, config or fonts.
    Setup,
}

impl Stage {
    /// Stable lowercase name, used in logs and error text.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::Resolve => "resolve",
            Stage::Decode => "decode",
            Stage::Colorize => "colorize",
            Stage::Mask => "mask",
            Stage::Resize => "resize",
            Stage::Pad => "pad",
            Stage::Composite => "composite",
            Stage::Watermark => "watermark",
            Stage::Encode => "encode",
            Stage::CacheWrite => "cache-write",
            Stage::Setup => "setup",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged failure for a composite request.
///
/// A request either produces its full composite or fails with exactly one of these; there is no
/// partial-result degradation. `Display` carries full detail for logs, while
/// [`ComposeError::user_message`] is safe to echo to untrusted callers.
#[derive(thiserror::Error, Debug)]
pub enum ComposeError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("source unavailable for layer '{layer}': {reason}")]
    SourceUnavailable { layer: String, reason: String },

    #[error("{stage} failure in layer '{layer}': {detail}")]
    DecodeFailure {
        layer: String,
        stage: Stage,
        detail: String,
    },

    #[error("encode failure{}: {detail}", layer_suffix(.layer))]
    EncodeFailure {
        layer: Option<String>,
        detail: String,
    },

    #[error("{stage} failure: {detail}")]
    CompositeFailure { stage: Stage, detail: String },

    #[error("cache write failure at '{}': {source}", .path.display())]
    CacheWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn layer_suffix(layer: &Option<String>) -> String {
    match layer {
        Some(l) => format!(" in layer '{l}'"),
        None => String::new(),
    }
}

impl ComposeError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn unavailable(layer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            layer: layer.into(),
            reason: reason.into(),
        }
    }

    pub fn decode(layer: impl Into<String>, stage: Stage, detail: impl fmt::Display) -> Self {
        Self::DecodeFailure {
            layer: layer.into(),
            stage,
            detail: detail.to_string(),
        }
    }

    pub fn encode(layer: Option<&str>, detail: impl fmt::Display) -> Self {
        Self::EncodeFailure {
            layer: layer.map(str::to_owned),
            detail: detail.to_string(),
        }
    }

    pub fn composite(stage: Stage, detail: impl fmt::Display) -> Self {
        Self::CompositeFailure {
            stage,
            detail: detail.to_string(),
        }
    }

    pub fn cache_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CacheWriteFailure {
            path: path.into(),
            source,
        }
    }

    /// Stage the failure is attributed to.
    pub fn stage(&self) -> Stage {
        match self {
            Self::InvalidRequest(_) => Stage::Validate,
            Self::SourceUnavailable { .. } => Stage::Resolve,
            Self::DecodeFailure { stage, .. } => *stage,
            Self::EncodeFailure { .. } => Stage::Encode,
            Self::CompositeFailure { stage, .. } => *stage,
            Self::CacheWriteFailure { .. } => Stage::CacheWrite,
            Self::Other(_) => Stage::Setup,
        }
    }

    /// Name of the failing layer, when the failure belongs to one.
    pub fn layer(&self) -> Option<&str> {
        match self {
            Self::SourceUnavailable { layer, .. } | Self::DecodeFailure { layer, .. } => {
                Some(layer.as_str())
            }
            Self::EncodeFailure { layer, .. } => layer.as_deref(),
            _ => None,
        }
    }

    /// Short message without paths or toolkit output.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRequest(msg) => format!("Invalid request: {msg}"),
            Self::SourceUnavailable { layer, .. } => {
                format!("No {layer} data is available for the requested time.")
            }
            Self::DecodeFailure { layer, stage, .. } => {
                format!("Unable to process the {layer} layer ({stage}).")
            }
            Self::EncodeFailure { layer: Some(l), .. } => {
                format!("Unable to encode the {l} layer.")
            }
            Self::EncodeFailure { layer: None, .. } => {
                "Unable to encode the composite image.".to_string()
            }
            Self::CompositeFailure { stage, .. } => {
                format!("Unable to compile composite image layers ({stage}).")
            }
            Self::CacheWriteFailure { .. } => {
                "The image cache is not writable; please try again later.".to_string()
            }
            Self::Other(_) => "The request could not be processed.".to_string(),
        }
    }
}
