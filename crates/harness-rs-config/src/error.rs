//! Error types for config resolution.

use crate::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while resolving a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The target structure or its descriptor table is unusable.
    #[error("invalid config schema: {0}")]
    Schema(String),
    /// A bundled overlay name is not registered.
    #[error("bundled overlay {name:?} not found")]
    OverlayNotFound { name: String },
    /// Reading an overlay file failed.
    #[error("failed to read overlay {}: {source}", .path.display())]
    OverlayRead {
        path: PathBuf,
        source: std::io::Error,
    },
    /// An overlay document is not valid YAML.
    #[error("failed to parse overlay {overlay}: {source}")]
    OverlayParse {
        overlay: String,
        source: serde_yaml::Error,
    },
    /// An overlay document does not fit the target structure.
    #[error("failed to decode overlay {overlay}: {source}")]
    OverlayDecode {
        overlay: String,
        source: serde_json::Error,
    },
    /// A default or environment value does not match the field type.
    #[error("invalid value for field {field} ({stage}): {message}")]
    FieldParse {
        field: String,
        stage: Stage,
        message: String,
    },
    /// A sentinel value could not be expanded.
    #[error("failed to transform field {field}: {message}")]
    Transform { field: String, message: String },
    /// Wraps any error with the resolution pass that produced it.
    #[error("error loading config {stage}: {source}")]
    Stage {
        stage: Stage,
        source: Box<ConfigError>,
    },
    /// The process working directory could not be determined.
    #[error("unable to determine working directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

impl ConfigError {
    /// Attach the failing pass to this error.
    pub(crate) fn in_stage(self, stage: Stage) -> Self {
        ConfigError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping stage wrappers.
    pub fn root(&self) -> &ConfigError {
        let mut current = self;
        while let ConfigError::Stage { source, .. } = current {
            current = source;
        }
        current
    }

    /// Pass that failed, when the error came out of a resolution run.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ConfigError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
