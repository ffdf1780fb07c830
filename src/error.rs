//! Library Error Types
//!
//! Every failure the operation substrate can report is one variant of [`ClusterError`].
//! Each kind is scoped: configuration errors fail only the offending construction call,
//! decode and resolution errors fail only the operation they belong to, and rejections
//! are returned to the submitter. None of them take down a worker.

use crate::queue::types::ReplicaRole;

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClusterError {
    /// An executor pool policy was built with out-of-range values.
    #[error("invalid executor config '{name}': {reason}")]
    ConfigValidation { name: String, reason: String },

    /// A frame or operation body could not be decoded. Nothing was applied.
    #[error("decode error: {0}")]
    Decode(String),

    /// No container exists for the operation's (partition, name, role).
    #[error("no container '{name}' for partition {partition_id} ({role})")]
    ContainerResolution {
        partition_id: u32,
        name: String,
        role: ReplicaRole,
    },

    /// The pool's backlog is at capacity or the pool is shut down.
    #[error("executor '{executor}' rejected operation: {reason}")]
    Rejected { executor: String, reason: String },

    /// The operation was cancelled before it started.
    #[error("operation cancelled before execution")]
    Cancelled,

    /// The operation panicked or its worker went away before reporting.
    #[error("operation failed: {0}")]
    OperationFailed(String),

    /// A backup frame could not be delivered to a replica.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClusterError {
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode(reason.into())
    }

    pub fn config(name: &str, reason: impl Into<String>) -> Self {
        Self::ConfigValidation {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Rejections and delivery failures may succeed if retried; everything else won't.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Rejected { .. } | Self::Transport(_))
    }

    /// HTTP status used when this error is the answer to a request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ConfigValidation { .. } | Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::ContainerResolution { .. } => StatusCode::NOT_FOUND,
            Self::Rejected { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Cancelled => StatusCode::CONFLICT,
            Self::OperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Transport(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClusterError>;
