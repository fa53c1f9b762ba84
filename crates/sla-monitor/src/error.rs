//! Error types for sla-monitor

use std::time::Duration;

use thiserror::Error;

use crate::response::ResultType;

/// Schema-level failures while decoding a backend response.
///
/// These point at an incompatible backend or schema rather than an
/// unavailable one.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Body is not the expected JSON document
    #[error("malformed response body: {0}")]
    Json(#[from] serde_json::Error),

    /// Sample timestamp is not `seconds[.fraction]`
    #[error("invalid timestamp {raw:?}: {reason}")]
    InvalidTimestamp { raw: String, reason: &'static str },

    /// Sample value is not a float.
    ///
    /// Returned as is by [`parse_sample_value`](crate::response::parse_sample_value).
    /// Inside a full response it surfaces wrapped in [`DecodeError::Json`],
    /// whose message carries this one.
    #[error("invalid sample value {raw:?}")]
    InvalidSampleValue { raw: String },

    /// `resultType` is neither vector nor matrix
    #[error("unsupported result type: {0}")]
    UnsupportedResultType(String),

    /// A series lacks the sample field its result type requires
    #[error("{result_type} result without `{field}` on series {index}")]
    MissingSamples {
        result_type: ResultType,
        field: &'static str,
        index: usize,
    },

    /// Successful status without a `data` section
    #[error("response has no data section")]
    MissingData,

    /// Backend reported a query error
    #[error("backend error ({error_type}): {message}")]
    Backend { error_type: String, message: String },
}

/// Failure of a single retrieval item.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Connection failure or request timeout
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("backend responded with HTTP {status}")]
    Status { status: u16 },

    /// Response could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The per-call deadline elapsed before this item finished
    #[error("retrieval deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// The caller cancelled the retrieval
    #[error("retrieval cancelled")]
    Cancelled,
}

impl RetrievalError {
    /// Whether the backend was unreachable or unhealthy (as opposed to
    /// answering with something we could not understand).
    pub fn is_availability(&self) -> bool {
        matches!(
            self,
            RetrievalError::Transport(_)
                | RetrievalError::Status { .. }
                | RetrievalError::DeadlineExceeded(_)
        )
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, RetrievalError::Decode(_))
    }
}
