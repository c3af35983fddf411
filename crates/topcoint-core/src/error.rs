use thiserror::Error;

/// Paging validation errors reported back to the requesting client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("page must be at least 1: got {got}")]
    PageTooSmall { got: i64 },

    #[error("pagination must be at least 10 and below 50: got {got}")]
    PageSizeOutOfRange { got: i64 },
}

/// Failures talking to the pricing API.
///
/// `Api` covers well-formed error payloads embedded in an otherwise
/// successful response body; the other variants are transport-level.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned status {status}")]
    Status { status: u16 },

    #[error("upstream error: {message}")]
    Api { message: String },

    #[error("failed to decode upstream response: {0}")]
    Decode(String),
}
