use thiserror::Error;

/// Failure of a backend RPC call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
    #[error("backend request timed out")]
    Timeout,
    #[error("backend returned http status {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("could not encode request: {0}")]
    Encode(String),
    #[error("could not decode backend response: {0}")]
    Decode(String),
    /// The backend answered with an explicit error message.
    #[error("{0}")]
    Rejected(String),
}

/// Failure to learn the duration of a stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("invalid playlist url: {0}")]
    InvalidUrl(String),
    #[error("playlist request timed out")]
    Timeout,
    #[error("playlist request returned http status {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("response is not an m3u8 playlist")]
    NotAPlaylist,
    #[error("master playlist has no variants")]
    NoVariants,
    #[error("playlist nesting is too deep")]
    TooDeep,
    #[error("media playlist has no segments")]
    NoSegments,
}

/// Inbound event that could not be turned into a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed event envelope: {0}")]
    Malformed(String),
    #[error("unknown event {0:?}")]
    UnknownEvent(String),
    #[error("invalid payload for {event}: {message}")]
    InvalidPayload { event: String, message: String },
}
