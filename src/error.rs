use thiserror::Error;

/// Errors surfaced by the client core. Structured-extraction failures are
/// deliberately not represented here: the parser degrades to plain text
/// instead of erroring.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("protocol error: {0}")]
    Protocol(String),
}
