use thiserror::Error;

/// Everything that can go wrong talking to the backend. All variants are
/// shown to the user the same way; the distinction only reaches the log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to send request to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API request failed with status: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse JSON from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}
