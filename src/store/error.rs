//! Errors raised by the content store client

/// A query or mutation against the content store failed
#[derive(Debug, thiserror::Error)]
pub enum RemoteQueryError {
    /// The store could not be reached
    #[error("content store unreachable: {0}")]
    Network(#[from] reqwest::Error),

    /// The store answered with an error status (malformed query, auth, ...)
    #[error("content store returned {status}: {description}")]
    Backend { status: u16, description: String },

    /// The store answered with a body we could not interpret
    #[error("malformed response from content store: {0}")]
    MalformedResponse(String),
}

impl RemoteQueryError {
    pub fn backend(status: u16, description: impl Into<String>) -> Self {
        Self::Backend {
            status,
            description: description.into(),
        }
    }
}
