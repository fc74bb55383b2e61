/// Error type for cache operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// A backend rejected its configuration or failed its connectivity
    /// checks at construction.
    #[error("cache construction failed: {0}")]
    Validation(String),
    /// A store operation failed against its backend.
    #[error("[{store}] cache error for key '{key}': {message}")]
    Backend {
        store: &'static str,
        key: String,
        message: String,
    },
    /// Encoding or decoding a stored entry failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// A stored response no longer parses as an HTTP response.
    #[error("corrupt cache entry: {0}")]
    Corrupt(String),
}

impl CacheError {
    /// Create a new backend error.
    pub fn backend(
        store: &'static str,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CacheError::Backend {
            store,
            key: key.into(),
            message: message.into(),
        }
    }
}
