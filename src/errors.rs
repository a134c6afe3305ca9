use thiserror::Error; // Import the `Error` derive macro from the `thiserror` crate

// Errors raised while configuring a comparison or loading its inputs.
// Differences between the compared values are never errors.
#[derive(Debug, Error)]
pub enum DiffError {
    // A verbosity level name that is not one of `auto`, `path-only`, `full`
    #[error("unknown verbosity level {0:?} (expected auto, path-only or full)")]
    UnknownLevel(String),

    // Reading an input document failed
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // An input document is not valid JSON
    #[error("invalid JSON in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

// Type alias for results that use `DiffError` as the error type
pub type Result<T> = std::result::Result<T, DiffError>;
