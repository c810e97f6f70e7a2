use thiserror::Error;

/// Fatal failure while loading the two dashboard resources.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("HTTP error fetching {url}: {message}")]
    Http { url: String, message: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed records table: {0}")]
    Table(String),
    #[error("malformed boundary document: {0}")]
    Topology(String),
    #[error("records contain no years")]
    NoYears,
}

impl LoadError {
    pub fn http(url: &str, message: impl ToString) -> Self {
        Self::Http { url: url.to_string(), message: message.to_string() }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
