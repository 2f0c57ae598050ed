//! Error types for repo-meta

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed {document}: {message}")]
    Parse {
        document: &'static str,
        message: String,
    },

    #[error("Failed to write {document}: {message}")]
    Write {
        document: &'static str,
        message: String,
    },

    #[error("Failed to read {document}: {source}")]
    Io {
        document: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Document is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
