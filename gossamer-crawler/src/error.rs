use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("connection check failed for {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("certificate verification failed for {0}")]
    CertificateInvalid(String),

    #[error("aborted by operator: certificate verification failed")]
    TrustDeclined,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
