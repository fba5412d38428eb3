use actix_web::http::StatusCode;
use actix_web::ResponseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CspError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Nonce accessed outside of a request scope")]
    NoActiveScope,

    #[error("Crypto error: {0}")]
    CryptoError(String),

    #[error("Header processing error: {0}")]
    HeaderError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for CspError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl ResponseError for CspError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidConfiguration(_)
            | Self::NoActiveScope
            | Self::CryptoError(_)
            | Self::HeaderError(_)
            | Self::ConfigError(_)
            | Self::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
