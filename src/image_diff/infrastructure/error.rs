use std::path::PathBuf;

use thiserror::Error;

use crate::domain::error::DomainError;

#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("Failed to decode image {}", path.display())]
    DecodeError {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write image {}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read config {}", path.display())]
    ConfigReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    ConfigParseError(#[from] serde_json::Error),

    // デコード結果を Image に詰め替えるときのエラー
    #[error("Domain Error Wrapper: {0}")]
    DomainErrorWrapper(#[from] DomainError),
}
