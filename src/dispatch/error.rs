use std::path::PathBuf;
use thiserror::Error;

/// Hard failures of a dispatch request
///
/// Property requests fail only on a missing file; everything else is
/// reported per property through [`Lookup`](crate::extractors::Lookup).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("extractor not registered: {0}")]
    HandlerNotFound(String),
}

impl DispatchError {
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::FileNotFound(_) => "FILE_NOT_FOUND",
            DispatchError::HandlerNotFound(_) => "HANDLER_NOT_FOUND",
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
