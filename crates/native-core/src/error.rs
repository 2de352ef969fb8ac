//! Error types for native access operations

use std::io;
use thiserror::Error;

/// Result type for native access operations
pub type Result<T> = std::result::Result<T, NativeAccessError>;

/// Errors that can occur while binding to or driving the OS
#[derive(Error, Debug)]
pub enum NativeAccessError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Native library unavailable: {0}")]
    LibraryUnavailable(String),

    #[error("Native symbol unavailable: {0}")]
    SymbolUnavailable(String),

    #[error("Invalid struct layout: {0}")]
    InvalidLayout(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Exec sandbox already installed")]
    AlreadyInstalled,

    #[error("Syscall error: {0}")]
    Syscall(String),
}
