// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner

use std::fmt;

/// Result type alias using ScanError
pub type ScanResult<T> = Result<T, ScanError>;

/// Top-level error type for scanner operations
#[derive(Debug, Clone)]
pub enum ScanError {
    /// Detection engine errors
    Detect(DetectError),
    /// Scheduler construction/lifecycle errors
    Scheduler(SchedulerError),
    /// Configuration errors
    Config(String),
    /// Input/filesystem errors
    Io(String),
    /// Generic error with message
    Other(String),
}

/// Errors reported by a detection engine for one dispatched frame
///
/// These are recoverable by design: the scheduler logs them and advances to
/// the next pending frame exactly as it would after a successful detection.
#[derive(Debug, Clone)]
pub enum DetectError {
    /// Frame had zero dimensions or no pixel data
    EmptyFrame,
    /// Frame data was shorter than its dimensions require
    TruncatedFrame { expected: usize, actual: usize },
    /// Detection task panicked or was cancelled by the runtime
    TaskFailed(String),
    /// Engine-specific failure
    Engine(String),
}

/// Scheduler lifecycle errors
#[derive(Debug, Clone)]
pub enum SchedulerError {
    /// No tokio runtime available to drive detection tasks
    NoRuntime,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Detect(e) => write!(f, "Detection error: {}", e),
            ScanError::Scheduler(e) => write!(f, "Scheduler error: {}", e),
            ScanError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ScanError::Io(msg) => write!(f, "I/O error: {}", msg),
            ScanError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for DetectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectError::EmptyFrame => write!(f, "Frame is empty"),
            DetectError::TruncatedFrame { expected, actual } => {
                write!(
                    f,
                    "Frame data truncated: expected {} bytes, got {}",
                    expected, actual
                )
            }
            DetectError::TaskFailed(msg) => write!(f, "Detection task failed: {}", msg),
            DetectError::Engine(msg) => write!(f, "Engine failure: {}", msg),
        }
    }
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::NoRuntime => {
                write!(f, "No tokio runtime available for detection tasks")
            }
        }
    }
}

impl std::error::Error for ScanError {}
impl std::error::Error for DetectError {}
impl std::error::Error for SchedulerError {}

// Conversions from sub-errors to ScanError
impl From<DetectError> for ScanError {
    fn from(err: DetectError) -> Self {
        ScanError::Detect(err)
    }
}

impl From<SchedulerError> for ScanError {
    fn from(err: SchedulerError) -> Self {
        ScanError::Scheduler(err)
    }
}

impl From<String> for ScanError {
    fn from(msg: String) -> Self {
        ScanError::Other(msg)
    }
}

impl From<&str> for ScanError {
    fn from(msg: &str) -> Self {
        ScanError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::Io(err.to_string())
    }
}
