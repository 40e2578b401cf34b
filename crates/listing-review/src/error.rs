use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::review::{ReviewIssue, StoreError, TransitionError};
use crate::workflows::sandbox::{SandboxError, SeedError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Store(StoreError),
    Seed(SeedError),
    Sandbox(SandboxError),
    Transition(TransitionError),
    Review(ReviewIssue),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Store(err) => write!(f, "listing store error: {}", err),
            AppError::Seed(err) => write!(f, "seed error: {}", err),
            AppError::Sandbox(err) => write!(f, "sandbox error: {}", err),
            AppError::Transition(err) => write!(f, "transition refused: {}", err),
            AppError::Review(issue) => f.write_str(&issue.message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Seed(err) => Some(err),
            AppError::Sandbox(err) => Some(err),
            AppError::Transition(err) => Some(err),
            AppError::Review(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<SeedError> for AppError {
    fn from(value: SeedError) -> Self {
        Self::Seed(value)
    }
}

impl From<SandboxError> for AppError {
    fn from(value: SandboxError) -> Self {
        Self::Sandbox(value)
    }
}

impl From<TransitionError> for AppError {
    fn from(value: TransitionError) -> Self {
        Self::Transition(value)
    }
}

impl From<ReviewIssue> for AppError {
    fn from(value: ReviewIssue) -> Self {
        Self::Review(value)
    }
}
