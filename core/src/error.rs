use thiserror::Error;

/// Why a piece of user supplied configuration was rejected.
///
/// The engine itself never fails on bad configuration, it falls back to defaults instead. These errors are only
/// reported by the explicit parsing helpers so a front-end can tell the user what was wrong with their input.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Value is empty")]
    Empty,
    #[error("Value must contain only digits")]
    NotANumber,
    #[error("Value must be between {min} and {max}")]
    OutOfRange { min: u64, max: u64 },
}

pub type Result<T> = core::result::Result<T, ConfigError>;
