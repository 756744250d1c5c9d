//! Error types surfaced by the configuration layer.
//!
//! Malformed numbers typed into range fields or the answer box are never
//! errors; they are coerced or ignored where they are read.

use thiserror::Error;

/// Errors raised while editing or validating game settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Every operation is disabled, so no problem could ever be generated.
    #[error("no operation enabled")]
    NoOperationEnabled,

    /// The timer only offers whole minutes from 1 to 5.
    #[error("timer must be between 1 and 5 minutes, got {0}")]
    TimerOutOfRange(u8),
}

impl ConfigurationError {
    /// Text shown to the player as a blocking notice.
    pub fn notice(&self) -> &'static str {
        match self {
            ConfigurationError::NoOperationEnabled => {
                "Please enable at least one operation to start the game."
            }
            ConfigurationError::TimerOutOfRange(_) => "Pick a timer between 1 and 5 minutes.",
        }
    }
}

/// Errors from reading or writing the settings file.
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("settings file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}
