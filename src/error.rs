use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimerError {
    /// `end` was called for a label with no open `begin`.
    #[error("no timer was started for label '{label}'")]
    MissingTimerStart { label: String },

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid report config: {0}")]
    InvalidConfig(String),
}

pub type Result<T, E = TimerError> = std::result::Result<T, E>;
