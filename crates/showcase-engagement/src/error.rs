use showcase_types::models::Polarity;

#[derive(Debug, thiserror::Error)]
pub enum EngagementError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    /// The same polarity is already recorded; it must be retracted first.
    #[error("Project already {0}d")]
    AlreadyVoted(Polarity),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EngagementError>;
