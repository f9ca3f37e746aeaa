use thiserror::Error;

/// Errors surfaced by the challenge manager and its storage adapters.
///
/// Lookups that find nothing return `Ok(None)` or an empty list, never an
/// error. Storage failures pass through as `Database` without retries.
#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("malformed calendar date: {0:?}")]
    InvalidDate(String),
    #[error("registration for {0:?} has closed")]
    RegistrationClosed(String),
    #[error("unknown campaign: {0:?}")]
    UnknownCampaign(String),
    #[error("{campaign:?} does not offer a goal of {goal}")]
    GoalNotOffered { campaign: String, goal: f64 },
    #[error("progress report does not match the challenge type")]
    WrongProgressKind,
    #[error("definition is missing its completion requirements")]
    MissingRequirements,
    #[error("record has never been persisted")]
    NeverPersisted,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("profile service error: {0}")]
    Profile(String),
}
