use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Copy, Debug)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "challenge_status", rename_all = "kebab-case")
)]
#[derive(Default)]
pub enum ChallengeStatus {
    #[default]
    Draft,
    PreRegistration,
    Started,
    Completed,
}

#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Copy, Debug)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "challenge_type", rename_all = "kebab-case")
)]
pub enum ChallengeType {
    IterativeCompletions,
    BestAttempt,
    UserSelectedGoal,
}

#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Copy, Debug)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "participation_state", rename_all = "kebab-case")
)]
pub enum ParticipationState {
    PreRegistered,
    NotStarted,
    InProgress,
    Completed,
    Failed,
}
