use common::{ChallengeStatus, ChallengeType, ParticipationState};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::Error;
use crate::models::definition::{parse_mdy, ChallengeDefinition};

/// Variant-shaped progress payload, discriminated by `type`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Progress {
    #[serde(rename_all = "camelCase")]
    IterativeCompletions {
        active_completions: u32,
        total_to_complete: u32,
    },
    #[serde(rename_all = "camelCase")]
    BestAttempt { best_attempt: f64 },
    #[serde(rename_all = "camelCase")]
    UserSelectedGoal { goal: f64, current_value: f64 },
}

/// One progress report. The shape must match the record's variant.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ProgressDelta {
    /// N single-unit completion increments applied at once.
    Completions(u32),
    /// An additive amount in the campaign's unit (miles, rounds, ...).
    Amount(f64),
    /// A fresh attempt; kept only if it beats the current best.
    Attempt(f64),
}

impl Progress {
    pub fn challenge_type(&self) -> ChallengeType {
        match self {
            Progress::IterativeCompletions { .. } => ChallengeType::IterativeCompletions,
            Progress::BestAttempt { .. } => ChallengeType::BestAttempt,
            Progress::UserSelectedGoal { .. } => ChallengeType::UserSelectedGoal,
        }
    }

    /// Whether the variant's completion predicate holds. Best-attempt
    /// campaigns are only ever completed manually, so this never fires for
    /// them.
    pub fn completion_met(&self) -> bool {
        match self {
            Progress::IterativeCompletions {
                active_completions,
                total_to_complete,
            } => active_completions >= total_to_complete,
            Progress::UserSelectedGoal {
                goal,
                current_value,
            } => current_value >= goal,
            Progress::BestAttempt { .. } => false,
        }
    }

    /// The number a leaderboard ranks this record by.
    pub fn metric(&self) -> f64 {
        match self {
            Progress::IterativeCompletions {
                active_completions, ..
            } => f64::from(*active_completions),
            Progress::BestAttempt { best_attempt } => *best_attempt,
            Progress::UserSelectedGoal { current_value, .. } => *current_value,
        }
    }
}

/// One member's progress against one campaign.
///
/// This is an immutable value: every transition returns a new record and the
/// manager persists the returned value. Exactly one record exists per
/// (member, campaign) pair, enforced by a lookup before every join.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationRecord {
    /// Empty until first persisted; the store assigns it.
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    /// Foreign key to the definition, by campaign name.
    pub challenge_name: String,
    pub state: ParticipationState,
    pub start_date: String,
    pub end_date: String,
    /// Derived absolute cutoff, copied from the definition at join time.
    pub end_date_time: OffsetDateTime,
    #[serde(flatten)]
    pub progress: Progress,
}

impl ParticipationRecord {
    /// Build the unsaved record a member gets when joining `definition`.
    /// Starts `PreRegistered` while the campaign is in pre-registration,
    /// `NotStarted` otherwise.
    pub fn join(
        definition: &ChallengeDefinition,
        user_id: &str,
        progress: Progress,
    ) -> Result<Self, Error> {
        let state = if definition.status == ChallengeStatus::PreRegistration {
            ParticipationState::PreRegistered
        } else {
            ParticipationState::NotStarted
        };
        Ok(ParticipationRecord {
            id: String::new(),
            user_id: user_id.to_string(),
            challenge_name: definition.name.clone(),
            state,
            start_date: definition.start_date.clone(),
            end_date: definition.end_date.clone(),
            end_date_time: definition.end_cutoff()?,
            progress,
        })
    }

    /// Change state, except that `Completed` is a sink: once a record has
    /// completed, every later state change is silently absorbed.
    #[must_use]
    pub fn with_state(mut self, state: ParticipationState) -> Self {
        if self.state == ParticipationState::Completed {
            return self;
        }
        self.state = state;
        self
    }

    /// Logging progress implies starting: promote a record that hasn't
    /// moved yet into `InProgress`.
    #[must_use]
    pub fn started(self) -> Self {
        match self.state {
            ParticipationState::NotStarted | ParticipationState::PreRegistered => {
                self.with_state(ParticipationState::InProgress)
            }
            _ => self,
        }
    }

    /// Apply one progress report. Negative amounts are ignored; the value
    /// only ever moves toward the goal.
    pub fn applying(mut self, delta: ProgressDelta) -> Result<Self, Error> {
        match (&mut self.progress, delta) {
            (
                Progress::IterativeCompletions {
                    active_completions, ..
                },
                ProgressDelta::Completions(count),
            ) => {
                *active_completions = active_completions.saturating_add(count);
            }
            (
                Progress::UserSelectedGoal { current_value, .. },
                ProgressDelta::Amount(amount),
            ) => {
                *current_value += amount.max(0.0);
            }
            (Progress::BestAttempt { best_attempt }, ProgressDelta::Attempt(attempt)) => {
                *best_attempt = best_attempt.max(attempt);
            }
            _ => return Err(Error::WrongProgressKind),
        }
        Ok(self)
    }

    /// The transition the cleanup sweep owes this record at `now`, if any.
    ///
    /// Expired records that never completed fail; pre-registered records
    /// whose campaign has started move in progress. Both guards become false
    /// after one application, so the sweep stays idempotent.
    pub fn sweep_transition(&self, now: OffsetDateTime) -> Result<Option<Self>, Error> {
        if self.end_date_time < now {
            return Ok(match self.state {
                ParticipationState::Completed | ParticipationState::Failed => None,
                _ => Some(self.clone().with_state(ParticipationState::Failed)),
            });
        }
        if self.state == ParticipationState::PreRegistered
            && parse_mdy(&self.start_date)?.midnight().assume_utc() <= now
        {
            return Ok(Some(self.clone().with_state(ParticipationState::InProgress)));
        }
        Ok(None)
    }
}
