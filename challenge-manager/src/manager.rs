use common::{ChallengeStatus, ChallengeType, ParticipationState};
use time::OffsetDateTime;

use crate::catalog::CampaignCatalog;
use crate::error::Error;
use crate::leaderboard::order_roster;
use crate::models::definition::ChallengeDefinition;
use crate::models::participation::{ParticipationRecord, Progress, ProgressDelta};
use crate::profiles::{MemberProfile, ProfileService};
use crate::store::ChallengeStore;

/// The caller-supplied part of a join: user-selected-goal campaigns need a
/// goal picked from the campaign's menu, the other variants need nothing.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum JoinSelection {
    Standard,
    Goal(f64),
}

/// A participation record hydrated with its member's profile, ready for a
/// roster view.
#[derive(Clone, PartialEq, Debug)]
pub struct RosterEntry {
    pub record: ParticipationRecord,
    pub profile: Option<MemberProfile>,
}

/// Orchestrates the participation lifecycle: joins, progress reports,
/// completion (with badge award), withdrawal, and the roster queries.
///
/// The manager is a thin layer over the store: it never catches persistence
/// errors, and lookups that find nothing come back as `None`/empty.
pub struct ChallengeManager<S, P> {
    store: S,
    profiles: P,
    catalog: CampaignCatalog,
}

impl<S: ChallengeStore, P: ProfileService> ChallengeManager<S, P> {
    pub fn new(store: S, profiles: P, catalog: CampaignCatalog) -> Self {
        ChallengeManager {
            store,
            profiles,
            catalog,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn profiles(&self) -> &P {
        &self.profiles
    }

    // Definition registry. Mutations are admin-only by caller policy;
    // `ChallengeDefinition::validate` is the admin form's concern.

    pub async fn get_active_definitions(&self) -> Result<Vec<ChallengeDefinition>, Error> {
        self.store
            .definitions_by_status(&[ChallengeStatus::PreRegistration, ChallengeStatus::Started])
            .await
    }

    pub async fn get_completed_definitions(&self) -> Result<Vec<ChallengeDefinition>, Error> {
        self.store
            .definitions_by_status(&[ChallengeStatus::Completed])
            .await
    }

    pub async fn get_definition_by_id(
        &self,
        id: &str,
    ) -> Result<Option<ChallengeDefinition>, Error> {
        self.store.definition_by_id(id).await
    }

    pub async fn create_definition(
        &self,
        definition: &ChallengeDefinition,
    ) -> Result<ChallengeDefinition, Error> {
        self.store.create_definition(definition).await
    }

    pub async fn update_definition(&self, definition: &ChallengeDefinition) -> Result<(), Error> {
        self.store.update_definition(definition).await
    }

    pub async fn delete_definition(&self, definition: &ChallengeDefinition) -> Result<(), Error> {
        self.store.delete_definition(&definition.id).await
    }

    // Participation lifecycle.

    /// Create and persist a member's record for a campaign.
    ///
    /// The registration cutoff is enforced here rather than in the view:
    /// once the last registration date has passed and the campaign has not
    /// started, the join is rejected. The existence check stays with the
    /// caller (`get_user_challenge_data` before joining); this method does
    /// not deduplicate.
    pub async fn join_or_pre_register(
        &self,
        definition: &ChallengeDefinition,
        user_id: &str,
        selection: JoinSelection,
        now: OffsetDateTime,
    ) -> Result<ParticipationRecord, Error> {
        let entry = self
            .catalog
            .get(&definition.name)
            .ok_or_else(|| Error::UnknownCampaign(definition.name.clone()))?;
        if definition.status != ChallengeStatus::Started
            && definition.status != ChallengeStatus::Completed
            && now >= definition.registration_cutoff()?
        {
            return Err(Error::RegistrationClosed(definition.name.clone()));
        }
        let progress = match (entry.challenge_type, selection) {
            (ChallengeType::IterativeCompletions, JoinSelection::Standard) => {
                let requirements = definition
                    .completion_requirements
                    .ok_or(Error::MissingRequirements)?;
                Progress::IterativeCompletions {
                    active_completions: 0,
                    total_to_complete: requirements.total_completions_required,
                }
            }
            (ChallengeType::BestAttempt, JoinSelection::Standard) => Progress::BestAttempt {
                best_attempt: 0.0,
            },
            (ChallengeType::UserSelectedGoal, JoinSelection::Goal(goal)) => {
                if !entry.goal_options.contains(&goal) {
                    return Err(Error::GoalNotOffered {
                        campaign: definition.name.clone(),
                        goal,
                    });
                }
                Progress::UserSelectedGoal {
                    goal,
                    current_value: 0.0,
                }
            }
            _ => return Err(Error::WrongProgressKind),
        };
        let record = ParticipationRecord::join(definition, user_id, progress)?;
        let stored = self.store.create_record(&record).await?;
        tracing::info!(
            user = user_id,
            campaign = %definition.name,
            state = ?stored.state,
            "joined challenge"
        );
        Ok(stored)
    }

    /// Apply one progress report and persist the result.
    ///
    /// A report against a completed record is silently absorbed. Otherwise
    /// the record is promoted into `InProgress` if it hadn't moved yet, the
    /// variant's completion predicate is evaluated, and the record either
    /// completes or is saved as-is.
    pub async fn log_progress(
        &self,
        record: &ParticipationRecord,
        delta: ProgressDelta,
    ) -> Result<ParticipationRecord, Error> {
        if record.state == ParticipationState::Completed {
            return Ok(record.clone());
        }
        let updated = record.clone().applying(delta)?.started();
        if updated.progress.completion_met() {
            self.complete_challenge(&updated).await
        } else {
            self.update_challenge(&updated).await?;
            Ok(updated)
        }
    }

    /// Mark a record completed, award the campaign's badge if one is
    /// configured, and persist. Callers check the completion predicate; it
    /// is not re-verified here. Badge errors propagate untouched.
    pub async fn complete_challenge(
        &self,
        record: &ParticipationRecord,
    ) -> Result<ParticipationRecord, Error> {
        let completed = record.clone().with_state(ParticipationState::Completed);
        if let Some(achievement) = self.catalog.achievement_for(&record.challenge_name) {
            self.profiles
                .award_achievement(achievement, &record.user_id)
                .await?;
            tracing::info!(
                user = %record.user_id,
                campaign = %record.challenge_name,
                achievement = ?achievement,
                "awarded challenge badge"
            );
        }
        self.update_challenge(&completed).await?;
        Ok(completed)
    }

    /// Unconditional full overwrite of the record at its id.
    pub async fn update_challenge(&self, record: &ParticipationRecord) -> Result<(), Error> {
        self.store.update_record(record).await
    }

    /// Hard delete. The record ceases to exist; confirming intent first is
    /// the caller's job.
    pub async fn withdraw_user_from_challenge(
        &self,
        record: &ParticipationRecord,
    ) -> Result<(), Error> {
        if record.id.is_empty() {
            return Err(Error::NeverPersisted);
        }
        self.store.delete_record(&record.id).await?;
        tracing::info!(
            user = %record.user_id,
            campaign = %record.challenge_name,
            "withdrew from challenge"
        );
        Ok(())
    }

    /// The lookup-before-create existence check for one (member, campaign)
    /// pair.
    pub async fn get_user_challenge_data(
        &self,
        user_id: &str,
        challenge_name: &str,
    ) -> Result<Option<ParticipationRecord>, Error> {
        self.store.record_for_user(user_id, challenge_name).await
    }

    /// A member's current challenges: everything not `Failed` whose window
    /// hasn't closed. Completed records stay visible until the window ends.
    pub async fn get_active_challenges_for_user(
        &self,
        user_id: &str,
        now: OffsetDateTime,
    ) -> Result<Vec<ParticipationRecord>, Error> {
        self.store
            .records_for_user(user_id, &[ParticipationState::Failed], now)
            .await
    }

    /// Every participant's record for a campaign, any state.
    pub async fn get_all_challenge_participants(
        &self,
        challenge_name: &str,
    ) -> Result<Vec<ParticipationRecord>, Error> {
        self.store.records_for_challenge(challenge_name).await
    }

    /// The full roster, hydrated and ordered for display. Every profile is
    /// loaded before the roster is handed back.
    pub async fn roster(
        &self,
        challenge_name: &str,
        viewer_id: &str,
    ) -> Result<Vec<RosterEntry>, Error> {
        let records = self.store.records_for_challenge(challenge_name).await?;
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let profile = self.profiles.member_by_id(&record.user_id).await?;
            entries.push(RosterEntry { record, profile });
        }
        order_roster(&mut entries, viewer_id);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use common::AchievementType;
    use time::macros::datetime;

    use crate::models::definition::CompletionRequirements;
    use crate::store::MemoryChallengeStore;
    use crate::testing::{definition, RecordingProfiles};

    use super::*;

    fn manager() -> ChallengeManager<MemoryChallengeStore, RecordingProfiles> {
        ChallengeManager::new(
            MemoryChallengeStore::new(),
            RecordingProfiles::default(),
            CampaignCatalog::standard(),
        )
    }

    fn mid_window() -> OffsetDateTime {
        datetime!(2026-06-10 12:00 UTC)
    }

    #[tokio::test]
    async fn goal_challenge_completes_on_the_exact_report() {
        let manager = manager();
        let road_warrior = definition(
            "Road Warrior",
            ChallengeType::UserSelectedGoal,
            ChallengeStatus::Started,
        );
        let record = manager
            .join_or_pre_register(&road_warrior, "pax-1", JoinSelection::Goal(50.0), mid_window())
            .await
            .unwrap();
        assert!(!record.id.is_empty());

        // Re-aim at 60 miles for the canonical 20/25/20 sequence.
        let record = ParticipationRecord {
            progress: Progress::UserSelectedGoal {
                goal: 60.0,
                current_value: 0.0,
            },
            ..record
        };
        let record = manager
            .log_progress(&record, ProgressDelta::Amount(20.0))
            .await
            .unwrap();
        assert_eq!(record.state, ParticipationState::InProgress);
        let record = manager
            .log_progress(&record, ProgressDelta::Amount(25.0))
            .await
            .unwrap();
        assert_eq!(record.state, ParticipationState::InProgress);
        let record = manager
            .log_progress(&record, ProgressDelta::Amount(20.0))
            .await
            .unwrap();
        assert_eq!(record.state, ParticipationState::Completed);
        assert_eq!(record.progress.metric(), 65.0);

        let awarded = manager.profiles().awarded.lock().unwrap().clone();
        assert_eq!(
            awarded,
            vec![(AchievementType::RoadWarrior, "pax-1".to_string())]
        );
        // The persisted copy agrees with what the caller got back.
        let stored = manager
            .get_user_challenge_data("pax-1", "Road Warrior")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn iterative_challenge_completes_exactly_at_the_target() {
        let manager = manager();
        let mut murph = definition(
            "Murph Madness",
            ChallengeType::IterativeCompletions,
            ChallengeStatus::Started,
        );
        murph.completion_requirements = Some(CompletionRequirements {
            total_completions_required: 3,
        });
        let record = manager
            .join_or_pre_register(&murph, "pax-2", JoinSelection::Standard, mid_window())
            .await
            .unwrap();

        let record = manager
            .log_progress(&record, ProgressDelta::Completions(2))
            .await
            .unwrap();
        assert_eq!(record.state, ParticipationState::InProgress);
        let record = manager
            .log_progress(&record, ProgressDelta::Completions(1))
            .await
            .unwrap();
        assert_eq!(record.state, ParticipationState::Completed);
        assert_eq!(
            manager.profiles().awarded.lock().unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn reports_against_a_completed_record_are_absorbed() {
        let manager = manager();
        let mut murph = definition(
            "Murph Madness",
            ChallengeType::IterativeCompletions,
            ChallengeStatus::Started,
        );
        murph.completion_requirements = Some(CompletionRequirements {
            total_completions_required: 1,
        });
        let record = manager
            .join_or_pre_register(&murph, "pax-3", JoinSelection::Standard, mid_window())
            .await
            .unwrap();
        let completed = manager
            .log_progress(&record, ProgressDelta::Completions(1))
            .await
            .unwrap();
        assert_eq!(completed.state, ParticipationState::Completed);

        let unchanged = manager
            .log_progress(&completed, ProgressDelta::Completions(5))
            .await
            .unwrap();
        assert_eq!(unchanged, completed);
        let stored = manager
            .get_user_challenge_data("pax-3", "Murph Madness")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, completed);
        // Only the genuine completion awarded a badge.
        assert_eq!(manager.profiles().awarded.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pre_registration_joins_start_pre_registered() {
        let manager = manager();
        let murph = definition(
            "Murph Madness",
            ChallengeType::IterativeCompletions,
            ChallengeStatus::PreRegistration,
        );
        let record = manager
            .join_or_pre_register(
                &murph,
                "pax-4",
                JoinSelection::Standard,
                datetime!(2026-05-20 12:00 UTC),
            )
            .await
            .unwrap();
        assert_eq!(record.state, ParticipationState::PreRegistered);

        // Logging progress implies starting.
        let record = manager
            .log_progress(&record, ProgressDelta::Completions(1))
            .await
            .unwrap();
        assert_eq!(record.state, ParticipationState::InProgress);
    }

    #[tokio::test]
    async fn registration_closes_after_the_cutoff() {
        let manager = manager();
        let murph = definition(
            "Murph Madness",
            ChallengeType::IterativeCompletions,
            ChallengeStatus::PreRegistration,
        );
        let result = manager
            .join_or_pre_register(
                &murph,
                "pax-5",
                JoinSelection::Standard,
                datetime!(2026-06-16 08:00 UTC),
            )
            .await;
        assert!(matches!(result, Err(Error::RegistrationClosed(_))));
    }

    #[tokio::test]
    async fn a_started_campaign_still_accepts_joins() {
        let manager = manager();
        let murph = definition(
            "Murph Madness",
            ChallengeType::IterativeCompletions,
            ChallengeStatus::Started,
        );
        let record = manager
            .join_or_pre_register(
                &murph,
                "pax-6",
                JoinSelection::Standard,
                datetime!(2026-06-16 08:00 UTC),
            )
            .await
            .unwrap();
        assert_eq!(record.state, ParticipationState::NotStarted);
    }

    #[tokio::test]
    async fn goals_must_come_from_the_campaign_menu() {
        let manager = manager();
        let road_warrior = definition(
            "Road Warrior",
            ChallengeType::UserSelectedGoal,
            ChallengeStatus::Started,
        );
        let result = manager
            .join_or_pre_register(&road_warrior, "pax-7", JoinSelection::Goal(42.0), mid_window())
            .await;
        assert!(matches!(result, Err(Error::GoalNotOffered { .. })));

        let result = manager
            .join_or_pre_register(&road_warrior, "pax-7", JoinSelection::Standard, mid_window())
            .await;
        assert!(matches!(result, Err(Error::WrongProgressKind)));
    }

    #[tokio::test]
    async fn the_manager_does_not_deduplicate_joins() {
        let manager = manager();
        let murph = definition(
            "Murph Madness",
            ChallengeType::IterativeCompletions,
            ChallengeStatus::Started,
        );
        manager
            .join_or_pre_register(&murph, "pax-8", JoinSelection::Standard, mid_window())
            .await
            .unwrap();
        // The existence check callers must run before joining:
        assert!(manager
            .get_user_challenge_data("pax-8", "Murph Madness")
            .await
            .unwrap()
            .is_some());
        // A caller that skips it gets a second record.
        manager
            .join_or_pre_register(&murph, "pax-8", JoinSelection::Standard, mid_window())
            .await
            .unwrap();
        assert_eq!(
            manager
                .get_all_challenge_participants("Murph Madness")
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn withdrawal_hard_deletes_the_record() {
        let manager = manager();
        let murph = definition(
            "Murph Madness",
            ChallengeType::IterativeCompletions,
            ChallengeStatus::Started,
        );
        let record = manager
            .join_or_pre_register(&murph, "pax-9", JoinSelection::Standard, mid_window())
            .await
            .unwrap();
        manager.withdraw_user_from_challenge(&record).await.unwrap();
        assert!(manager
            .get_user_challenge_data("pax-9", "Murph Madness")
            .await
            .unwrap()
            .is_none());
        assert!(manager
            .get_all_challenge_participants("Murph Madness")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn active_challenges_keep_completed_but_drop_failed_and_expired() {
        let manager = manager();
        let road_warrior = definition(
            "Road Warrior",
            ChallengeType::UserSelectedGoal,
            ChallengeStatus::Started,
        );
        let joined = manager
            .join_or_pre_register(&road_warrior, "pax-10", JoinSelection::Goal(25.0), mid_window())
            .await
            .unwrap();
        let completed = manager
            .log_progress(&joined, ProgressDelta::Amount(30.0))
            .await
            .unwrap();
        assert_eq!(completed.state, ParticipationState::Completed);

        let plank = definition("Plank Off", ChallengeType::BestAttempt, ChallengeStatus::Started);
        let failed = manager
            .join_or_pre_register(&plank, "pax-10", JoinSelection::Standard, mid_window())
            .await
            .unwrap()
            .with_state(ParticipationState::Failed);
        manager.update_challenge(&failed).await.unwrap();

        let active = manager
            .get_active_challenges_for_user("pax-10", mid_window())
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].challenge_name, "Road Warrior");

        // Past the window, nothing is active.
        let later = datetime!(2026-07-02 00:00 UTC);
        assert!(manager
            .get_active_challenges_for_user("pax-10", later)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn campaigns_without_a_badge_complete_quietly() {
        let manager = manager();
        let ruck = definition(
            "Ruck the Winter",
            ChallengeType::UserSelectedGoal,
            ChallengeStatus::Started,
        );
        let record = manager
            .join_or_pre_register(&ruck, "pax-11", JoinSelection::Goal(30.0), mid_window())
            .await
            .unwrap();
        let record = manager
            .log_progress(&record, ProgressDelta::Amount(30.0))
            .await
            .unwrap();
        assert_eq!(record.state, ParticipationState::Completed);
        assert!(manager.profiles().awarded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn best_attempt_campaigns_complete_only_manually() {
        let manager = manager();
        let plank = definition("Plank Off", ChallengeType::BestAttempt, ChallengeStatus::Started);
        let record = manager
            .join_or_pre_register(&plank, "pax-12", JoinSelection::Standard, mid_window())
            .await
            .unwrap();
        let record = manager
            .log_progress(&record, ProgressDelta::Attempt(145.0))
            .await
            .unwrap();
        assert_eq!(record.state, ParticipationState::InProgress);

        let record = manager.complete_challenge(&record).await.unwrap();
        assert_eq!(record.state, ParticipationState::Completed);
        let awarded = manager.profiles().awarded.lock().unwrap().clone();
        assert_eq!(
            awarded,
            vec![(AchievementType::PlankChampion, "pax-12".to_string())]
        );
    }

    #[tokio::test]
    async fn roster_is_hydrated_and_viewer_pinned() {
        let manager = manager();
        let road_warrior = definition(
            "Road Warrior",
            ChallengeType::UserSelectedGoal,
            ChallengeStatus::Started,
        );
        for (user, miles) in [("pax-a", 10.0), ("pax-b", 50.0), ("pax-c", 5.0)] {
            let record = manager
                .join_or_pre_register(&road_warrior, user, JoinSelection::Goal(100.0), mid_window())
                .await
                .unwrap();
            manager
                .log_progress(&record, ProgressDelta::Amount(miles))
                .await
                .unwrap();
        }
        let roster = manager.roster("Road Warrior", "pax-c").await.unwrap();
        let order: Vec<_> = roster
            .iter()
            .map(|entry| entry.record.user_id.as_str())
            .collect();
        assert_eq!(order, ["pax-c", "pax-b", "pax-a"]);
        assert!(roster.iter().all(|entry| entry.profile.is_some()));
    }
}
