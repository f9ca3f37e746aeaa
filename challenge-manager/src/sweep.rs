use common::ChallengeStatus;
use futures::future::join_all;
use time::OffsetDateTime;

use crate::error::Error;
use crate::manager::ChallengeManager;
use crate::models::participation::ParticipationRecord;
use crate::profiles::ProfileService;
use crate::store::ChallengeStore;

/// The cleanup sweeps. These run whenever a challenge or home view loads,
/// not on a schedule, so every transition re-checks its guard and unchanged
/// documents are never re-written. Concurrent sessions racing to apply the
/// same transition settle on last-write-wins.
impl<S: ChallengeStore, P: ProfileService> ChallengeManager<S, P> {
    /// Expire and promote one member's records. Returns how many were
    /// written.
    pub async fn sweep_user_records(
        &self,
        user_id: &str,
        now: OffsetDateTime,
    ) -> Result<usize, Error> {
        let records = self.store().all_records_for_user(user_id).await?;
        self.persist_sweep(&records, now).await
    }

    /// Expire and promote every participant of one campaign.
    pub async fn sweep_challenge_participants(
        &self,
        challenge_name: &str,
        now: OffsetDateTime,
    ) -> Result<usize, Error> {
        let records = self.store().records_for_challenge(challenge_name).await?;
        self.persist_sweep(&records, now).await
    }

    /// Advance campaign-wide statuses that the calendar has overtaken:
    /// pre-registration opens into started, anything past its end date
    /// closes. Returns how many definitions were written.
    pub async fn sweep_definitions(&self, now: OffsetDateTime) -> Result<usize, Error> {
        let definitions = self
            .store()
            .definitions_by_status(&[ChallengeStatus::PreRegistration, ChallengeStatus::Started])
            .await?;
        let mut changed = Vec::new();
        for definition in definitions {
            match definition.advanced_status(now) {
                Ok(Some(status)) => {
                    let mut next = definition;
                    next.status = status;
                    changed.push(next);
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(
                        definition = %definition.id,
                        %error,
                        "skipping unreadable definition in sweep"
                    );
                }
            }
        }
        let results = join_all(
            changed
                .iter()
                .map(|definition| self.update_definition(definition)),
        )
        .await;
        let mut written = 0;
        let mut first_failure = None;
        for (definition, result) in changed.iter().zip(results) {
            match result {
                Ok(()) => {
                    written += 1;
                    tracing::debug!(
                        definition = %definition.id,
                        status = ?definition.status,
                        "campaign status advanced"
                    );
                }
                Err(error) => {
                    tracing::warn!(definition = %definition.id, %error, "sweep write failed");
                    if first_failure.is_none() {
                        first_failure = Some(error);
                    }
                }
            }
        }
        match first_failure {
            Some(error) => Err(error),
            None => Ok(written),
        }
    }

    /// One write per changed record, all gathered behind a single barrier.
    /// A failed write never rolls back its siblings; the first failure is
    /// reported once every write has been attempted.
    async fn persist_sweep(
        &self,
        records: &[ParticipationRecord],
        now: OffsetDateTime,
    ) -> Result<usize, Error> {
        let mut changed = Vec::new();
        for record in records {
            match record.sweep_transition(now) {
                Ok(Some(next)) => changed.push(next),
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(
                        record = %record.id,
                        %error,
                        "skipping unreadable record in sweep"
                    );
                }
            }
        }
        let results = join_all(changed.iter().map(|record| self.update_challenge(record))).await;
        let mut written = 0;
        let mut first_failure = None;
        for (record, result) in changed.iter().zip(results) {
            match result {
                Ok(()) => {
                    written += 1;
                    tracing::debug!(
                        record = %record.id,
                        state = ?record.state,
                        "sweep transition persisted"
                    );
                }
                Err(error) => {
                    tracing::warn!(record = %record.id, %error, "sweep write failed");
                    if first_failure.is_none() {
                        first_failure = Some(error);
                    }
                }
            }
        }
        match first_failure {
            Some(error) => Err(error),
            None => Ok(written),
        }
    }
}
