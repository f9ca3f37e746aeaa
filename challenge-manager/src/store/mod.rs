mod memory;
mod postgres;

pub use memory::MemoryChallengeStore;
pub use postgres::PgChallengeStore;

use common::{ChallengeStatus, ParticipationState};
use time::OffsetDateTime;

use crate::error::Error;
use crate::models::definition::ChallengeDefinition;
use crate::models::participation::ParticipationRecord;

/// Boundary contract over the two document collections backing the challenge
/// subsystem: challenge definitions (keyed by definition id) and
/// participation records (keyed by record id).
///
/// Lookups that find nothing return `Ok(None)` or an empty list. Creates
/// assign the id; updates are full-document overwrites at the record's id.
pub trait ChallengeStore {
    async fn definition_by_id(&self, id: &str) -> Result<Option<ChallengeDefinition>, Error>;

    async fn definitions_by_status(
        &self,
        statuses: &[ChallengeStatus],
    ) -> Result<Vec<ChallengeDefinition>, Error>;

    /// Persist a new definition and return it with its store-assigned id.
    async fn create_definition(
        &self,
        definition: &ChallengeDefinition,
    ) -> Result<ChallengeDefinition, Error>;

    async fn update_definition(&self, definition: &ChallengeDefinition) -> Result<(), Error>;

    async fn delete_definition(&self, id: &str) -> Result<(), Error>;

    async fn record_by_id(&self, id: &str) -> Result<Option<ParticipationRecord>, Error>;

    /// The (member, campaign) lookup used before every join.
    async fn record_for_user(
        &self,
        user_id: &str,
        challenge_name: &str,
    ) -> Result<Option<ParticipationRecord>, Error>;

    /// Every record belonging to a member, regardless of state or date.
    async fn all_records_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ParticipationRecord>, Error>;

    /// A member's records filtered by state-exclusion set and date window:
    /// records whose state is in `exclude` or whose cutoff precedes
    /// `ending_after` are dropped.
    async fn records_for_user(
        &self,
        user_id: &str,
        exclude: &[ParticipationState],
        ending_after: OffsetDateTime,
    ) -> Result<Vec<ParticipationRecord>, Error>;

    /// Every participant's record for a campaign, any state.
    async fn records_for_challenge(
        &self,
        challenge_name: &str,
    ) -> Result<Vec<ParticipationRecord>, Error>;

    /// Persist a new record and return it with its store-assigned id.
    async fn create_record(
        &self,
        record: &ParticipationRecord,
    ) -> Result<ParticipationRecord, Error>;

    async fn update_record(&self, record: &ParticipationRecord) -> Result<(), Error>;

    async fn delete_record(&self, id: &str) -> Result<(), Error>;
}
