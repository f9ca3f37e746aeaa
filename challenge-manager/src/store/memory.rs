use common::{ChallengeStatus, ParticipationState};
use indexmap::IndexMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Error;
use crate::models::definition::ChallengeDefinition;
use crate::models::participation::ParticipationRecord;

use super::ChallengeStore;

/// In-process store with the same contract as the hosted one. Backs the test
/// suite and embedded demos. Insertion order is preserved, so roster queries
/// return records in the order they were created.
#[derive(Default)]
pub struct MemoryChallengeStore {
    definitions: RwLock<IndexMap<String, ChallengeDefinition>>,
    records: RwLock<IndexMap<String, ParticipationRecord>>,
}

impl MemoryChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChallengeStore for MemoryChallengeStore {
    async fn definition_by_id(&self, id: &str) -> Result<Option<ChallengeDefinition>, Error> {
        Ok(self.definitions.read().await.get(id).cloned())
    }

    async fn definitions_by_status(
        &self,
        statuses: &[ChallengeStatus],
    ) -> Result<Vec<ChallengeDefinition>, Error> {
        Ok(self
            .definitions
            .read()
            .await
            .values()
            .filter(|definition| statuses.contains(&definition.status))
            .cloned()
            .collect())
    }

    async fn create_definition(
        &self,
        definition: &ChallengeDefinition,
    ) -> Result<ChallengeDefinition, Error> {
        let mut stored = definition.clone();
        stored.id = Uuid::new_v4().to_string();
        self.definitions
            .write()
            .await
            .insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn update_definition(&self, definition: &ChallengeDefinition) -> Result<(), Error> {
        if definition.id.is_empty() {
            return Err(Error::NeverPersisted);
        }
        self.definitions
            .write()
            .await
            .insert(definition.id.clone(), definition.clone());
        Ok(())
    }

    async fn delete_definition(&self, id: &str) -> Result<(), Error> {
        self.definitions.write().await.shift_remove(id);
        Ok(())
    }

    async fn record_by_id(&self, id: &str) -> Result<Option<ParticipationRecord>, Error> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn record_for_user(
        &self,
        user_id: &str,
        challenge_name: &str,
    ) -> Result<Option<ParticipationRecord>, Error> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|record| record.user_id == user_id && record.challenge_name == challenge_name)
            .cloned())
    }

    async fn all_records_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ParticipationRecord>, Error> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn records_for_user(
        &self,
        user_id: &str,
        exclude: &[ParticipationState],
        ending_after: OffsetDateTime,
    ) -> Result<Vec<ParticipationRecord>, Error> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|record| {
                record.user_id == user_id
                    && !exclude.contains(&record.state)
                    && record.end_date_time >= ending_after
            })
            .cloned()
            .collect())
    }

    async fn records_for_challenge(
        &self,
        challenge_name: &str,
    ) -> Result<Vec<ParticipationRecord>, Error> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.challenge_name == challenge_name)
            .cloned()
            .collect())
    }

    async fn create_record(
        &self,
        record: &ParticipationRecord,
    ) -> Result<ParticipationRecord, Error> {
        let mut stored = record.clone();
        stored.id = Uuid::new_v4().to_string();
        self.records
            .write()
            .await
            .insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn update_record(&self, record: &ParticipationRecord) -> Result<(), Error> {
        if record.id.is_empty() {
            return Err(Error::NeverPersisted);
        }
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn delete_record(&self, id: &str) -> Result<(), Error> {
        self.records.write().await.shift_remove(id);
        Ok(())
    }
}
