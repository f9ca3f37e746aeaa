use common::{ChallengeStatus, ChallengeType, ParticipationState};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::Error;
use crate::models::definition::{ChallengeDefinition, CompletionRequirements};
use crate::models::participation::{ParticipationRecord, Progress};

use super::ChallengeStore;

const DEFINITION_COLUMNS: &str = "id, name, challenge_type, status, start_date, end_date, \
     last_registration_date, total_completions_required";

const RECORD_COLUMNS: &str = "id, user_id, challenge_name, record_type, state, start_date, \
     end_date, end_date_time, active_completions, total_to_complete, best_attempt, goal, \
     current_value";

/// Postgres-backed store. Ids are store-assigned UUID strings; the schema
/// lives in `migrations/0001_challenges.sql`.
pub struct PgChallengeStore {
    pool: PgPool,
}

impl PgChallengeStore {
    pub fn new(pool: PgPool) -> Self {
        PgChallengeStore { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(50)
            .connect(database_url)
            .await?;
        Ok(PgChallengeStore { pool })
    }

    pub async fn from_env() -> Result<Self, Error> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| Error::Config("DATABASE_URL is not set".to_string()))?;
        Self::connect(&database_url).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct DefinitionRow {
    id: String,
    name: String,
    challenge_type: ChallengeType,
    status: ChallengeStatus,
    start_date: String,
    end_date: String,
    last_registration_date: String,
    total_completions_required: Option<i32>,
}

impl DefinitionRow {
    fn into_definition(self) -> ChallengeDefinition {
        ChallengeDefinition {
            id: self.id,
            name: self.name,
            challenge_type: self.challenge_type,
            status: self.status,
            start_date: self.start_date,
            end_date: self.end_date,
            last_registration_date: self.last_registration_date,
            completion_requirements: self.total_completions_required.map(|total| {
                CompletionRequirements {
                    total_completions_required: total.max(0) as u32,
                }
            }),
        }
    }
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: String,
    user_id: String,
    challenge_name: String,
    record_type: ChallengeType,
    state: ParticipationState,
    start_date: String,
    end_date: String,
    end_date_time: OffsetDateTime,
    active_completions: Option<i32>,
    total_to_complete: Option<i32>,
    best_attempt: Option<f64>,
    goal: Option<f64>,
    current_value: Option<f64>,
}

impl RecordRow {
    fn into_record(self) -> ParticipationRecord {
        let progress = match self.record_type {
            ChallengeType::IterativeCompletions => Progress::IterativeCompletions {
                active_completions: self.active_completions.unwrap_or(0).max(0) as u32,
                total_to_complete: self.total_to_complete.unwrap_or(0).max(0) as u32,
            },
            ChallengeType::BestAttempt => Progress::BestAttempt {
                best_attempt: self.best_attempt.unwrap_or(0.0),
            },
            ChallengeType::UserSelectedGoal => Progress::UserSelectedGoal {
                goal: self.goal.unwrap_or(0.0),
                current_value: self.current_value.unwrap_or(0.0),
            },
        };
        ParticipationRecord {
            id: self.id,
            user_id: self.user_id,
            challenge_name: self.challenge_name,
            state: self.state,
            start_date: self.start_date,
            end_date: self.end_date,
            end_date_time: self.end_date_time,
            progress,
        }
    }
}

struct RecordColumns {
    active_completions: Option<i32>,
    total_to_complete: Option<i32>,
    best_attempt: Option<f64>,
    goal: Option<f64>,
    current_value: Option<f64>,
}

fn record_columns(progress: &Progress) -> RecordColumns {
    let mut columns = RecordColumns {
        active_completions: None,
        total_to_complete: None,
        best_attempt: None,
        goal: None,
        current_value: None,
    };
    match progress {
        Progress::IterativeCompletions {
            active_completions,
            total_to_complete,
        } => {
            columns.active_completions = Some(*active_completions as i32);
            columns.total_to_complete = Some(*total_to_complete as i32);
        }
        Progress::BestAttempt { best_attempt } => {
            columns.best_attempt = Some(*best_attempt);
        }
        Progress::UserSelectedGoal {
            goal,
            current_value,
        } => {
            columns.goal = Some(*goal);
            columns.current_value = Some(*current_value);
        }
    }
    columns
}

/// `$n, $n+1, ...` for a trailing IN (...) list.
fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|index| format!("${index}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ChallengeStore for PgChallengeStore {
    async fn definition_by_id(&self, id: &str) -> Result<Option<ChallengeDefinition>, Error> {
        let sql = format!("SELECT {DEFINITION_COLUMNS} FROM challenge_definitions WHERE id = $1");
        let row: Option<DefinitionRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(DefinitionRow::into_definition))
    }

    async fn definitions_by_status(
        &self,
        statuses: &[ChallengeStatus],
    ) -> Result<Vec<ChallengeDefinition>, Error> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {DEFINITION_COLUMNS} FROM challenge_definitions WHERE status IN ({}) \
             ORDER BY start_date",
            placeholders(1, statuses.len())
        );
        let mut query = sqlx::query_as::<_, DefinitionRow>(&sql);
        for status in statuses {
            query = query.bind(*status);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(DefinitionRow::into_definition).collect())
    }

    async fn create_definition(
        &self,
        definition: &ChallengeDefinition,
    ) -> Result<ChallengeDefinition, Error> {
        let mut stored = definition.clone();
        stored.id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO challenge_definitions \
             (id, name, challenge_type, status, start_date, end_date, last_registration_date, \
              total_completions_required) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&stored.id)
        .bind(&stored.name)
        .bind(stored.challenge_type)
        .bind(stored.status)
        .bind(&stored.start_date)
        .bind(&stored.end_date)
        .bind(&stored.last_registration_date)
        .bind(
            stored
                .completion_requirements
                .map(|requirements| requirements.total_completions_required as i32),
        )
        .execute(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn update_definition(&self, definition: &ChallengeDefinition) -> Result<(), Error> {
        if definition.id.is_empty() {
            return Err(Error::NeverPersisted);
        }
        sqlx::query(
            "UPDATE challenge_definitions SET \
             name = $2, challenge_type = $3, status = $4, start_date = $5, end_date = $6, \
             last_registration_date = $7, total_completions_required = $8 \
             WHERE id = $1",
        )
        .bind(&definition.id)
        .bind(&definition.name)
        .bind(definition.challenge_type)
        .bind(definition.status)
        .bind(&definition.start_date)
        .bind(&definition.end_date)
        .bind(&definition.last_registration_date)
        .bind(
            definition
                .completion_requirements
                .map(|requirements| requirements.total_completions_required as i32),
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_definition(&self, id: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM challenge_definitions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_by_id(&self, id: &str) -> Result<Option<ParticipationRecord>, Error> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM participation_records WHERE id = $1");
        let row: Option<RecordRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(RecordRow::into_record))
    }

    async fn record_for_user(
        &self,
        user_id: &str,
        challenge_name: &str,
    ) -> Result<Option<ParticipationRecord>, Error> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM participation_records \
             WHERE user_id = $1 AND challenge_name = $2"
        );
        let row: Option<RecordRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(challenge_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(RecordRow::into_record))
    }

    async fn all_records_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ParticipationRecord>, Error> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM participation_records WHERE user_id = $1");
        let rows: Vec<RecordRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(RecordRow::into_record).collect())
    }

    async fn records_for_user(
        &self,
        user_id: &str,
        exclude: &[ParticipationState],
        ending_after: OffsetDateTime,
    ) -> Result<Vec<ParticipationRecord>, Error> {
        let mut sql = format!(
            "SELECT {RECORD_COLUMNS} FROM participation_records \
             WHERE user_id = $1 AND end_date_time >= $2"
        );
        if !exclude.is_empty() {
            sql.push_str(&format!(
                " AND state NOT IN ({})",
                placeholders(3, exclude.len())
            ));
        }
        let mut query = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(user_id)
            .bind(ending_after);
        for state in exclude {
            query = query.bind(*state);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(RecordRow::into_record).collect())
    }

    async fn records_for_challenge(
        &self,
        challenge_name: &str,
    ) -> Result<Vec<ParticipationRecord>, Error> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM participation_records \
             WHERE challenge_name = $1 ORDER BY created_at"
        );
        let rows: Vec<RecordRow> = sqlx::query_as(&sql)
            .bind(challenge_name)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(RecordRow::into_record).collect())
    }

    async fn create_record(
        &self,
        record: &ParticipationRecord,
    ) -> Result<ParticipationRecord, Error> {
        let mut stored = record.clone();
        stored.id = Uuid::new_v4().to_string();
        let columns = record_columns(&stored.progress);
        sqlx::query(
            "INSERT INTO participation_records \
             (id, user_id, challenge_name, record_type, state, start_date, end_date, \
              end_date_time, active_completions, total_to_complete, best_attempt, goal, \
              current_value) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(&stored.id)
        .bind(&stored.user_id)
        .bind(&stored.challenge_name)
        .bind(stored.progress.challenge_type())
        .bind(stored.state)
        .bind(&stored.start_date)
        .bind(&stored.end_date)
        .bind(stored.end_date_time)
        .bind(columns.active_completions)
        .bind(columns.total_to_complete)
        .bind(columns.best_attempt)
        .bind(columns.goal)
        .bind(columns.current_value)
        .execute(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn update_record(&self, record: &ParticipationRecord) -> Result<(), Error> {
        if record.id.is_empty() {
            return Err(Error::NeverPersisted);
        }
        let columns = record_columns(&record.progress);
        sqlx::query(
            "UPDATE participation_records SET \
             user_id = $2, challenge_name = $3, record_type = $4, state = $5, start_date = $6, \
             end_date = $7, end_date_time = $8, active_completions = $9, total_to_complete = $10, \
             best_attempt = $11, goal = $12, current_value = $13 \
             WHERE id = $1",
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.challenge_name)
        .bind(record.progress.challenge_type())
        .bind(record.state)
        .bind(&record.start_date)
        .bind(&record.end_date)
        .bind(record.end_date_time)
        .bind(columns.active_completions)
        .bind(columns.total_to_complete)
        .bind(columns.best_attempt)
        .bind(columns.goal)
        .bind(columns.current_value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_record(&self, id: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM participation_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
