use std::sync::Mutex;

use common::{AchievementType, ChallengeStatus, ChallengeType};

use crate::error::Error;
use crate::models::definition::{ChallengeDefinition, CompletionRequirements};
use crate::profiles::{MemberProfile, ProfileService};

/// Profile collaborator double: resolves every member and records awards.
#[derive(Default)]
pub(crate) struct RecordingProfiles {
    pub(crate) awarded: Mutex<Vec<(AchievementType, String)>>,
}

impl ProfileService for RecordingProfiles {
    async fn member_by_id(&self, user_id: &str) -> Result<Option<MemberProfile>, Error> {
        Ok(Some(MemberProfile {
            id: user_id.to_string(),
            display_name: format!("Pax {user_id}"),
            avatar: String::new(),
        }))
    }

    async fn award_achievement(
        &self,
        achievement: AchievementType,
        user_id: &str,
    ) -> Result<(), Error> {
        self.awarded
            .lock()
            .unwrap()
            .push((achievement, user_id.to_string()));
        Ok(())
    }
}

/// A June 2026 campaign window: starts 06/01, ends 06/30, registration
/// through 06/15.
pub(crate) fn definition(
    name: &str,
    challenge_type: ChallengeType,
    status: ChallengeStatus,
) -> ChallengeDefinition {
    ChallengeDefinition {
        id: String::new(),
        name: name.to_string(),
        challenge_type,
        status,
        start_date: "06/01/2026".to_string(),
        end_date: "06/30/2026".to_string(),
        last_registration_date: "06/15/2026".to_string(),
        completion_requirements: match challenge_type {
            ChallengeType::IterativeCompletions => Some(CompletionRequirements {
                total_completions_required: 10,
            }),
            _ => None,
        },
    }
}
