use common::AchievementType;
use serde::Serialize;

use crate::error::Error;

/// The slice of a member's profile the roster view joins in.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
pub struct MemberProfile {
    pub id: String,
    pub display_name: String,
    pub avatar: String,
}

/// Boundary to the profile/badge collaborator. Awarding is fire-and-forget
/// from the manager's point of view: errors pass through untouched.
pub trait ProfileService {
    async fn member_by_id(&self, user_id: &str) -> Result<Option<MemberProfile>, Error>;

    async fn award_achievement(
        &self,
        achievement: AchievementType,
        user_id: &str,
    ) -> Result<(), Error>;
}
