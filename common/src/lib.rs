pub mod achievements;
pub mod campaigns;
pub mod sql_enums;

pub use achievements::{AchievementCategory, AchievementType};
pub use campaigns::{CampaignInfo, CAMPAIGNS};
pub use sql_enums::{ChallengeStatus, ChallengeType, ParticipationState};
