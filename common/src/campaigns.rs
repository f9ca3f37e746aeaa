use phf::phf_map;
use serde::Serialize;

use crate::achievements::AchievementType;
use crate::sql_enums::ChallengeType;

#[derive(Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct CampaignInfo {
    pub display_name: &'static str,
    pub challenge_type: ChallengeType,
    /// Unit of the progress metric, for display ("murphs", "miles", ...).
    pub unit: &'static str,
    /// Menu of goals a member may pick from. Empty unless the campaign is
    /// user-selected-goal.
    pub goal_options: &'static [f64],
    /// Badge awarded on completion. None means the campaign has no badge.
    pub achievement: Option<AchievementType>,
}

pub const CAMPAIGNS: phf::Map<&'static str, CampaignInfo> = phf_map! {
    "Murph Madness" => CampaignInfo {
        display_name: "Murph Madness",
        challenge_type: ChallengeType::IterativeCompletions,
        unit: "murphs",
        goal_options: &[],
        achievement: Some(AchievementType::MurphMadness),
    },
    "Burpee Blitz" => CampaignInfo {
        display_name: "Burpee Blitz",
        challenge_type: ChallengeType::IterativeCompletions,
        unit: "rounds",
        goal_options: &[],
        achievement: Some(AchievementType::BurpeeBlitz),
    },
    "Road Warrior" => CampaignInfo {
        display_name: "Road Warrior",
        challenge_type: ChallengeType::UserSelectedGoal,
        unit: "miles",
        goal_options: &[25.0, 50.0, 75.0, 100.0],
        achievement: Some(AchievementType::RoadWarrior),
    },
    "Ruck the Winter" => CampaignInfo {
        display_name: "Ruck the Winter",
        challenge_type: ChallengeType::UserSelectedGoal,
        unit: "miles",
        goal_options: &[30.0, 60.0, 90.0],
        achievement: None,
    },
    "Plank Off" => CampaignInfo {
        display_name: "Plank Off",
        challenge_type: ChallengeType::BestAttempt,
        unit: "seconds",
        goal_options: &[],
        achievement: Some(AchievementType::PlankChampion),
    },
};
