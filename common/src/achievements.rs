use serde::Serialize;
use strum::{EnumString, IntoStaticStr, VariantArray};

#[derive(Serialize, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub enum AchievementCategory {
    ChallengeRelated,
    AttendanceRelated,
    Miscellaneous,
}

#[derive(
    Serialize, Copy, Clone, PartialEq, Eq, Hash, VariantArray, IntoStaticStr, EnumString, Debug,
)]
pub enum AchievementType {
    // Challenge Related
    MurphMadness,
    RoadWarrior,
    PlankChampion,
    BurpeeBlitz,
    // Attendance Related
    FirstPost,
    HundredPosts,
    // Miscellaneous
    SiteFounder,
}

impl AchievementType {
    pub fn get_achievement_name(self) -> &'static str {
        match self {
            AchievementType::MurphMadness => "Murph Machine",
            AchievementType::RoadWarrior => "Road Warrior",
            AchievementType::PlankChampion => "Plank Champion",
            AchievementType::BurpeeBlitz => "Blitzed",
            AchievementType::FirstPost => "Welcome Party",
            AchievementType::HundredPosts => "Centurion",
            AchievementType::SiteFounder => "Founder",
        }
    }

    pub fn get_achievement_category(self) -> AchievementCategory {
        match self {
            AchievementType::MurphMadness
            | AchievementType::RoadWarrior
            | AchievementType::PlankChampion
            | AchievementType::BurpeeBlitz => AchievementCategory::ChallengeRelated,
            AchievementType::FirstPost | AchievementType::HundredPosts => {
                AchievementCategory::AttendanceRelated
            }
            AchievementType::SiteFounder => AchievementCategory::Miscellaneous,
        }
    }

    pub fn get_achievement_description(self) -> &'static str {
        match self {
            AchievementType::MurphMadness => {
                "Finish every required Murph before the Murph Madness window closes"
            }
            AchievementType::RoadWarrior => {
                "Run the mileage goal you picked before the clock runs out"
            }
            AchievementType::PlankChampion => "Hold the longest plank of the Plank Off",
            AchievementType::BurpeeBlitz => "Finish every Burpee Blitz round before the deadline",
            AchievementType::FirstPost => "Post at your first beatdown",
            AchievementType::HundredPosts => "Post at 100 beatdowns",
            AchievementType::SiteFounder => "Launch a new AO",
        }
    }

    pub fn get_icon(self) -> String {
        format!("<img src=\"/static/achievement-icons/{self:?}.svg\">")
    }
}
