use std::collections::HashMap;

use common::{AchievementType, ChallengeType, CAMPAIGNS};

/// One campaign's static configuration: its variant, the badge it awards and
/// the goal menu it offers.
#[derive(Clone, Debug)]
pub struct CampaignEntry {
    pub challenge_type: ChallengeType,
    pub unit: String,
    pub goal_options: Vec<f64>,
    pub achievement: Option<AchievementType>,
}

/// The badge/goal-menu registry, handed to the manager at construction
/// instead of living as a process-wide global.
#[derive(Clone, Debug, Default)]
pub struct CampaignCatalog {
    entries: HashMap<String, CampaignEntry>,
}

impl CampaignCatalog {
    /// The built-in campaigns from `common::CAMPAIGNS`.
    pub fn standard() -> Self {
        let mut catalog = CampaignCatalog::default();
        for campaign in CAMPAIGNS.values() {
            catalog.entries.insert(
                campaign.display_name.to_string(),
                CampaignEntry {
                    challenge_type: campaign.challenge_type,
                    unit: campaign.unit.to_string(),
                    goal_options: campaign.goal_options.to_vec(),
                    achievement: campaign.achievement,
                },
            );
        }
        catalog
    }

    pub fn with_campaign(mut self, name: &str, entry: CampaignEntry) -> Self {
        self.entries.insert(name.to_string(), entry);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CampaignEntry> {
        self.entries.get(name)
    }

    /// Badge configured for a campaign, if any. Absence means no badge is
    /// awarded, not an error.
    pub fn achievement_for(&self, name: &str) -> Option<AchievementType> {
        self.entries.get(name).and_then(|entry| entry.achievement)
    }

    pub fn goal_offered(&self, name: &str, goal: f64) -> bool {
        self.entries
            .get(name)
            .is_some_and(|entry| entry.goal_options.contains(&goal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_mirrors_the_builtin_campaigns() {
        let catalog = CampaignCatalog::standard();
        let road_warrior = catalog.get("Road Warrior").unwrap();
        assert_eq!(road_warrior.challenge_type, ChallengeType::UserSelectedGoal);
        assert!(catalog.goal_offered("Road Warrior", 50.0));
        assert!(!catalog.goal_offered("Road Warrior", 42.0));
        assert_eq!(
            catalog.achievement_for("Murph Madness"),
            Some(AchievementType::MurphMadness)
        );
        assert_eq!(catalog.achievement_for("Ruck the Winter"), None);
        assert!(catalog.get("Couch Potato").is_none());
    }
}
