use std::collections::HashMap;

use common::{ChallengeStatus, ChallengeType, CAMPAIGNS};
use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

use crate::error::Error;

/// Calendar dates are stored the way the legacy documents carry them:
/// locale-formatted `MM/DD/YYYY` strings.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month]/[day]/[year]");

pub fn parse_mdy(value: &str) -> Result<Date, Error> {
    Date::parse(value, DATE_FORMAT).map_err(|_| Error::InvalidDate(value.to_string()))
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequirements {
    pub total_completions_required: u32,
}

/// Campaign-wide metadata for one challenge. `status` is independent of any
/// individual participant's state and only ever advances.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeDefinition {
    /// Empty until first persisted; the store assigns it.
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub challenge_type: ChallengeType,
    pub status: ChallengeStatus,
    pub start_date: String,
    pub end_date: String,
    pub last_registration_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_requirements: Option<CompletionRequirements>,
}

impl ChallengeDefinition {
    pub fn start(&self) -> Result<Date, Error> {
        parse_mdy(&self.start_date)
    }

    pub fn end(&self) -> Result<Date, Error> {
        parse_mdy(&self.end_date)
    }

    pub fn last_registration(&self) -> Result<Date, Error> {
        parse_mdy(&self.last_registration_date)
    }

    /// First instant of the start date, UTC.
    pub fn start_moment(&self) -> Result<OffsetDateTime, Error> {
        Ok(self.start()?.midnight().assume_utc())
    }

    /// First instant after the end date, UTC. Records expire once `now`
    /// reaches this.
    pub fn end_cutoff(&self) -> Result<OffsetDateTime, Error> {
        Ok(self.end()?.midnight().assume_utc() + Duration::days(1))
    }

    /// First instant after the last registration date, UTC.
    pub fn registration_cutoff(&self) -> Result<OffsetDateTime, Error> {
        Ok(self.last_registration()?.midnight().assume_utc() + Duration::days(1))
    }

    /// The date-driven status advance, if one is due at `now`.
    ///
    /// Returns `None` when the stored status is already current, which is
    /// what keeps the definition sweep idempotent. Draft campaigns are only
    /// published by an administrator; the clock never moves them forward,
    /// but an expired campaign closes regardless of where it got stuck.
    pub fn advanced_status(&self, now: OffsetDateTime) -> Result<Option<ChallengeStatus>, Error> {
        if self.status == ChallengeStatus::Completed {
            return Ok(None);
        }
        if now >= self.end_cutoff()? {
            return Ok(Some(ChallengeStatus::Completed));
        }
        if self.status == ChallengeStatus::PreRegistration && now >= self.start_moment()? {
            return Ok(Some(ChallengeStatus::Started));
        }
        Ok(None)
    }

    pub fn validate(&self) -> Result<(), HashMap<&'static str, &'static str>> {
        let mut errors = HashMap::new();
        if self.name.is_empty() {
            errors.insert("name", "name can't be empty");
        } else if !CAMPAIGNS.contains_key(self.name.as_str()) {
            errors.insert("name", "name is not a known campaign");
        }
        let start = self.start();
        let end = self.end();
        let last_registration = self.last_registration();
        if start.is_err() {
            errors.insert("startDate", "start date must be MM/DD/YYYY");
        }
        if end.is_err() {
            errors.insert("endDate", "end date must be MM/DD/YYYY");
        }
        if last_registration.is_err() {
            errors.insert("lastRegistrationDate", "last registration date must be MM/DD/YYYY");
        }
        if let (Ok(start), Ok(end)) = (start, end) {
            if start > end {
                errors.insert("endDate", "end date can't come before the start date");
            }
            if let Ok(last_registration) = last_registration {
                if last_registration > end {
                    errors.insert(
                        "lastRegistrationDate",
                        "registration can't stay open past the end date",
                    );
                }
            }
        }
        if self.challenge_type == ChallengeType::IterativeCompletions
            && self.completion_requirements.is_none()
        {
            errors.insert(
                "completionRequirements",
                "an iterative challenge needs a completion count",
            );
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn murph_definition(status: ChallengeStatus) -> ChallengeDefinition {
        ChallengeDefinition {
            id: "def-1".to_string(),
            name: "Murph Madness".to_string(),
            challenge_type: ChallengeType::IterativeCompletions,
            status,
            start_date: "06/01/2026".to_string(),
            end_date: "06/30/2026".to_string(),
            last_registration_date: "06/15/2026".to_string(),
            completion_requirements: Some(CompletionRequirements {
                total_completions_required: 10,
            }),
        }
    }

    #[test]
    fn parses_locale_dates() {
        let def = murph_definition(ChallengeStatus::PreRegistration);
        assert_eq!(def.start().unwrap().to_string(), "2026-06-01");
        assert_eq!(def.end_cutoff().unwrap(), datetime!(2026-07-01 00:00 UTC));
        assert!(parse_mdy("not a date").is_err());
    }

    #[test]
    fn status_advances_once_the_window_opens() {
        let def = murph_definition(ChallengeStatus::PreRegistration);
        assert_eq!(
            def.advanced_status(datetime!(2026-05-20 12:00 UTC)).unwrap(),
            None
        );
        assert_eq!(
            def.advanced_status(datetime!(2026-06-01 00:00 UTC)).unwrap(),
            Some(ChallengeStatus::Started)
        );
        assert_eq!(
            def.advanced_status(datetime!(2026-07-04 08:00 UTC)).unwrap(),
            Some(ChallengeStatus::Completed)
        );
    }

    #[test]
    fn completed_status_never_regresses() {
        let def = murph_definition(ChallengeStatus::Completed);
        assert_eq!(
            def.advanced_status(datetime!(2026-06-10 12:00 UTC)).unwrap(),
            None
        );
    }

    #[test]
    fn draft_campaigns_wait_for_an_admin() {
        let def = murph_definition(ChallengeStatus::Draft);
        assert_eq!(
            def.advanced_status(datetime!(2026-06-10 12:00 UTC)).unwrap(),
            None
        );
    }

    #[test]
    fn validate_rejects_a_reversed_window() {
        let mut def = murph_definition(ChallengeStatus::Draft);
        def.end_date = "05/01/2026".to_string();
        let errors = def.validate().unwrap_err();
        assert!(errors.contains_key("endDate"));
    }

    #[test]
    fn validate_requires_a_known_campaign() {
        let mut def = murph_definition(ChallengeStatus::Draft);
        def.name = "Couch Potato".to_string();
        let errors = def.validate().unwrap_err();
        assert!(errors.contains_key("name"));
    }
}
