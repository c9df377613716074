use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown stage '{0}'")]
pub struct ParseStageError(String);

#[derive(Debug, Error)]
#[error("unknown status '{0}'")]
pub struct ParseStatusError(String);

/// Where an applicant sits in the hiring funnel.
///
/// Stored and serialized as the exact display strings, so filtered views
/// compare enum values rather than free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "Application Screening")]
    ApplicationScreening,
    Shortlisted,
    Rejected,
    Hired,
}

impl Stage {
    /// Transition table for the funnel. Same-stage updates are no-ops and
    /// always allowed; `Rejected` and `Hired` are terminal.
    #[must_use]
    pub fn can_advance_to(self, next: Stage) -> bool {
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Stage::ApplicationScreening, Stage::Shortlisted)
                | (Stage::ApplicationScreening, Stage::Rejected)
                | (Stage::Shortlisted, Stage::Rejected)
                | (Stage::Shortlisted, Stage::Hired)
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::ApplicationScreening => "Application Screening",
            Stage::Shortlisted => "Shortlisted",
            Stage::Rejected => "Rejected",
            Stage::Hired => "Hired",
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Stage::ApplicationScreening
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Application Screening" => Ok(Stage::ApplicationScreening),
            "Shortlisted" => Ok(Stage::Shortlisted),
            "Rejected" => Ok(Stage::Rejected),
            "Hired" => Ok(Stage::Hired),
            other => Err(ParseStageError(other.to_string())),
        }
    }
}

/// Pipeline status shown in list views and used by the filtered listers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "New Application")]
    NewApplication,
    Shortlisted,
    Rejected,
    Hired,
}

impl Status {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Status::NewApplication => "New Application",
            Status::Shortlisted => "Shortlisted",
            Status::Rejected => "Rejected",
            Status::Hired => "Hired",
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::NewApplication
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New Application" => Ok(Status::NewApplication),
            "Shortlisted" => Ok(Status::Shortlisted),
            "Rejected" => Ok(Status::Rejected),
            "Hired" => Ok(Status::Hired),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screening_can_shortlist_or_reject() {
        assert!(Stage::ApplicationScreening.can_advance_to(Stage::Shortlisted));
        assert!(Stage::ApplicationScreening.can_advance_to(Stage::Rejected));
        assert!(!Stage::ApplicationScreening.can_advance_to(Stage::Hired));
    }

    #[test]
    fn test_shortlisted_can_hire_or_reject() {
        assert!(Stage::Shortlisted.can_advance_to(Stage::Hired));
        assert!(Stage::Shortlisted.can_advance_to(Stage::Rejected));
        assert!(!Stage::Shortlisted.can_advance_to(Stage::ApplicationScreening));
    }

    #[test]
    fn test_terminal_stages() {
        assert!(!Stage::Rejected.can_advance_to(Stage::Shortlisted));
        assert!(!Stage::Hired.can_advance_to(Stage::Rejected));
        assert!(Stage::Hired.can_advance_to(Stage::Hired));
    }

    #[test]
    fn test_stage_round_trips_through_str() {
        for stage in [
            Stage::ApplicationScreening,
            Stage::Shortlisted,
            Stage::Rejected,
            Stage::Hired,
        ] {
            assert_eq!(stage.as_str().parse::<Stage>().unwrap(), stage);
        }
    }

    #[test]
    fn test_status_serde_uses_display_strings() {
        let json = serde_json::to_string(&Status::NewApplication).unwrap();
        assert_eq!(json, "\"New Application\"");
        let back: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Status::NewApplication);
    }

    #[test]
    fn test_unknown_stage_rejected() {
        assert!("shortlisted".parse::<Stage>().is_err());
        assert!("Screening".parse::<Stage>().is_err());
    }
}
