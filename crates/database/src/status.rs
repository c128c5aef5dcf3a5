//! Complaint status and transition rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// Lifecycle status of a complaint.
///
/// Stored as its display string (e.g. `"Under Review"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplaintStatus {
    #[serde(rename = "New")]
    New,
    #[serde(rename = "Under Review")]
    UnderReview,
    #[serde(rename = "Assigned")]
    Assigned,
    #[serde(rename = "Reply Sent")]
    ReplySent,
    #[serde(rename = "Resolved")]
    Resolved,
    #[serde(rename = "Escalated")]
    Escalated,
}

impl ComplaintStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [ComplaintStatus; 6] = [
        ComplaintStatus::New,
        ComplaintStatus::UnderReview,
        ComplaintStatus::Assigned,
        ComplaintStatus::ReplySent,
        ComplaintStatus::Resolved,
        ComplaintStatus::Escalated,
    ];

    /// The stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::New => "New",
            ComplaintStatus::UnderReview => "Under Review",
            ComplaintStatus::Assigned => "Assigned",
            ComplaintStatus::ReplySent => "Reply Sent",
            ComplaintStatus::Resolved => "Resolved",
            ComplaintStatus::Escalated => "Escalated",
        }
    }

    /// Statuses counted as "pending" in per-user statistics.
    ///
    /// `Escalated` is deliberately absent: escalated complaints are neither
    /// pending nor resolved in those counts.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            ComplaintStatus::New
                | ComplaintStatus::UnderReview
                | ComplaintStatus::Assigned
                | ComplaintStatus::ReplySent
        )
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ComplaintStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == trimmed)
            .ok_or_else(|| ValidationError::Invalid {
                field: "status".to_string(),
                reason: format!("unknown status '{}'", trimmed),
            })
    }
}

/// Which status changes the lifecycle accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any status may follow any other.
    #[default]
    Open,
    /// Only the pairs listed in [`TransitionPolicy::allows`] are accepted.
    Guarded,
}

impl TransitionPolicy {
    /// Whether a complaint currently in `from` may move to `to`.
    pub fn allows(&self, from: ComplaintStatus, to: ComplaintStatus) -> bool {
        use ComplaintStatus::*;

        match self {
            TransitionPolicy::Open => true,
            TransitionPolicy::Guarded => match (from, to) {
                (New, UnderReview | Assigned | ReplySent | Resolved | Escalated) => true,
                // Re-assignment keeps the complaint under review.
                (UnderReview, UnderReview | Assigned | ReplySent | Resolved | Escalated) => true,
                (Assigned, UnderReview | ReplySent | Resolved | Escalated) => true,
                (ReplySent, UnderReview | Assigned | Resolved | Escalated) => true,
                (Escalated, UnderReview | Assigned | ReplySent | Resolved | Escalated) => true,
                // Reopen only.
                (Resolved, UnderReview) => true,
                _ => false,
            },
        }
    }

    /// Reject the pair unless the policy allows it.
    pub fn check(&self, from: ComplaintStatus, to: ComplaintStatus) -> crate::Result<()> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(crate::DatabaseError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(TransitionPolicy::Open),
            "guarded" => Ok(TransitionPolicy::Guarded),
            other => Err(ValidationError::Invalid {
                field: "transition policy".to_string(),
                reason: format!("expected 'open' or 'guarded', got '{}'", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_trims_whitespace() {
        assert_eq!(
            " Under Review ".parse::<ComplaintStatus>().unwrap(),
            ComplaintStatus::UnderReview
        );
        assert_eq!("Resolved".parse::<ComplaintStatus>().unwrap(), ComplaintStatus::Resolved);
        assert!("resolved".parse::<ComplaintStatus>().is_err());
        assert!("Closed".parse::<ComplaintStatus>().is_err());
    }

    #[test]
    fn test_status_display_matches_stored_form() {
        for status in ComplaintStatus::ALL {
            assert_eq!(status.to_string().parse::<ComplaintStatus>().unwrap(), status);
        }
        assert_eq!(ComplaintStatus::ReplySent.to_string(), "Reply Sent");
    }

    #[test]
    fn test_escalated_is_not_pending() {
        assert!(!ComplaintStatus::Escalated.is_pending());
        assert!(!ComplaintStatus::Resolved.is_pending());
        assert!(ComplaintStatus::ReplySent.is_pending());
    }

    #[test]
    fn test_open_policy_allows_everything() {
        for from in ComplaintStatus::ALL {
            for to in ComplaintStatus::ALL {
                assert!(TransitionPolicy::Open.allows(from, to));
            }
        }
    }

    #[test]
    fn test_guarded_policy() {
        let policy = TransitionPolicy::Guarded;
        assert!(policy.allows(ComplaintStatus::New, ComplaintStatus::Resolved));
        assert!(policy.allows(ComplaintStatus::Resolved, ComplaintStatus::UnderReview));
        assert!(!policy.allows(ComplaintStatus::Resolved, ComplaintStatus::New));
        assert!(!policy.allows(ComplaintStatus::Resolved, ComplaintStatus::Escalated));
        assert!(!policy.allows(ComplaintStatus::New, ComplaintStatus::New));
        assert!(matches!(
            policy.check(ComplaintStatus::Resolved, ComplaintStatus::New),
            Err(crate::DatabaseError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("Guarded".parse::<TransitionPolicy>().unwrap(), TransitionPolicy::Guarded);
        assert_eq!("open".parse::<TransitionPolicy>().unwrap(), TransitionPolicy::Open);
        assert!("strict".parse::<TransitionPolicy>().is_err());
    }
}
