//! Decision types for admission results.
//!
//! Every limiter resolves an admission attempt to a `Decision`: either the
//! request passes through, or it is denied with a reason that distinguishes
//! "the server refused" from "the caller gave up".

use serde::{Deserialize, Serialize};

/// The verdict produced for one admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Decision {
    /// The request may proceed to the protected handler.
    Allow,
    /// The request must be rejected.
    Deny(DenyReason),
}

impl Decision {
    /// Check if the request is allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Check if the request is denied.
    pub fn is_denied(&self) -> bool {
        !self.is_allowed()
    }

    /// Get the denial reason, if any.
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Allow => None,
            Decision::Deny(reason) => Some(*reason),
        }
    }
}

/// Why an admission attempt was denied.
///
/// Threshold breaches and caller timeouts are semantically different outcomes
/// (server refused vs. client gave up) and map to different response statuses,
/// so they are kept as distinct variants rather than overloaded into one code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The configured rate was reached within the current window.
    LimitExceeded,
    /// The caller's deadline fired before an admission slot became available.
    Cancelled,
    /// The limiter was shut down and is configured to fail closed.
    ShutDown,
}

impl DenyReason {
    /// Whether this denial is timeout-class (the caller gave up) rather than
    /// a refusal by the limiter itself.
    pub fn is_timeout_class(&self) -> bool {
        matches!(self, DenyReason::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_allowed() {
        let decision = Decision::Allow;

        assert!(decision.is_allowed());
        assert!(!decision.is_denied());
        assert_eq!(decision.deny_reason(), None);
    }

    #[test]
    fn test_decision_denied() {
        let decision = Decision::Deny(DenyReason::LimitExceeded);

        assert!(decision.is_denied());
        assert!(!decision.is_allowed());
        assert_eq!(decision.deny_reason(), Some(DenyReason::LimitExceeded));
    }

    #[test]
    fn test_timeout_class() {
        assert!(DenyReason::Cancelled.is_timeout_class());
        assert!(!DenyReason::LimitExceeded.is_timeout_class());
        assert!(!DenyReason::ShutDown.is_timeout_class());
    }
}
