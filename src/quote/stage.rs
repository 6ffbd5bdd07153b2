//! Quote lifecycle state machine.
//!
//! ```text
//! Draft --submit--> Submitted --confirm--> Confirmed
//!                   |   ^    \
//!                   +---+     --reject---> Rejected
//!                  submit (no-op)
//! ```
//!
//! `Confirmed` and `Rejected` are terminal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle stage of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QuoteStage {
    #[default]
    Draft,
    Submitted,
    Confirmed,
    Rejected,
}

/// Stage-changing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Submit,
    Confirm,
    Reject,
}

/// Result of applying a legal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageChange {
    Moved { from: QuoteStage, to: QuoteStage },
    Unchanged,
}

impl QuoteStage {
    pub const ALL: [QuoteStage; 4] = [
        QuoteStage::Draft,
        QuoteStage::Submitted,
        QuoteStage::Confirmed,
        QuoteStage::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStage::Draft => "Draft",
            QuoteStage::Submitted => "Submitted",
            QuoteStage::Confirmed => "Confirmed",
            QuoteStage::Rejected => "Rejected",
        }
    }

    /// Parse a stage name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Whether no further item or field mutation is allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuoteStage::Confirmed | QuoteStage::Rejected)
    }

    /// Apply `transition`, or `None` when it is illegal from this stage.
    pub fn next(self, transition: Transition) -> Option<StageChange> {
        use QuoteStage::*;
        use Transition::*;

        let to = match (self, transition) {
            (Draft, Submit) => Submitted,
            (Submitted, Submit) => return Some(StageChange::Unchanged),
            (Submitted, Confirm) => Confirmed,
            (Submitted, Reject) => Rejected,
            _ => return None,
        };
        Some(StageChange::Moved { from: self, to })
    }
}

impl fmt::Display for QuoteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Submit => write!(f, "submit"),
            Transition::Confirm => write!(f, "confirm"),
            Transition::Reject => write!(f, "reject"),
        }
    }
}
