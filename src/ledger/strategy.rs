//! Submission strategies and outcomes.
//!
//! The ledger endpoint's deployment is not under our control: status codes, accepted content
//! types and CORS headers have all changed without notice. Submission therefore walks a fixed
//! chain of encodings of the same [`super::OrderPayload`], stopping at the first confirmed
//! delivery:
//!
//! | # | Strategy       | Request                                   | Confirmable |
//! |---|----------------|-------------------------------------------|-------------|
//! | 1 | `LegacyForm`   | POST form, minimal field set              | yes         |
//! | 2 | `FullForm`     | POST form, full field set with aliases    | yes         |
//! | 3 | `Json`         | POST `application/json`, full field set   | yes         |
//! | 4 | `QueryString`  | GET, full field set as query parameters   | yes         |
//! | 5 | `OpaqueForm`   | POST form, minimal set, response ignored  | no          |
//!
//! The chain is a compatibility shim around one wire contract; once the receiving ledger
//! pins a single encoding, strategies 2 to 5 can go.

use crate::error::Error;
use std::fmt;

/// One way of delivering an order to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmitStrategy {
    LegacyForm,
    FullForm,
    Json,
    QueryString,
    OpaqueForm,
}

impl SubmitStrategy {
    /// The full chain, in attempt order.
    pub const CHAIN: [SubmitStrategy; 5] = [
        SubmitStrategy::LegacyForm,
        SubmitStrategy::FullForm,
        SubmitStrategy::Json,
        SubmitStrategy::QueryString,
        SubmitStrategy::OpaqueForm,
    ];

    /// Strategies whose response can be read and checked.
    pub const CONFIRMABLE: [SubmitStrategy; 4] = [
        SubmitStrategy::LegacyForm,
        SubmitStrategy::FullForm,
        SubmitStrategy::Json,
        SubmitStrategy::QueryString,
    ];

    pub fn is_confirmable(&self) -> bool {
        !matches!(self, SubmitStrategy::OpaqueForm)
    }
}

impl fmt::Display for SubmitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitStrategy::LegacyForm => write!(f, "legacy-form"),
            SubmitStrategy::FullForm => write!(f, "form"),
            SubmitStrategy::Json => write!(f, "json"),
            SubmitStrategy::QueryString => write!(f, "query"),
            SubmitStrategy::OpaqueForm => write!(f, "opaque-form"),
        }
    }
}

/// Why one attempt did not confirm delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptFailure {
    pub strategy: SubmitStrategy,
    pub cause: Error,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.strategy, self.cause)
    }
}

/// Result of a submission that did not hard-fail.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// A confirmable strategy got a success response.
    Confirmed {
        strategy: SubmitStrategy,
        /// Attempts that failed before `strategy` succeeded.
        failures: Vec<AttemptFailure>,
    },
    /// Every confirmable strategy failed; the opaque fallback was sent and delivery is
    /// presumed but unverified.
    Uncertain { failures: Vec<AttemptFailure> },
}

impl SubmitOutcome {
    pub fn is_uncertain(&self) -> bool {
        matches!(self, SubmitOutcome::Uncertain { .. })
    }

    /// Attempt log, in attempt order.
    pub fn failures(&self) -> &[AttemptFailure] {
        match self {
            SubmitOutcome::Confirmed { failures, .. } | SubmitOutcome::Uncertain { failures } => {
                failures
            }
        }
    }

    /// Attempt log joined into one line.
    pub fn failure_summary(&self) -> String {
        self.failures()
            .iter()
            .map(|failure| failure.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_order() {
        assert_eq!(SubmitStrategy::CHAIN[0], SubmitStrategy::LegacyForm);
        assert_eq!(SubmitStrategy::CHAIN[4], SubmitStrategy::OpaqueForm);
        assert_eq!(&SubmitStrategy::CHAIN[..4], &SubmitStrategy::CONFIRMABLE[..]);
        assert!(SubmitStrategy::CONFIRMABLE.iter().all(|s| s.is_confirmable()));
        assert!(!SubmitStrategy::OpaqueForm.is_confirmable());
    }

    #[test]
    fn test_failure_summary() {
        let outcome = SubmitOutcome::Uncertain {
            failures: vec![
                AttemptFailure {
                    strategy: SubmitStrategy::LegacyForm,
                    cause: Error::HttpError {
                        status: 405,
                        body: "nope".into(),
                    },
                },
                AttemptFailure {
                    strategy: SubmitStrategy::Json,
                    cause: Error::NetworkError("reset".into()),
                },
            ],
        };
        assert!(outcome.is_uncertain());
        assert_eq!(
            outcome.failure_summary(),
            "legacy-form: HTTP 405 nope; json: Network error: reset"
        );
    }

    #[test]
    fn test_confirmed_outcome() {
        let outcome = SubmitOutcome::Confirmed {
            strategy: SubmitStrategy::FullForm,
            failures: vec![],
        };
        assert!(!outcome.is_uncertain());
        assert!(outcome.failures().is_empty());
        assert_eq!(outcome.failure_summary(), "");
    }
}
