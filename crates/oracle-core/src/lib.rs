//! Oracle Core - question ledger and AI answer resolution for the Truth Oracle
//!
//! Users submit natural-language questions; the host's non-deterministic
//! generation primitive proposes an answer, the host's comparative
//! equivalence principle reconciles what independent validators produced,
//! and this crate turns the agreed text into one canonical value that is
//! committed to the ledger.
//!
//! # Architecture
//!
//! ```text
//! ask_question → Ledger (allocate id, store text)
//!                   ↓
//! resolve      → Pipeline: prompt → Generator (thunk) → Reconciler
//!                   ↓
//!                Normalizer: parse + validate → ParsedAnswer → canonical text
//!                   ↓
//!                Ledger (mark resolved)
//! ```
//!
//! # Guarantees
//!
//! - **Deterministic**: the same reconciled text always yields the same stored answer
//! - **Total**: malformed model output resolves to a fixed fallback, never an error
//! - **Atomic**: a write either commits completely or leaves the ledger untouched
//! - **Append-only**: ids are dense, never reused, questions never deleted

pub mod config;
pub mod error;
pub mod host;
pub mod ledger;
pub mod normalizer;
pub mod oracle;
pub mod pipeline;
pub mod prompt;

pub use config::{AnswerSchema, Flow, OracleConfig};
pub use error::{Error, Result};
pub use host::{Generator, Reconciler, SingleExecution};
pub use ledger::LedgerState;
pub use normalizer::{CanonicalAnswer, Confidence, FallbackReason, ParsedAnswer, Verdict};
pub use oracle::Oracle;
pub use pipeline::Pipeline;

use primitive_types::U256;

/// Answer reported for a question that has not been resolved yet
pub const PENDING_ANSWER: &str = "pending";

// ── Question Identity ─────────────────────────────────────

/// 256-bit question identifier, allocated densely from 1 by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct QuestionId(U256);

impl QuestionId {
    /// The counter value before any question exists
    pub const ZERO: QuestionId = QuestionId(U256([0; 4]));

    pub fn new(value: U256) -> Self {
        QuestionId(value)
    }

    pub fn value(&self) -> U256 {
        self.0
    }

    /// Convert a host-supplied signed integer. Negative ids can never be
    /// allocated, so callers answer `None` with `Question not found`.
    pub fn from_signed(value: i64) -> Option<Self> {
        u64::try_from(value).ok().map(QuestionId::from)
    }

    /// Next id in sequence, `None` once the id space is exhausted
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(U256::one()).map(QuestionId)
    }

    /// Previous id in sequence, `None` below 1
    pub fn prev(&self) -> Option<Self> {
        if self.0 <= U256::one() {
            return None;
        }
        Some(QuestionId(self.0 - U256::one()))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The id as a `u64`, if it fits
    pub fn to_u64(&self) -> Option<u64> {
        if self.0.bits() <= 64 {
            Some(self.0.low_u64())
        } else {
            None
        }
    }
}

impl From<u64> for QuestionId {
    fn from(value: u64) -> Self {
        QuestionId(U256::from(value))
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for QuestionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        // JSON numbers lose precision past 64 bits
        match self.to_u64() {
            Some(n) => serializer.serialize_u64(n),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> serde::Deserialize<'de> for QuestionId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // Going through `Value` keeps arbitrary-precision numbers intact
        let decimal = match <serde_json::Value as serde::Deserialize>::deserialize(deserializer)? {
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) => s,
            other => {
                return Err(serde::de::Error::custom(format!(
                    "invalid question id {}, expected an unsigned integer",
                    other
                )))
            }
        };
        decimal.parse().map_err(serde::de::Error::custom)
    }
}

impl std::str::FromStr for QuestionId {
    type Err = String;

    /// Parse a non-negative decimal id
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("invalid question id '{}'", s));
        }
        U256::from_dec_str(s)
            .map(QuestionId)
            .map_err(|e| format!("invalid question id '{}': {:?}", s, e))
    }
}

// ── Question Record ───────────────────────────────────────

/// A question as projected out of the ledger
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub resolved: bool,
    /// Canonical answer once resolved, otherwise [`PENDING_ANSWER`]
    pub answer: String,
}
