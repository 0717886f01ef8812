//! Question ledger — append-only store of questions and their answers
//!
//! The ledger is the contract instance's entire persistent state: three
//! ordered maps keyed by the same id space plus the counter that allocates
//! ids. The host loads and stores it as one aggregate per transaction.
//!
//! # Invariants
//!
//! - Every id in `1..=counter` has a question text
//! - Ids are dense and never reused; questions are never deleted
//! - Resolution flips `false → true` exactly once, and only then is an
//!   answer present

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{Error, Question, QuestionId, Result, PENDING_ANSWER};

/// Persistent ledger aggregate.
/// Uses BTreeMap for deterministic iteration and serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LedgerState {
    questions: BTreeMap<QuestionId, String>,
    answers: BTreeMap<QuestionId, String>,
    resolved: BTreeMap<QuestionId, bool>,
    counter: QuestionId,
}

impl LedgerState {
    /// Empty ledger, counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id and store the question as unresolved
    pub fn submit(&mut self, text: impl Into<String>) -> Result<QuestionId> {
        let id = self.counter.next().ok_or(Error::CounterOverflow)?;
        self.counter = id;
        self.questions.insert(id, text.into());
        self.resolved.insert(id, false);
        debug!(question_id = %id, "question allocated");
        Ok(id)
    }

    /// Look up a question by id
    pub fn get(&self, id: QuestionId) -> Result<Question> {
        if id.is_zero() || id > self.counter {
            return Err(Error::NotFound(id));
        }
        let text = self.questions.get(&id).ok_or(Error::NotFound(id))?;
        let resolved = self.resolved.get(&id).copied().unwrap_or(false);
        let answer = match self.answers.get(&id) {
            Some(answer) if resolved => answer.clone(),
            _ => PENDING_ANSWER.to_string(),
        };
        Ok(Question {
            id,
            text: text.clone(),
            resolved,
            answer,
        })
    }

    /// Record the final answer. Allowed once per question.
    pub fn mark_resolved(&mut self, id: QuestionId, answer: impl Into<String>) -> Result<()> {
        if self.get(id)?.resolved {
            return Err(Error::AlreadyResolved(id));
        }
        self.answers.insert(id, answer.into());
        self.resolved.insert(id, true);
        debug!(question_id = %id, "question resolved");
        Ok(())
    }

    /// Number of questions, which is also the last allocated id
    pub fn count(&self) -> QuestionId {
        self.counter
    }

    /// Up to `n` questions, newest first. Non-positive `n` yields nothing.
    pub fn recent(&self, n: i64) -> Vec<Question> {
        let Ok(limit) = usize::try_from(n) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        let mut cursor = Some(self.counter).filter(|id| !id.is_zero());
        while let Some(id) = cursor {
            if out.len() >= limit {
                break;
            }
            // Ids without text are skipped rather than failing the whole view
            if let Ok(question) = self.get(id) {
                out.push(question);
            }
            cursor = id.prev();
        }
        out
    }

    /// SHA-256 over the canonical serialization of every record.
    ///
    /// Validators that applied the same transactions produce the same digest.
    pub fn digest(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(self.counter.to_string().as_bytes());
        hasher.update(b"\n");
        for id in self.questions.keys() {
            let record = self.get(*id)?;
            let line = serde_json::to_string(&record)
                .map_err(|e| Error::Serialization(e.to_string()))?;
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}

// ── Tests ─────────────────────────────────────────────────
