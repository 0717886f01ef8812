//! Answer resolution pipeline — question text in, canonical answer out
//!
//! # Steps
//!
//! 1. Render the fixed prompt for the configured schema
//! 2. Wrap the generation call in a side-effect-free proposal thunk
//! 3. Hand the thunk and the schema's criterion to the reconciler
//! 4. Parse and validate the agreed text, falling back on any defect
//! 5. Render the canonical answer for the ledger
//!
//! Only host failures escape as errors. Malformed model output never does:
//! it resolves to the schema's fallback so the question still gets answered.

use tracing::{debug, info_span, warn};

use crate::host::{Generator, Reconciler};
use crate::normalizer::{self, CanonicalAnswer, ParsedAnswer};
use crate::{prompt, AnswerSchema, Result};

/// Resolution pipeline bound to one schema and one host
pub struct Pipeline<G, R> {
    schema: AnswerSchema,
    generator: G,
    reconciler: R,
}

impl<G: Generator, R: Reconciler> Pipeline<G, R> {
    pub fn new(schema: AnswerSchema, generator: G, reconciler: R) -> Self {
        Pipeline {
            schema,
            generator,
            reconciler,
        }
    }

    pub fn schema(&self) -> AnswerSchema {
        self.schema
    }

    /// Resolve a question's text into the answer to persist
    ///
    /// # Errors
    /// Returns whatever the generator or reconciler fails with; these abort
    /// the enclosing transaction.
    pub fn resolve(&self, question: &str) -> Result<CanonicalAnswer> {
        let span = info_span!("resolve", schema = %self.schema);
        let _enter = span.enter();

        let prompt = prompt::render(self.schema, question);
        let propose = || -> Result<String> {
            let raw = self.generator.exec_prompt(&prompt)?;
            Ok(raw.trim().to_string())
        };

        let reconciled = self
            .reconciler
            .reconcile(&propose, prompt::criterion(self.schema))?;

        let parsed = normalizer::parse(self.schema, &reconciled);
        if let ParsedAnswer::Fallback { reason, .. } = &parsed {
            warn!(%reason, "reconciled output rejected, storing fallback");
        }
        let answer = parsed.canonical();
        debug!(answer = %answer, "answer resolved");
        Ok(answer)
    }
}

// ── Tests ─────────────────────────────────────────────────
