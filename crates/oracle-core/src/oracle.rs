//! Oracle contract — public write and view operations
//!
//! Write operations are atomic: every step that can fail (counter
//! exhaustion, the host's generation and reconciliation) runs before the
//! ledger is touched. A host failure during resolution therefore leaves no
//! allocated id, no half-written question and no answer behind.
//!
//! User-facing failures (`Question not found`, `Already resolved`) are
//! returned as `{success: false, error}` replies, not as `Err`.
//!
//! # Reply shapes
//!
//! | operation              | inline flow                            | deferred flow                |
//! |------------------------|----------------------------------------|------------------------------|
//! | `ask_question`         | `{success, question_id, answer}`       | `{success, question_id}`     |
//! | `get_answer`           | `{success, question, answered, answer}`| `{success, question, resolved, answer}` |
//! | `get_total_questions`  | `{success, total}`                     | bare integer                 |
//! | `get_recent_questions` | `{success, count, questions}`          | bare array                   |

use serde::ser::SerializeMap;
use tracing::{debug, info};

use crate::host::{Generator, Reconciler};
use crate::{Error, Flow, LedgerState, OracleConfig, Pipeline, Question, QuestionId, Result};

// ── Replies ───────────────────────────────────────────────

/// `{success: false, error}` reply for user-facing errors
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Failure {
    pub success: bool,
    pub error: String,
}

impl Failure {
    /// Reply for `error`, or `None` if the error must abort the transaction
    pub fn from_error(error: &Error) -> Option<Self> {
        error.reply_message().map(|message| Failure {
            success: false,
            error: message.to_string(),
        })
    }
}

/// Reply to `ask_question`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AskReply {
    pub success: bool,
    pub question_id: QuestionId,
    /// Present when the question was resolved inline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// Reply to `resolve_question`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum ResolveReply {
    Resolved { success: bool, question_id: QuestionId },
    Rejected(Failure),
}

/// A question as shown in replies; the status key follows the flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub question_id: QuestionId,
    pub question: String,
    pub resolved: bool,
    pub answer: String,
    flow: Flow,
}

impl QuestionView {
    fn new(record: Question, flow: Flow) -> Self {
        QuestionView {
            question_id: record.id,
            question: record.text,
            resolved: record.resolved,
            answer: record.answer,
            flow,
        }
    }
}

impl serde::Serialize for QuestionView {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("question_id", &self.question_id)?;
        map.serialize_entry("question", &self.question)?;
        map.serialize_entry(self.flow.status_key(), &self.resolved)?;
        map.serialize_entry("answer", &self.answer)?;
        map.end()
    }
}

/// Reply to `get_answer`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerReply {
    Found(QuestionView),
    Missing(Failure),
}

impl serde::Serialize for AnswerReply {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            AnswerReply::Found(view) => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("question", &view.question)?;
                map.serialize_entry(view.flow.status_key(), &view.resolved)?;
                map.serialize_entry("answer", &view.answer)?;
                map.end()
            }
            AnswerReply::Missing(failure) => serde::Serialize::serialize(failure, serializer),
        }
    }
}

/// Reply to `get_total_questions`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum TotalReply {
    Wrapped { success: bool, total: QuestionId },
    Bare(QuestionId),
}

impl TotalReply {
    pub fn total(&self) -> QuestionId {
        match self {
            TotalReply::Wrapped { total, .. } => *total,
            TotalReply::Bare(total) => *total,
        }
    }
}

/// Reply to `get_recent_questions`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum RecentReply {
    Wrapped {
        success: bool,
        count: usize,
        questions: Vec<QuestionView>,
    },
    Bare(Vec<QuestionView>),
}

impl RecentReply {
    pub fn questions(&self) -> &[QuestionView] {
        match self {
            RecentReply::Wrapped { questions, .. } => questions,
            RecentReply::Bare(questions) => questions,
        }
    }
}

/// Serialize any reply to its JSON wire form
pub fn reply_json<T: serde::Serialize>(reply: &T) -> Result<String> {
    serde_json::to_string(reply).map_err(|e| Error::Serialization(e.to_string()))
}

// ── Oracle ────────────────────────────────────────────────

/// One oracle contract instance: configuration, ledger, and host seams
pub struct Oracle<G, R> {
    config: OracleConfig,
    state: LedgerState,
    pipeline: Pipeline<G, R>,
}

impl<G: Generator, R: Reconciler> Oracle<G, R> {
    /// Fresh instance with an empty ledger
    pub fn new(config: OracleConfig, generator: G, reconciler: R) -> Self {
        Self::with_state(config, LedgerState::new(), generator, reconciler)
    }

    /// Instance over a ledger loaded by the host
    pub fn with_state(config: OracleConfig, state: LedgerState, generator: G, reconciler: R) -> Self {
        Oracle {
            config,
            state,
            pipeline: Pipeline::new(config.schema, generator, reconciler),
        }
    }

    pub fn config(&self) -> OracleConfig {
        self.config
    }

    /// Current committed ledger
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// Hand the ledger back to the host for storage
    pub fn into_state(self) -> LedgerState {
        self.state
    }

    /// Typed lookup for Rust callers
    pub fn question(&self, id: QuestionId) -> Result<Question> {
        self.state.get(id)
    }

    // ── Write Operations ──────────────────────────────────

    /// Record a question; in the inline flow, also resolve it
    ///
    /// # Errors
    /// Host failures during inline resolution and counter exhaustion.
    /// Nothing is committed in either case.
    pub fn ask_question(&mut self, question: &str) -> Result<AskReply> {
        let flow = self.config.flow;
        if self.state.count().next().is_none() {
            return Err(Error::CounterOverflow);
        }
        let answer = match flow {
            Flow::Inline => Some(self.pipeline.resolve(question)?.into_string()),
            Flow::Deferred => None,
        };

        let id = self.state.submit(question)?;
        if let Some(answer) = &answer {
            self.state.mark_resolved(id, answer.clone())?;
        }
        info!(question_id = %id, ?flow, "question recorded");
        Ok(AskReply {
            success: true,
            question_id: id,
            answer,
        })
    }

    /// Run the model for a recorded question and store its answer
    ///
    /// # Errors
    /// Host failures only. Unknown and already-resolved ids are replies.
    pub fn resolve_question(&mut self, id: QuestionId) -> Result<ResolveReply> {
        let outcome = self.state.get(id).and_then(|record| {
            if record.resolved {
                return Err(Error::AlreadyResolved(id));
            }
            let answer = self.pipeline.resolve(&record.text)?;
            self.state.mark_resolved(id, answer.into_string())
        });

        match outcome {
            Ok(()) => {
                info!(question_id = %id, "question resolved");
                Ok(ResolveReply::Resolved {
                    success: true,
                    question_id: id,
                })
            }
            Err(error) => {
                debug!(question_id = %id, %error, "resolution rejected");
                Ok(ResolveReply::Rejected(Self::failure(error)?))
            }
        }
    }

    // ── View Operations ───────────────────────────────────

    pub fn get_answer(&self, id: QuestionId) -> AnswerReply {
        match self.state.get(id) {
            Ok(record) => AnswerReply::Found(QuestionView::new(record, self.config.flow)),
            Err(_) => AnswerReply::Missing(Failure {
                success: false,
                error: "Question not found".to_string(),
            }),
        }
    }

    pub fn get_total_questions(&self) -> TotalReply {
        let total = self.state.count();
        match self.config.flow {
            Flow::Inline => TotalReply::Wrapped {
                success: true,
                total,
            },
            Flow::Deferred => TotalReply::Bare(total),
        }
    }

    /// Newest-first window of at most `count` questions
    pub fn get_recent_questions(&self, count: i64) -> RecentReply {
        let flow = self.config.flow;
        let questions: Vec<QuestionView> = self
            .state
            .recent(count)
            .into_iter()
            .map(|record| QuestionView::new(record, flow))
            .collect();
        match flow {
            Flow::Inline => RecentReply::Wrapped {
                success: true,
                count: questions.len(),
                questions,
            },
            Flow::Deferred => RecentReply::Bare(questions),
        }
    }

    /// Reply for a user-facing error; anything else propagates
    fn failure(error: Error) -> Result<Failure> {
        Failure::from_error(&error).ok_or(error)
    }
}

// ── Tests ─────────────────────────────────────────────────
