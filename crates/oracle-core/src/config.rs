//! Oracle configuration — flow and answer schema
//!
//! The two deployed contract shapes are configurations of the same core:
//!
//! - `combined()`: ask resolves inline, yes/no/unknown verdicts
//! - `two_step()`: ask only records, `resolve_question` runs the model,
//!   answers are `{answer, confidence}` JSON payloads
//!
//! Flow and schema are independent, so hosts may mix them.

use crate::{Error, Result};

/// When the model runs relative to `ask_question`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// `ask_question` resolves in the same transaction
    Inline,
    /// `ask_question` appends; `resolve_question` answers later
    #[default]
    Deferred,
}

impl Flow {
    /// Reply key carrying the resolution flag
    pub fn status_key(&self) -> &'static str {
        match self {
            Flow::Inline => "answered",
            Flow::Deferred => "resolved",
        }
    }
}

/// Shape the model is asked to reply with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSchema {
    /// `{"answer": "yes"|"no"|"unknown", "reason": string}`, stores the verdict
    Verdict,
    /// `{"answer": string, "confidence": "low"|"medium"|"high"}`, stores the JSON
    #[default]
    Confidence,
}

impl std::fmt::Display for AnswerSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerSchema::Verdict => write!(f, "verdict"),
            AnswerSchema::Confidence => write!(f, "confidence"),
        }
    }
}

/// Contract instance configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub flow: Flow,
    #[serde(default)]
    pub schema: AnswerSchema,
}

impl OracleConfig {
    /// Single-call oracle: ask resolves inline with verdict answers
    pub fn combined() -> Self {
        OracleConfig {
            flow: Flow::Inline,
            schema: AnswerSchema::Verdict,
        }
    }

    /// Two-call oracle: ask, then resolve with confidence payloads
    pub fn two_step() -> Self {
        OracleConfig {
            flow: Flow::Deferred,
            schema: AnswerSchema::Confidence,
        }
    }

    /// Load from a JSON document, e.g. `{"flow": "inline", "schema": "verdict"}`
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }
}
