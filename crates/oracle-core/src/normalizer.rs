//! Answer normalizer — converts reconciled model output to canonical form
//!
//! The reconciler hands back whatever text the validators agreed on. The
//! normalizer parses it strictly against the active [`AnswerSchema`] into a
//! [`ParsedAnswer`], substitutes the schema's fixed fallback on any failure,
//! and renders the single canonical string that is stored in the ledger.
//!
//! # Pipeline
//!
//! `reconciled text → JSON → typed reply → ParsedAnswer → canonical text`
//!
//! # Guarantees
//!
//! - **Total**: every input produces a schema-valid answer, never an error
//! - **Deterministic**: same input always produces same output
//! - **Canonical**: JSON payloads are re-serialized with sorted keys and fixed
//!   separators, so formatting differences between validators disappear
//! - **Idempotent** (confidence payloads): `normalize(normalize(x)) == normalize(x)`

use std::collections::BTreeMap;

use crate::AnswerSchema;

/// Answer stored when a verdict cannot be extracted
pub const VERDICT_FALLBACK: Verdict = Verdict::Unknown;

/// Answer text of the confidence fallback payload
pub const CONFIDENCE_FALLBACK_ANSWER: &str = "Unable to determine";

// ── Typed Answers ─────────────────────────────────────────

/// Enumerated fact-check verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Yes,
    No,
    Unknown,
}

impl Verdict {
    /// Map a reconciled answer onto the verdict set; anything else is `Unknown`
    pub fn coerce(answer: &str) -> Self {
        match answer {
            "yes" => Verdict::Yes,
            "no" => Verdict::No,
            _ => Verdict::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Yes => "yes",
            Verdict::No => "no",
            Verdict::Unknown => "unknown",
        }
    }
}

/// Model's self-reported confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// Why a reconciled output was replaced by the fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// Text is not JSON
    InvalidJson,
    /// JSON does not match the schema
    SchemaMismatch,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::InvalidJson => write!(f, "invalid JSON"),
            FallbackReason::SchemaMismatch => write!(f, "schema mismatch"),
        }
    }
}

/// Result of strictly parsing reconciled output
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedAnswer {
    /// Verdict schema reply (out-of-set answers already coerced)
    Verdict(Verdict),
    /// Confidence schema reply; `extra` keeps any additional keys verbatim
    Confidence {
        answer: String,
        confidence: Confidence,
        extra: BTreeMap<String, serde_json::Value>,
    },
    /// Output could not be used; the schema's fixed fallback applies
    Fallback {
        schema: AnswerSchema,
        reason: FallbackReason,
    },
}

impl ParsedAnswer {
    pub fn is_fallback(&self) -> bool {
        matches!(self, ParsedAnswer::Fallback { .. })
    }

    /// Render the value persisted in the ledger
    pub fn canonical(&self) -> CanonicalAnswer {
        match self {
            ParsedAnswer::Verdict(verdict) => CanonicalAnswer(verdict.as_str().to_string()),
            ParsedAnswer::Confidence {
                answer,
                confidence,
                extra,
            } => CanonicalAnswer(confidence_payload(answer, *confidence, extra)),
            ParsedAnswer::Fallback {
                schema: AnswerSchema::Verdict,
                ..
            } => CanonicalAnswer(VERDICT_FALLBACK.as_str().to_string()),
            ParsedAnswer::Fallback {
                schema: AnswerSchema::Confidence,
                ..
            } => CanonicalAnswer(confidence_payload(
                CONFIDENCE_FALLBACK_ANSWER,
                Confidence::Low,
                &BTreeMap::new(),
            )),
        }
    }
}

/// The single schema-valid string committed for a question
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CanonicalAnswer(String);

impl CanonicalAnswer {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for CanonicalAnswer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Wire Replies ──────────────────────────────────────────

/// `{"answer": "yes"|"no"|"unknown", "reason": string}`, reason is discarded
#[derive(serde::Deserialize)]
struct VerdictReply {
    answer: String,
}

/// `{"answer": string, "confidence": "low"|"medium"|"high"}`
#[derive(serde::Deserialize)]
struct ConfidenceReply {
    answer: String,
    confidence: Confidence,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

// ── Public API ─────────────────────────────────────────────

/// Strictly parse reconciled output against `schema`
pub fn parse(schema: AnswerSchema, reconciled: &str) -> ParsedAnswer {
    let fallback = |reason| ParsedAnswer::Fallback { schema, reason };

    let json: serde_json::Value = match serde_json::from_str(reconciled) {
        Ok(json) => json,
        Err(_) => return fallback(FallbackReason::InvalidJson),
    };
    // Derived struct visitors also accept sequences; replies must be objects
    if !json.is_object() {
        return fallback(FallbackReason::SchemaMismatch);
    }

    match schema {
        AnswerSchema::Verdict => match serde_json::from_value::<VerdictReply>(json) {
            Ok(reply) => ParsedAnswer::Verdict(Verdict::coerce(&reply.answer)),
            Err(_) => fallback(FallbackReason::SchemaMismatch),
        },
        AnswerSchema::Confidence => match serde_json::from_value::<ConfidenceReply>(json) {
            Ok(reply) => ParsedAnswer::Confidence {
                answer: reply.answer,
                confidence: reply.confidence,
                extra: reply.extra,
            },
            Err(_) => fallback(FallbackReason::SchemaMismatch),
        },
    }
}

/// Parse and render in one step
pub fn normalize(schema: AnswerSchema, reconciled: &str) -> CanonicalAnswer {
    parse(schema, reconciled).canonical()
}

// ── Canonical Serializer ───────────────────────────────────

fn confidence_payload(
    answer: &str,
    confidence: Confidence,
    extra: &BTreeMap<String, serde_json::Value>,
) -> String {
    let mut object: BTreeMap<String, serde_json::Value> = extra.clone();
    object.insert("answer".into(), serde_json::Value::String(answer.to_string()));
    object.insert(
        "confidence".into(),
        serde_json::Value::String(confidence.as_str().to_string()),
    );
    let mut out = String::new();
    write_object(&mut out, object.iter());
    out
}

/// Serialize a JSON value in canonical text form
///
/// Produces deterministic output with:
/// - Object keys in sorted order
/// - `", "` between items and `": "` after keys
/// - Everything outside printable ASCII escaped as `\uXXXX`
pub fn to_canonical_json(value: &serde_json::Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &serde_json::Value) {
    match value {
        serde_json::Value::Null => out.push_str("null"),
        serde_json::Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        serde_json::Value::Number(n) => out.push_str(&n.to_string()),
        serde_json::Value::String(s) => write_string(out, s),
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
        serde_json::Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            write_object(out, entries.into_iter());
        }
    }
}

fn write_object<'a>(
    out: &mut String,
    entries: impl Iterator<Item = (&'a String, &'a serde_json::Value)>,
) {
    out.push('{');
    for (i, (key, value)) in entries.enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_string(out, key);
        out.push_str(": ");
        write_value(out, value);
    }
    out.push('}');
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04x}", unit));
                }
            }
        }
    }
    out.push('"');
}

// ── Tests ─────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Verdict Schema ────────────────────────────────────

    #[test]
    fn test_verdict_in_set() {
        let parsed = parse(AnswerSchema::Verdict, r#"{"answer": "yes", "reason": "H2O"}"#);
        assert_eq!(parsed, ParsedAnswer::Verdict(Verdict::Yes));
        assert_eq!(parsed.canonical().as_str(), "yes");

        assert_eq!(normalize(AnswerSchema::Verdict, r#"{"answer":"no"}"#).as_str(), "no");
    }

    #[test]
    fn test_verdict_out_of_set_coerced() {
        for answer in ["maybe", "Yes", "NO", "", "unknown "] {
            let raw = serde_json::json!({ "answer": answer, "reason": "x" }).to_string();
            let parsed = parse(AnswerSchema::Verdict, &raw);
            assert_eq!(parsed, ParsedAnswer::Verdict(Verdict::Unknown), "answer {:?}", answer);
        }
    }

    #[test]
    fn test_verdict_reason_discarded() {
        let raw = r#"{"answer": "no", "reason": {"nested": [1, 2]}}"#;
        assert_eq!(normalize(AnswerSchema::Verdict, raw).as_str(), "no");
    }

    #[test]
    fn test_verdict_malformed_falls_back() {
        let cases = [
            ("not json at all", FallbackReason::InvalidJson),
            ("{\"answer\": \"yes\"", FallbackReason::InvalidJson),
            ("", FallbackReason::InvalidJson),
            ("\"yes\"", FallbackReason::SchemaMismatch),
            ("[\"yes\"]", FallbackReason::SchemaMismatch),
            ("[\"no\", \"because\"]", FallbackReason::SchemaMismatch),
            ("42", FallbackReason::SchemaMismatch),
            ("{\"reason\": \"no answer key\"}", FallbackReason::SchemaMismatch),
            ("{\"answer\": true}", FallbackReason::SchemaMismatch),
        ];
        for (raw, reason) in cases {
            let parsed = parse(AnswerSchema::Verdict, raw);
            assert_eq!(
                parsed,
                ParsedAnswer::Fallback {
                    schema: AnswerSchema::Verdict,
                    reason
                },
                "input {:?}",
                raw
            );
            assert_eq!(parsed.canonical().as_str(), "unknown");
        }
    }

    // ── Confidence Schema ─────────────────────────────────

    #[test]
    fn test_confidence_reserialized() {
        let canonical = normalize(
            AnswerSchema::Confidence,
            r#"{"answer":"Maybe","confidence":"high"}"#,
        );
        assert_eq!(canonical.as_str(), r#"{"answer": "Maybe", "confidence": "high"}"#);
    }

    #[test]
    fn test_confidence_key_order_is_stable() {
        let a = normalize(
            AnswerSchema::Confidence,
            r#"{"confidence": "low", "answer": "Paris"}"#,
        );
        let b = normalize(
            AnswerSchema::Confidence,
            "{\n  \"answer\" : \"Paris\",\n  \"confidence\":\"low\"\n}",
        );
        assert_eq!(a, b);
        assert_eq!(a.as_str(), r#"{"answer": "Paris", "confidence": "low"}"#);
    }

    #[test]
    fn test_confidence_extra_keys_preserved() {
        let canonical = normalize(
            AnswerSchema::Confidence,
            r#"{"sources": ["a", "b"], "answer": "42", "confidence": "medium", "notes": null}"#,
        );
        assert_eq!(
            canonical.as_str(),
            r#"{"answer": "42", "confidence": "medium", "notes": null, "sources": ["a", "b"]}"#
        );
    }

    #[test]
    fn test_confidence_extra_wide_integers_exact() {
        let raw = r#"{"answer":"x","confidence":"low","n":123456789012345678901234567890,"f":0.1}"#;
        let canonical = normalize(AnswerSchema::Confidence, raw);
        assert_eq!(
            canonical.as_str(),
            r#"{"answer": "x", "confidence": "low", "f": 0.1, "n": 123456789012345678901234567890}"#
        );
        assert_eq!(normalize(AnswerSchema::Confidence, canonical.as_str()), canonical);
    }

    #[test]
    fn test_confidence_schema_mismatch_falls_back() {
        let cases = [
            r#"{"answer": "Paris"}"#,
            r#"{"answer": "Paris", "confidence": "certain"}"#,
            r#"{"answer": "Paris", "confidence": "High"}"#,
            r#"{"answer": 7, "confidence": "low"}"#,
            r#"["Paris", "low"]"#,
            r#"["Paris", "low", {"extra": 1}]"#,
            "null",
        ];
        for raw in cases {
            let parsed = parse(AnswerSchema::Confidence, raw);
            assert_eq!(
                parsed,
                ParsedAnswer::Fallback {
                    schema: AnswerSchema::Confidence,
                    reason: FallbackReason::SchemaMismatch
                },
                "input {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_confidence_fallback_payload() {
        let canonical = normalize(AnswerSchema::Confidence, "I think the answer is Paris.");
        assert_eq!(
            canonical.as_str(),
            r#"{"answer": "Unable to determine", "confidence": "low"}"#
        );
        // The fallback itself is valid under the schema
        assert!(!parse(AnswerSchema::Confidence, canonical.as_str()).is_fallback());
    }

    #[test]
    fn test_idempotence() {
        let inputs = [
            r#"{"answer":"Maybe","confidence":"high"}"#,
            r#"{"answer":"café \"quoted\"","confidence":"low","k":{"z":1,"a":[true,false]}}"#,
            "garbage",
        ];
        for raw in inputs {
            let once = normalize(AnswerSchema::Confidence, raw);
            let twice = normalize(AnswerSchema::Confidence, once.as_str());
            assert_eq!(once, twice, "input {:?}", raw);
        }
    }

    #[test]
    fn test_determinism_100_iterations() {
        let raw = r#"{"confidence":"medium","answer":"Mount Everest","source":"survey"}"#;
        let first = normalize(AnswerSchema::Confidence, raw);
        for i in 0..100 {
            let result = normalize(AnswerSchema::Confidence, raw);
            assert_eq!(first, result, "Non-determinism at iteration {}", i);
        }
    }

    // ── Canonical Serializer ──────────────────────────────

    #[test]
    fn test_canonical_json_separators() {
        let value = serde_json::json!({"b": [1, 2.5, null], "a": {"y": true, "x": "s"}, "c": {}});
        assert_eq!(
            to_canonical_json(&value),
            r#"{"a": {"x": "s", "y": true}, "b": [1, 2.5, null], "c": {}}"#
        );
    }

    #[test]
    fn test_canonical_json_escapes() {
        let value = serde_json::json!("tab\tquote\"slash\\nl\n\u{0001}");
        assert_eq!(
            to_canonical_json(&value),
            r#""tab\tquote\"slash\\nl\n\u0001""#
        );
    }

    #[test]
    fn test_canonical_json_escapes_non_ascii() {
        assert_eq!(to_canonical_json(&serde_json::json!("café")), r#""caf\u00e9""#);
        assert_eq!(to_canonical_json(&serde_json::json!("\u{7f}")), r#""\u007f""#);
        // Astral plane characters become surrogate pairs
        assert_eq!(to_canonical_json(&serde_json::json!("🦀")), r#""\ud83e\udd80""#);
    }
}
