//! Prompt templates and equivalence criteria
//!
//! These strings are the model-facing wire contract. Validators compare
//! outputs produced from the exact same prompt, so the text must not vary.

use crate::AnswerSchema;

const VERDICT_PREAMBLE: &str = "You are a fact-checking oracle.";
const VERDICT_INSTRUCTIONS: &str = "Answer ONLY with valid JSON:
{
  \"answer\": \"yes\" | \"no\" | \"unknown\",
  \"reason\": \"short explanation\"
}";

const CONFIDENCE_PREAMBLE: &str = "You are a factual oracle.";
const CONFIDENCE_INSTRUCTIONS: &str = "Respond with JSON only:
{
  \"answer\": \"string\",
  \"confidence\": \"low\" | \"medium\" | \"high\"
}";

/// Render the fixed prompt for `schema`, embedding the question verbatim
pub fn render(schema: AnswerSchema, question: &str) -> String {
    let (preamble, instructions) = match schema {
        AnswerSchema::Verdict => (VERDICT_PREAMBLE, VERDICT_INSTRUCTIONS),
        AnswerSchema::Confidence => (CONFIDENCE_PREAMBLE, CONFIDENCE_INSTRUCTIONS),
    };
    format!(
        "\n{}\n\nQuestion:\n{}\n\n{}\n",
        preamble, question, instructions
    )
}

/// Natural-language equivalence criterion handed to the reconciler
pub fn criterion(schema: AnswerSchema) -> &'static str {
    match schema {
        AnswerSchema::Verdict => "answer must be \"yes\", \"no\", or \"unknown\"",
        AnswerSchema::Confidence => "must be valid JSON with keys \"answer\" and \"confidence\"",
    }
}
