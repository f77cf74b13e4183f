/// Prompt construction for the Claude calls.
///
/// Prompts live here as constants and small builders so the call sites stay
/// free of string assembly and the parsers in `llm` have one place to stay
/// in sync with.
use serde::Serialize;
use serde_json::json;

use crate::model::ProductCandidate;

/// System prompt for relevance scoring of retrieved candidates.
pub const RECOMMENDATION_SYSTEM: &str = "\
You are an interior design assistant scoring furniture candidates for a \
specific user. You will receive the user's taste summary and a list of \
candidate products with metadata. Score each candidate from 0.0 to 1.0 for \
how well it fits the user's taste and the request. Respond with ONLY a JSON \
array, one entry per candidate, each of the form \
{\"id\": \"...\", \"score\": 0.0, \"reason\": \"...\"}. \
Include every candidate exactly once. No prose outside the JSON.";

/// System prompt for rewriting a free-text query into structured search
/// fields. The response schema matches [`crate::llm::EnhancedQuery`].
pub const QUERY_ENHANCER_SYSTEM: &str = "\
You are a furniture search expert. Rewrite the user's shopping query into a \
JSON object with these fields: enhanced_text (a richer search phrase), \
category, subcategory, style_tags, materials, colors, dimensions_hint. Use \
null or [] for anything the query does not imply. Respond with ONLY the \
JSON object.";

const TASTE_SUMMARY_INSTRUCTIONS: &str = "\
Summarize this user's furniture taste in 2-3 sentences based on their \
preference signals below. Mention preferred styles, materials, and colors. \
Write in the second person and keep it concrete.";

/// System and user prompts for the scoring call. The user half carries the
/// taste summary plus the candidate list serialized as compact JSON.
pub fn recommendation_prompts(
    taste_summary: &str,
    candidates: &[ProductCandidate],
) -> (&'static str, String) {
    let listing = json!(candidates
        .iter()
        .map(|c| json!({"id": c.id, "metadata": c.metadata}))
        .collect::<Vec<_>>());
    let user = format!("User taste summary:\n{taste_summary}\n\nCandidates:\n{listing}");
    (RECOMMENDATION_SYSTEM, user)
}

/// User prompt asking for a natural-language taste summary of arbitrary
/// preference context (survey answers, liked products, feedback counts).
pub fn taste_summary_prompt<C: Serialize>(context: &C) -> Result<String, serde_json::Error> {
    let context = serde_json::to_string_pretty(context)?;
    Ok(format!("{TASTE_SUMMARY_INSTRUCTIONS}\n\n{context}"))
}

pub fn query_enhancer_user(query: &str) -> String {
    format!("Query: {query}")
}
