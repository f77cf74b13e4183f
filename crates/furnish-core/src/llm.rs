/// Tolerant parsing of Claude responses.
///
/// Models wrap JSON in markdown code fences, return numbers as strings, and
/// occasionally produce outright garbage. Every parser here degrades
/// gracefully: a malformed scoring response yields an empty score map (the
/// ranking layer then passes cosine scores through), and a malformed query
/// enhancement falls back to the user's original query.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::model::ClaudeScore;

const MAX_SEARCH_VARIATIONS: usize = 4;

/// Strip a surrounding markdown code fence (```json ... ```), if any.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening fence line.
    let rest = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}

/// Parse a relevance-scoring response into id -> score entries.
///
/// Accepts either a bare JSON array or an object with a `recommendations`
/// array. Entries without a usable id or score are skipped; an unparsable
/// response yields an empty map. Never fails the request.
pub fn parse_claude_scores(raw: &str) -> HashMap<String, ClaudeScore> {
    let body = strip_code_fences(raw);
    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "scoring response is not valid JSON, ignoring");
            return HashMap::new();
        }
    };

    let entries = match &parsed {
        Value::Array(entries) => entries.as_slice(),
        Value::Object(map) => match map.get("recommendations").and_then(Value::as_array) {
            Some(entries) => entries.as_slice(),
            None => {
                warn!("scoring response has no recommendations array, ignoring");
                return HashMap::new();
            }
        },
        _ => {
            warn!("scoring response is not an array or object, ignoring");
            return HashMap::new();
        }
    };

    let mut scores = HashMap::with_capacity(entries.len());
    for entry in entries {
        let Some(id) = entry.get("id").and_then(Value::as_str).filter(|i| !i.is_empty()) else {
            warn!("scoring entry without id, skipping");
            continue;
        };
        let Some(score) = entry.get("score").and_then(numeric) else {
            warn!(id, "scoring entry without usable score, skipping");
            continue;
        };
        let reason = entry
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string);
        scores.insert(id.to_string(), ClaudeScore { score, reason });
    }
    scores
}

/// Structured rewrite of a free-text furniture query. Every field is
/// optional in the wire format; absent fields default to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(default)]
pub struct EnhancedQuery {
    pub enhanced_text: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub style_tags: Vec<String>,
    pub materials: Vec<String>,
    pub colors: Vec<String>,
    pub dimensions_hint: Option<String>,
}

impl EnhancedQuery {
    fn passthrough(original: &str) -> Self {
        EnhancedQuery {
            enhanced_text: original.to_string(),
            ..Default::default()
        }
    }

    /// Alternative search strings to cast a wider retrieval net: the
    /// enhanced text, the top styles and materials paired with the
    /// subcategory, and a color+style phrase. Capped at
    /// [`MAX_SEARCH_VARIATIONS`].
    pub fn search_variations(&self) -> Vec<String> {
        let mut variations: Vec<String> = Vec::new();
        let mut push = |candidate: String| {
            let candidate = candidate.trim().to_string();
            if !candidate.is_empty() && !variations.contains(&candidate) {
                variations.push(candidate);
            }
        };

        push(self.enhanced_text.clone());
        if let Some(subcategory) = self.subcategory.as_deref() {
            for style in self.style_tags.iter().take(2) {
                push(format!("{style} {subcategory}"));
            }
            for material in self.materials.iter().take(2) {
                push(format!("{material} {subcategory}"));
            }
        }
        if let (Some(color), Some(style)) = (self.colors.first(), self.style_tags.first()) {
            push(format!("{color} {style} furniture"));
        }
        variations.truncate(MAX_SEARCH_VARIATIONS);
        variations
    }
}

/// Parse a query-enhancement response, falling back to a passthrough of the
/// original query when the response is unusable.
pub fn parse_enhanced_query(raw: &str, original: &str) -> EnhancedQuery {
    let body = strip_code_fences(raw);
    match serde_json::from_str::<EnhancedQuery>(body) {
        Ok(mut enhanced) => {
            if enhanced.enhanced_text.trim().is_empty() {
                enhanced.enhanced_text = original.to_string();
            }
            enhanced
        }
        Err(e) => {
            warn!(error = %e, "query enhancement unusable, passing original through");
            EnhancedQuery::passthrough(original)
        }
    }
}
