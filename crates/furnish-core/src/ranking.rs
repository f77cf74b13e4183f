/// Score merging for product recommendations.
///
/// Blends the retrieval similarity signal with the optional Claude-judged
/// relevance signal into one ranked list. Pure and total: no candidate is
/// ever dropped, and a missing or unusable judge score falls back to the
/// cosine similarity alone.
use std::collections::HashMap;

use crate::model::{ClaudeScore, ProductCandidate, RankedRecommendation};

/// Weight given to the retrieval cosine signal. The Claude judge contributes
/// the remaining `1.0 - COSINE_BLEND_WEIGHT`. Retrieval relevance is
/// deliberately favored over LLM judgment.
pub const COSINE_BLEND_WEIGHT: f64 = 0.7;

/// Blend each candidate's cosine similarity with its judge score (when one
/// exists) and return all candidates ranked descending by final score.
///
/// The sort is stable, so candidates with equal scores keep their input
/// order. An empty candidate list produces an empty output.
pub fn rank_products(
    candidates: Vec<ProductCandidate>,
    claude_scores: &HashMap<String, ClaudeScore>,
) -> Vec<RankedRecommendation> {
    let mut ranked: Vec<RankedRecommendation> = candidates
        .into_iter()
        .map(|candidate| {
            // A non-finite stored score is treated as absent; the parsing
            // layer already filters these, this is the last line of defense.
            let claude_score = claude_scores
                .get(&candidate.id)
                .map(|entry| entry.score)
                .filter(|score| score.is_finite());

            let score = match claude_score {
                Some(judge) => {
                    COSINE_BLEND_WEIGHT * candidate.cosine_similarity
                        + (1.0 - COSINE_BLEND_WEIGHT) * judge
                }
                None => candidate.cosine_similarity,
            };

            RankedRecommendation {
                id: candidate.id,
                score,
                cosine_similarity: candidate.cosine_similarity,
                claude_score,
                metadata: candidate.metadata,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}
