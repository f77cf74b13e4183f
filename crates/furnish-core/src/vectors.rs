/// Query-vector composition and preference feedback.
///
/// Embeddings come from an external embedding service; this module only does
/// the arithmetic: blending a stored user preference vector with the text
/// query embedding, and folding win/lose feedback back into the preference
/// vector.
use tracing::warn;

/// Weight of the stored user preference vector in the blended query.
pub const USER_PREFERENCE_WEIGHT: f32 = 0.6;
/// Weight of the text query embedding in the blended query.
pub const TEXT_QUERY_WEIGHT: f32 = 0.4;
/// How strongly a losing product pushes the preference vector away,
/// relative to the winning product pulling it closer.
pub const LOSE_FEEDBACK_WEIGHT: f32 = 0.5;

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Blend the user preference vector with the text query embedding into one
/// L2-normalized search vector.
///
/// Either input may be absent; with one input the blend degenerates to that
/// input normalized. Mismatched lengths indicate an embedding model change,
/// in which case the fresher text embedding wins. Returns `None` only when
/// both inputs are absent.
pub fn compose_query_vector(user: Option<&[f32]>, text: Option<&[f32]>) -> Option<Vec<f32>> {
    let mut blended = match (user, text) {
        (Some(user), Some(text)) => {
            if user.len() != text.len() {
                warn!(
                    user_len = user.len(),
                    text_len = text.len(),
                    "preference vector dimension mismatch, using text embedding only"
                );
                text.to_vec()
            } else {
                user.iter()
                    .zip(text)
                    .map(|(u, t)| USER_PREFERENCE_WEIGHT * u + TEXT_QUERY_WEIGHT * t)
                    .collect()
            }
        }
        (Some(user), None) => user.to_vec(),
        (None, Some(text)) => text.to_vec(),
        (None, None) => return None,
    };
    l2_normalize(&mut blended);
    Some(blended)
}

/// Fold one comparison outcome into the preference vector:
/// `current + win - LOSE_FEEDBACK_WEIGHT * lose`, L2-normalized.
///
/// A user with no stored preference yet bootstraps from the winning vector.
/// The losing vector is optional; without one, only the winner pulls. A
/// dimension mismatch leaves the current vector unchanged (or skips the
/// losing term) rather than corrupting the preference.
pub fn apply_preference_feedback(
    current: Option<&[f32]>,
    win: &[f32],
    lose: Option<&[f32]>,
) -> Vec<f32> {
    let mut updated: Vec<f32> = match current {
        Some(current) if current.len() != win.len() => {
            warn!(
                current_len = current.len(),
                win_len = win.len(),
                "feedback vector dimension mismatch, preference vector unchanged"
            );
            return current.to_vec();
        }
        Some(current) => current.iter().zip(win).map(|(c, w)| c + w).collect(),
        None => win.to_vec(),
    };
    if let Some(lose) = lose {
        if lose.len() == updated.len() {
            for (u, l) in updated.iter_mut().zip(lose) {
                *u -= LOSE_FEEDBACK_WEIGHT * l;
            }
        } else {
            warn!(
                lose_len = lose.len(),
                win_len = win.len(),
                "losing vector dimension mismatch, ignoring it"
            );
        }
    }
    l2_normalize(&mut updated);
    updated
}
