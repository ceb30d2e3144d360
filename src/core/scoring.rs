use crate::core::matcher::MatchError;
use crate::models::Person;

/// Slack allowed outside [0, 1] before a score counts as malformed
pub const SCORE_EPSILON: f64 = 1e-9;

/// Calculate the compatibility (0-1) between two participants
///
/// Only the traits both people answered are compared. The score is
/// `1 - cosine_distance` over that shared sub-vector, so identical answer
/// profiles score 1.0 and orthogonal ones score 0.0.
///
/// A participant scored against themself gets 0: staying unmatched carries
/// no reward. No shared traits, or an all-zero sub-vector, also gives 0.
///
/// # Errors
/// `MatchError::ScoreOutOfRange` when the result falls outside [0, 1], which
/// only happens with negative trait values from upstream.
pub fn compatibility_score(a: &Person, b: &Person) -> Result<f64, MatchError> {
    if a.is_same_participant(b) {
        return Ok(0.0);
    }

    let mut dot = 0.0;
    let mut norm_small = 0.0;
    let mut norm_large = 0.0;
    let mut shared = 0usize;

    // BTreeMap iteration is sorted, so the smaller map drives the lookups
    let (small, large) = if a.traits.len() <= b.traits.len() {
        (&a.traits, &b.traits)
    } else {
        (&b.traits, &a.traits)
    };
    for (key, x) in small {
        if let Some(y) = large.get(key) {
            dot += x * y;
            norm_small += x * x;
            norm_large += y * y;
            shared += 1;
        }
    }

    if shared == 0 || norm_small == 0.0 || norm_large == 0.0 {
        return Ok(0.0);
    }

    let score = dot / (norm_small.sqrt() * norm_large.sqrt());

    if !(-SCORE_EPSILON..=1.0 + SCORE_EPSILON).contains(&score) {
        return Err(MatchError::ScoreOutOfRange {
            first: a.id.clone(),
            second: b.id.clone(),
            score,
        });
    }

    Ok(score.clamp(0.0, 1.0))
}
