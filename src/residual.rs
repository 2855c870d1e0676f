//! Residual classifier: pairs near-identical leftovers as minor numeric mistakes.

use crate::{matcher::MatchPair, reconstruct::Leftover};

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// `1 - levenshtein / max_len`, or 1 when both values are empty.
pub fn similarity(left: &str, right: &str) -> f64 {
    strsim::normalized_levenshtein(left, right)
}

pub fn is_minor_mismatch(similarity: f64, threshold: f64) -> bool {
    similarity > threshold
}

/// Pairs every ground-truth leftover with its most similar unused generated
/// leftover when the similarity clears `threshold`. Paired cells are removed
/// from both pools; whatever stays behind is spurious or missing.
pub fn pair_minor_mistakes(
    groundtruth: &mut Vec<Leftover>,
    generated: &mut Vec<Leftover>,
    threshold: f64,
) -> Vec<MatchPair> {
    let mut used = vec![false; generated.len()];
    let mut pairs = Vec::new();
    let mut unpaired = Vec::with_capacity(groundtruth.len());

    for truth in groundtruth.drain(..) {
        let mut best: Option<(usize, f64)> = None;
        for (idx, candidate) in generated.iter().enumerate() {
            if used[idx] {
                continue;
            }
            let score = similarity(&candidate.key, &truth.key);
            if score > best.map_or(0.0, |(_, current)| current) {
                best = Some((idx, score));
            }
        }
        match best {
            Some((idx, score)) if is_minor_mismatch(score, threshold) => {
                used[idx] = true;
                pairs.push(MatchPair::new(generated[idx].coords, truth.coords));
            }
            _ => unpaired.push(truth),
        }
    }

    *groundtruth = unpaired;
    let mut flags = used.into_iter();
    generated.retain(|_| !flags.next().unwrap_or(false));
    pairs
}
