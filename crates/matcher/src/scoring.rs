//! Small numeric helpers shared by the resolver stages and the gates.

use std::cmp::Ordering;

/// Softmax over `scores`. The maximum is subtracted first so large dot
/// products cannot overflow `exp`.
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let Some(max) = scores.iter().copied().reduce(f32::max) else {
        return Vec::new();
    };
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest score. Ties go to the earliest index.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

/// Indices ordered by score, highest first. Equal scores keep their input order.
pub fn rank_descending(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
    });
    order
}
