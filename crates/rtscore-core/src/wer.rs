//! Word-level edit distance and word error rate.
//!
//! WER = (substitutions + deletions + insertions) / reference length.

/// Levenshtein distance between two token sequences with unit costs.
///
/// Keeps two rows of the DP matrix, sized on the shorter sequence.
pub fn edit_distance<T: PartialEq>(hypothesis: &[T], reference: &[T]) -> usize {
    // Distance is symmetric, so the shorter side can index the columns.
    let (long, short) = if hypothesis.len() >= reference.len() {
        (hypothesis, reference)
    } else {
        (reference, hypothesis)
    };
    if short.is_empty() {
        return long.len();
    }

    let mut prev: Vec<usize> = (0..=short.len()).collect();
    let mut curr = vec![0usize; short.len() + 1];

    for (i, a) in long.iter().enumerate() {
        curr[0] = i + 1;
        for (j, b) in short.iter().enumerate() {
            let cost = usize::from(a != b);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[short.len()]
}

/// Word error rate of `hypothesis` against `reference`.
///
/// An empty reference yields 0.0 when the hypothesis is also empty and 1.0
/// otherwise. The rate is not capped: insertions can push it above 1.0.
pub fn word_error_rate<T: PartialEq>(hypothesis: &[T], reference: &[T]) -> f64 {
    if reference.is_empty() {
        return if hypothesis.is_empty() { 0.0 } else { 1.0 };
    }
    edit_distance(hypothesis, reference) as f64 / reference.len() as f64
}
