//! Competition ranking ("1224") over a rated population.

/// Assign competition ranks to `(id, rating)` pairs.
///
/// Entries are ordered by rating descending, then id ascending. Equal ratings share the rank of
/// the first of them; the next distinct rating takes its 1-based position, leaving a gap.
pub fn competition_ranks(population: &[(i64, f64)]) -> Vec<(i64, i64)> {
    let mut sorted = population.to_vec();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut ranks = Vec::with_capacity(sorted.len());
    let mut current_rank = 1i64;
    let mut previous: Option<f64> = None;

    for (position, (id, rating)) in sorted.into_iter().enumerate() {
        if previous.is_some_and(|p| p != rating) {
            current_rank = position as i64 + 1;
        }
        ranks.push((id, current_rank));
        previous = Some(rating);
    }

    ranks
}
