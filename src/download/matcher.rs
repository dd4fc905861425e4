//! Pick the search result that best fits a query

use crate::media::SearchCandidate;

/// Choose one candidate for `query`, or `None` if there are no candidates
///
/// The first title containing every query token wins; failing that, the first
/// title containing any token; failing that, the first candidate. Order is the
/// backend's relevance order and there is no scoring.
pub fn best_match<'a>(
    query: &str,
    candidates: &'a [SearchCandidate],
) -> Option<&'a SearchCandidate> {
    let query = query.to_lowercase();
    let tokens: Vec<&str> = query.split_whitespace().collect();
    let titles: Vec<String> = candidates.iter().map(|c| c.title.to_lowercase()).collect();

    let position = titles
        .iter()
        .position(|title| tokens.iter().all(|t| title.contains(t)))
        .or_else(|| {
            titles
                .iter()
                .position(|title| tokens.iter().any(|t| title.contains(t)))
        })
        .unwrap_or(0);

    candidates.get(position)
}
