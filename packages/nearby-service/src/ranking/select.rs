use std::cmp::Ordering;

use super::score::ScoredCandidate;

/// The `k` best candidates accepted by `keep`, in ascending ranking order.
///
/// Candidates are filtered before selection so rejected ones never take a slot. Ties keep their
/// input order.
pub fn select_top<F>(scored: Vec<ScoredCandidate>, k: usize, mut keep: F) -> Vec<ScoredCandidate>
where
	F: FnMut(&ScoredCandidate) -> bool,
{
	if k == 0 {
		return Vec::new();
	}

	let mut indexed: Vec<(usize, ScoredCandidate)> =
		scored.into_iter().enumerate().filter(|(_, candidate)| keep(candidate)).collect();

	if indexed.len() > k {
		indexed.select_nth_unstable_by(k - 1, cmp_ranked);
		indexed.truncate(k);
	}

	indexed.sort_unstable_by(cmp_ranked);

	indexed.into_iter().map(|(_, candidate)| candidate).collect()
}

fn cmp_ranked(left: &(usize, ScoredCandidate), right: &(usize, ScoredCandidate)) -> Ordering {
	left.1.ranking.total_cmp(&right.1.ranking).then(left.0.cmp(&right.0))
}
