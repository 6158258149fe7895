use serde::{Deserialize, Serialize};

use super::{
	policy::RankingPolicy,
	score::{self, RankInput, ScoredCandidate},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingStrategy {
	/// Most recently commented first. Ignores distance beyond the search radius.
	ByTimeOnly,
	/// Weighted score including the freshness of the last significant comment.
	#[default]
	FeedWeighted,
	Explore,
}
impl RankingStrategy {
	pub const ALL: [RankingStrategy; 3] = [Self::ByTimeOnly, Self::FeedWeighted, Self::Explore];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::ByTimeOnly => "by_time_only",
			Self::FeedWeighted => "feed_weighted",
			Self::Explore => "explore",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|strategy| strategy.as_str() == raw.trim())
	}

	pub fn uses_activity_log(self) -> bool {
		!matches!(self, Self::ByTimeOnly)
	}

	pub fn uses_friends(self) -> bool {
		!matches!(self, Self::ByTimeOnly)
	}

	/// How many candidates to hydrate so that post-filtering can still fill `limit` slots.
	pub fn over_fetch(self, limit: usize, policy: &RankingPolicy) -> usize {
		match self {
			Self::ByTimeOnly => limit,
			Self::FeedWeighted | Self::Explore =>
				((limit as f64 * policy.over_fetch_ratio).floor() as usize).max(limit),
		}
	}

	pub fn score(self, input: &RankInput<'_>, policy: &RankingPolicy) -> ScoredCandidate {
		match self {
			Self::ByTimeOnly => score::score_by_recency(input),
			Self::FeedWeighted => score::score_weighted(input, policy, true),
			Self::Explore => score::score_weighted(input, policy, false),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn over_fetch_matches_each_strategy() {
		let policy = RankingPolicy::default();

		assert_eq!(RankingStrategy::ByTimeOnly.over_fetch(10, &policy), 10);
		assert_eq!(RankingStrategy::FeedWeighted.over_fetch(10, &policy), 15);
		assert_eq!(RankingStrategy::Explore.over_fetch(7, &policy), 10);
		assert_eq!(RankingStrategy::Explore.over_fetch(1, &policy), 1);
	}

	#[test]
	fn recency_skips_logs_and_friends() {
		assert!(!RankingStrategy::ByTimeOnly.uses_activity_log());
		assert!(!RankingStrategy::ByTimeOnly.uses_friends());
		assert!(RankingStrategy::FeedWeighted.uses_activity_log());
		assert!(RankingStrategy::Explore.uses_friends());
	}

	#[test]
	fn names_parse_back() {
		for strategy in RankingStrategy::ALL {
			assert_eq!(RankingStrategy::parse(strategy.as_str()), Some(strategy));
		}

		assert_eq!(RankingStrategy::parse("nearest"), None);
		assert_eq!(RankingStrategy::default(), RankingStrategy::FeedWeighted);
	}
}
