use std::{
	collections::{HashMap, HashSet},
	time::Instant,
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use nearby_domain::{ActivityLogEntry, Coordinates, GroupSnapshot};

use crate::{
	Error, NearbyService, Result, VisibilityFilter,
	ranking::{self, RankInput, RankingStrategy, ScoredCandidate},
};

/// Optional behaviors a client declares support for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientFeature {
	/// The client can render groups that require approval to join.
	PrivateGroups,
}

/// The user and client asking for nearby groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requester {
	/// `None` for signed-out requests, which never load friends.
	pub user_id: Option<i64>,
	#[serde(default)]
	pub is_admin: bool,
	#[serde(default)]
	pub features: HashSet<ClientFeature>,
	#[serde(default)]
	pub blocked_user_ids: HashSet<i64>,
}
impl Requester {
	pub fn anonymous() -> Self {
		Self::default()
	}

	pub fn signed_in(user_id: i64) -> Self {
		Self { user_id: Some(user_id), ..Self::default() }
	}

	pub fn with_admin(self, is_admin: bool) -> Self {
		Self { is_admin, ..self }
	}

	pub fn with_feature(mut self, feature: ClientFeature) -> Self {
		self.features.insert(feature);

		self
	}

	pub fn with_blocked(mut self, user_ids: impl IntoIterator<Item = i64>) -> Self {
		self.blocked_user_ids.extend(user_ids);

		self
	}

	pub fn supports(&self, feature: ClientFeature) -> bool {
		self.features.contains(&feature)
	}

	pub fn has_blocked(&self, user_id: i64) -> bool {
		self.blocked_user_ids.contains(&user_id)
	}
}

/// Hides groups whose owner or last significant commenter the requester has blocked.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockedUsers;
impl VisibilityFilter for BlockedUsers {
	fn is_visible(&self, group: &GroupSnapshot, requester: &Requester) -> bool {
		if requester.has_blocked(group.owner_id) {
			return false;
		}

		!group
			.last_significant_comment
			.is_some_and(|comment| requester.has_blocked(comment.author_id))
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverRequest {
	pub origin: Coordinates,
	/// Blank entries are ignored. Falls back to `search.default_spaces` when nothing remains.
	#[serde(default)]
	pub spaces: Vec<String>,
	#[serde(default)]
	pub strategy: RankingStrategy,
	pub limit: u32,
	#[serde(default)]
	pub requester: Requester,
	/// Reference time for decay curves. Defaults to the current time.
	#[serde(default, with = "nearby_domain::time_serde::option")]
	pub now: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverItem {
	pub group: GroupSnapshot,
	pub score: ScoredCandidate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverResponse {
	pub strategy: RankingStrategy,
	pub items: Vec<DiscoverItem>,
}

impl NearbyService {
	/// Finds, scores and ranks groups near `req.origin`.
	pub async fn discover(&self, req: DiscoverRequest) -> Result<DiscoverResponse> {
		let started = Instant::now();
		let spaces = self.resolve_spaces(&req.spaces)?;

		if req.limit == 0 {
			return Err(Error::InvalidRequest {
				message: "limit must be greater than zero.".to_string(),
			});
		}
		if !req.origin.is_valid() {
			return Err(Error::InvalidRequest {
				message: "origin must be a valid latitude/longitude pair.".to_string(),
			});
		}

		let now = req.now.unwrap_or_else(OffsetDateTime::now_utc);
		let strategy = req.strategy;
		let admin_factor =
			if req.requester.is_admin { self.cfg.search.admin_factor.max(1) as usize } else { 1 };
		let limit = req.limit as usize;
		let retrieve_cap = strategy.over_fetch(limit, &self.policy).saturating_mul(admin_factor);
		let k = limit.saturating_mul(admin_factor);
		let friend_user = req.requester.user_id.filter(|_| strategy.uses_friends());
		let (candidates, friends) = tokio::try_join!(
			self.planner.search(&spaces, &req.origin, retrieve_cap),
			self.load_friends(friend_user),
		)?;

		tracing::info!(
			strategy = strategy.as_str(),
			candidates = candidates.len(),
			friends = friends.len(),
			retrieve_cap,
			elapsed_ms = started.elapsed().as_millis() as u64,
			"Spatial search finished."
		);

		let hydrate_started = Instant::now();
		let group_ids: Vec<Uuid> = candidates.iter().map(|candidate| candidate.group_id).collect();
		let (groups, logs) = tokio::try_join!(
			self.collaborators.groups.load_many(&group_ids),
			self.load_logs(strategy, &group_ids),
		)?;

		tracing::info!(
			groups = groups.len(),
			logs = logs.len(),
			elapsed_ms = hydrate_started.elapsed().as_millis() as u64,
			"Hydration finished."
		);

		let rank_started = Instant::now();
		let mut scored = Vec::with_capacity(candidates.len());

		for candidate in &candidates {
			let Some(group) = groups.get(&candidate.group_id) else {
				tracing::debug!(group_id = %candidate.group_id, "Candidate missing after hydration.");

				continue;
			};
			let log = logs.get(&candidate.group_id).map(Vec::as_slice).unwrap_or(&[]);
			let input = RankInput { candidate, group, log, friends: &friends, now };

			scored.push(strategy.score(&input, &self.policy));
		}

		let visibility = self.collaborators.visibility.as_ref();
		let requester = &req.requester;
		let top = ranking::select_top(scored, k, |candidate| {
			groups
				.get(&candidate.group_id)
				.is_some_and(|group| is_deliverable(group, requester, visibility))
		});
		let items: Vec<DiscoverItem> = top
			.into_iter()
			.filter_map(|score| {
				groups.get(&score.group_id).map(|group| DiscoverItem { group: group.clone(), score })
			})
			.collect();

		tracing::info!(
			returned = items.len(),
			limit = k,
			rank_elapsed_ms = rank_started.elapsed().as_millis() as u64,
			total_elapsed_ms = started.elapsed().as_millis() as u64,
			"Discover finished."
		);

		Ok(DiscoverResponse { strategy, items })
	}

	fn resolve_spaces(&self, requested: &[String]) -> Result<Vec<String>> {
		let mut spaces: Vec<String> = requested
			.iter()
			.map(|space| space.trim())
			.filter(|space| !space.is_empty())
			.map(str::to_string)
			.collect();

		if spaces.is_empty() {
			spaces = self
				.cfg
				.search
				.default_spaces
				.iter()
				.map(|space| space.trim())
				.filter(|space| !space.is_empty())
				.map(str::to_string)
				.collect();
		}
		if spaces.is_empty() {
			return Err(Error::InvalidRequest {
				message: "At least one space is required.".to_string(),
			});
		}

		spaces.sort();
		spaces.dedup();

		Ok(spaces)
	}

	async fn load_friends(&self, user_id: Option<i64>) -> Result<HashSet<i64>> {
		match user_id {
			Some(user_id) => self.collaborators.friends.friend_ids(user_id).await,
			None => Ok(HashSet::new()),
		}
	}

	async fn load_logs(
		&self,
		strategy: RankingStrategy,
		group_ids: &[Uuid],
	) -> Result<HashMap<Uuid, Vec<ActivityLogEntry>>> {
		if !strategy.uses_activity_log() || group_ids.is_empty() {
			return Ok(HashMap::new());
		}

		self.collaborators.activity.load_many(group_ids).await
	}
}

fn is_deliverable(
	group: &GroupSnapshot,
	requester: &Requester,
	visibility: &dyn VisibilityFilter,
) -> bool {
	if !group.preapproval.is_open() && !requester.supports(ClientFeature::PrivateGroups) {
		return false;
	}

	visibility.is_visible(group, requester)
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;
	use nearby_domain::{CommentRef, Preapproval};

	fn group(owner_id: i64, preapproval: Preapproval) -> GroupSnapshot {
		GroupSnapshot {
			group_id: Uuid::from_u128(9),
			name: "chess".to_string(),
			space_id: "everyone".to_string(),
			owner_id,
			created_at: datetime!(2026-01-01 00:00:00 UTC),
			last_comment_at: datetime!(2026-01-02 00:00:00 UTC),
			member_count: 3,
			active_comment_count: 1,
			preapproval,
			last_significant_comment: Some(CommentRef {
				author_id: 44,
				created_at: datetime!(2026-01-02 00:00:00 UTC),
			}),
		}
	}

	#[test]
	fn blocked_owner_or_commenter_hides_the_group() {
		let filter = BlockedUsers;
		let group = group(10, Preapproval::Anyone);

		assert!(filter.is_visible(&group, &Requester::signed_in(1)));
		assert!(!filter.is_visible(&group, &Requester::signed_in(1).with_blocked([10])));
		assert!(!filter.is_visible(&group, &Requester::signed_in(1).with_blocked([44])));
	}

	#[test]
	fn private_groups_need_client_support() {
		let private = group(10, Preapproval::InviteOnly);
		let legacy = Requester::signed_in(1);
		let modern = Requester::signed_in(1).with_feature(ClientFeature::PrivateGroups);

		assert!(!is_deliverable(&private, &legacy, &BlockedUsers));
		assert!(is_deliverable(&private, &modern, &BlockedUsers));
		assert!(is_deliverable(&group(10, Preapproval::Anyone), &legacy, &BlockedUsers));
	}

	#[test]
	fn request_defaults_fill_in_from_json() {
		let req: DiscoverRequest = serde_json::from_value(serde_json::json!({
			"origin": { "latitude": 1.0, "longitude": 2.0 },
			"limit": 5,
		}))
		.expect("Minimal request must parse.");

		assert_eq!(req.strategy, RankingStrategy::FeedWeighted);
		assert!(req.spaces.is_empty());
		assert!(req.now.is_none());
		assert_eq!(req.requester, Requester::anonymous());
	}
}
