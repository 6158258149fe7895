pub mod discover;
pub mod postgres;
pub mod ranking;
pub mod search;

mod error;

pub use discover::{
	BlockedUsers, ClientFeature, DiscoverItem, DiscoverRequest, DiscoverResponse, Requester,
};
pub use error::{Error, Result};
pub use ranking::{RankingPolicy, RankingStrategy, ScoreBreakdown, ScoredCandidate};
pub use search::{NearbyCandidate, ProximitySearchPlanner, Tier};

use std::{
	collections::{HashMap, HashSet},
	future::Future,
	pin::Pin,
	sync::Arc,
};

use uuid::Uuid;

use nearby_config::Config;
use nearby_domain::{ActivityLogEntry, CandidateKey, CellRange, GroupSnapshot};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Spatial index lookups. Implementations filter on space membership, discoverability,
/// deletion and the cell id range, returning at most `limit` keys.
pub trait CandidateStore
where
	Self: Send + Sync,
{
	fn query_by_cell_range<'a>(
		&'a self,
		spaces: &'a [String],
		range: CellRange,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<CandidateKey>>>;
}

pub trait GroupHydrator
where
	Self: Send + Sync,
{
	/// Ids without a stored group are left out of the map.
	fn load_many<'a>(
		&'a self,
		group_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<HashMap<Uuid, GroupSnapshot>>>;
}

pub trait ActivityLogStore
where
	Self: Send + Sync,
{
	fn load_many<'a>(
		&'a self,
		group_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<HashMap<Uuid, Vec<ActivityLogEntry>>>>;
}

pub trait FriendGraph
where
	Self: Send + Sync,
{
	fn friend_ids<'a>(&'a self, user_id: i64) -> BoxFuture<'a, Result<HashSet<i64>>>;
}

/// Access decision applied after scoring. Must be cheap; it runs once per scored candidate.
pub trait VisibilityFilter
where
	Self: Send + Sync,
{
	fn is_visible(&self, group: &GroupSnapshot, requester: &Requester) -> bool;
}

#[derive(Clone)]
pub struct Collaborators {
	pub candidates: Arc<dyn CandidateStore>,
	pub groups: Arc<dyn GroupHydrator>,
	pub activity: Arc<dyn ActivityLogStore>,
	pub friends: Arc<dyn FriendGraph>,
	pub visibility: Arc<dyn VisibilityFilter>,
}
impl Collaborators {
	pub fn new(
		candidates: Arc<dyn CandidateStore>,
		groups: Arc<dyn GroupHydrator>,
		activity: Arc<dyn ActivityLogStore>,
		friends: Arc<dyn FriendGraph>,
	) -> Self {
		Self { candidates, groups, activity, friends, visibility: Arc::new(BlockedUsers) }
	}

	pub fn with_visibility(self, visibility: Arc<dyn VisibilityFilter>) -> Self {
		Self { visibility, ..self }
	}
}

pub struct NearbyService {
	pub cfg: Config,
	pub planner: ProximitySearchPlanner,
	pub policy: RankingPolicy,
	pub collaborators: Collaborators,
}
impl NearbyService {
	pub fn new(cfg: Config, collaborators: Collaborators) -> Self {
		let planner =
			ProximitySearchPlanner::new(cfg.search.clone(), collaborators.candidates.clone());
		let policy = RankingPolicy::from_config(&cfg.ranking);

		Self { cfg, planner, policy, collaborators }
	}
}
