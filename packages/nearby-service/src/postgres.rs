use std::{
	collections::{HashMap, HashSet},
	sync::Arc,
};

use uuid::Uuid;

use nearby_domain::{ActivityLogEntry, CandidateKey, CellRange, GroupSnapshot};
use nearby_storage::{db::Db, queries};

use crate::{
	ActivityLogStore, BoxFuture, CandidateStore, Collaborators, FriendGraph, GroupHydrator, Result,
};

/// Serves every read collaborator from one Postgres pool.
#[derive(Clone)]
pub struct PostgresCollaborators {
	db: Arc<Db>,
}
impl PostgresCollaborators {
	pub fn new(db: Arc<Db>) -> Self {
		Self { db }
	}

	/// Bundles this store with the default visibility filter.
	pub fn into_collaborators(self) -> Collaborators {
		let shared = Arc::new(self);

		Collaborators::new(shared.clone(), shared.clone(), shared.clone(), shared)
	}
}

impl CandidateStore for PostgresCollaborators {
	fn query_by_cell_range<'a>(
		&'a self,
		spaces: &'a [String],
		range: CellRange,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<CandidateKey>>> {
		Box::pin(async move {
			Ok(queries::select_candidates_in_range(&self.db, spaces, range, limit).await?)
		})
	}
}

impl GroupHydrator for PostgresCollaborators {
	fn load_many<'a>(
		&'a self,
		group_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<HashMap<Uuid, GroupSnapshot>>> {
		Box::pin(async move { Ok(queries::load_groups(&self.db, group_ids).await?) })
	}
}

impl ActivityLogStore for PostgresCollaborators {
	fn load_many<'a>(
		&'a self,
		group_ids: &'a [Uuid],
	) -> BoxFuture<'a, Result<HashMap<Uuid, Vec<ActivityLogEntry>>>> {
		Box::pin(async move { Ok(queries::load_activity_logs(&self.db, group_ids).await?) })
	}
}

impl FriendGraph for PostgresCollaborators {
	fn friend_ids<'a>(&'a self, user_id: i64) -> BoxFuture<'a, Result<HashSet<i64>>> {
		Box::pin(async move { Ok(queries::load_friend_ids(&self.db, user_id).await?) })
	}
}
