use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use nearby_domain::{ActivityLogEntry, CandidateKey, CellRange, GroupSnapshot};

use crate::{
	Error, Result,
	db::Db,
	models::{ActivityRow, CandidateRow, GroupRow, NewGroup},
};

/// Discoverable, live groups in `spaces` whose cell falls inside `range`, capped at `limit`.
pub async fn select_candidates_in_range(
	db: &Db,
	spaces: &[String],
	range: CellRange,
	limit: u32,
) -> Result<Vec<CandidateKey>> {
	let rows: Vec<CandidateRow> = sqlx::query_as(
		"\
SELECT group_id, cell_id
FROM groups
WHERE space_id = ANY($1)
	AND discoverable
	AND NOT deleted
	AND cell_id BETWEEN $2 AND $3
ORDER BY cell_id, group_id
LIMIT $4",
	)
	.bind(spaces)
	.bind(range.min.to_i64())
	.bind(range.max.to_i64())
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	rows.into_iter().map(CandidateRow::into_key).collect()
}

pub async fn load_groups(db: &Db, group_ids: &[Uuid]) -> Result<HashMap<Uuid, GroupSnapshot>> {
	if group_ids.is_empty() {
		return Ok(HashMap::new());
	}

	let rows: Vec<GroupRow> = sqlx::query_as(
		"\
SELECT
	group_id,
	name,
	space_id,
	owner_id,
	preapproval,
	member_count,
	active_comment_count,
	created_at,
	last_comment_at,
	last_significant_comment_author_id,
	last_significant_comment_at
FROM groups
WHERE group_id = ANY($1)",
	)
	.bind(group_ids)
	.fetch_all(&db.pool)
	.await?;
	let mut out = HashMap::with_capacity(rows.len());

	for row in rows {
		let snapshot = row.into_snapshot()?;

		out.insert(snapshot.group_id, snapshot);
	}

	Ok(out)
}

/// Activity logs keyed by group, newest entry first.
pub async fn load_activity_logs(
	db: &Db,
	group_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<ActivityLogEntry>>> {
	if group_ids.is_empty() {
		return Ok(HashMap::new());
	}

	let rows: Vec<ActivityRow> = sqlx::query_as(
		"\
SELECT group_id, actor_id, event_type, occurred_at, distance_meters
FROM group_activity_log
WHERE group_id = ANY($1)
ORDER BY group_id, occurred_at DESC, entry_id",
	)
	.bind(group_ids)
	.fetch_all(&db.pool)
	.await?;
	let mut out: HashMap<Uuid, Vec<ActivityLogEntry>> = HashMap::new();

	for row in rows {
		let entry = row.into_entry()?;

		out.entry(entry.group_id).or_default().push(entry);
	}

	Ok(out)
}

pub async fn load_friend_ids(db: &Db, user_id: i64) -> Result<HashSet<i64>> {
	let ids: Vec<i64> =
		sqlx::query_scalar("SELECT friend_id FROM friendships WHERE user_id = $1")
			.bind(user_id)
			.fetch_all(&db.pool)
			.await?;

	Ok(ids.into_iter().collect())
}

pub async fn insert_group(db: &Db, group: &NewGroup) -> Result<()> {
	if !group.location.is_valid() {
		return Err(Error::InvalidArgument(format!(
			"Group {} has an invalid location.",
			group.group_id
		)));
	}

	let cell_id = group.location.to_cell_id();
	let (comment_author, comment_at) = match group.last_significant_comment {
		Some(comment) => (Some(comment.author_id), Some(comment.created_at)),
		None => (None, None),
	};

	sqlx::query(
		"\
INSERT INTO groups (
	group_id,
	name,
	space_id,
	owner_id,
	latitude,
	longitude,
	cell_id,
	discoverable,
	deleted,
	preapproval,
	member_count,
	active_comment_count,
	created_at,
	last_comment_at,
	last_significant_comment_author_id,
	last_significant_comment_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
	)
	.bind(group.group_id)
	.bind(group.name.as_str())
	.bind(group.space_id.as_str())
	.bind(group.owner_id)
	.bind(group.location.latitude)
	.bind(group.location.longitude)
	.bind(cell_id.to_i64())
	.bind(group.discoverable)
	.bind(group.deleted)
	.bind(group.preapproval.as_str())
	.bind(count_to_i32(group.member_count)?)
	.bind(count_to_i32(group.active_comment_count)?)
	.bind(group.created_at)
	.bind(group.last_comment_at)
	.bind(comment_author)
	.bind(comment_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn insert_activity(db: &Db, entry: &ActivityLogEntry) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO group_activity_log (
	entry_id,
	group_id,
	actor_id,
	event_type,
	occurred_at,
	distance_meters
)
VALUES ($1, $2, $3, $4, $5, $6)",
	)
	.bind(Uuid::new_v4())
	.bind(entry.group_id)
	.bind(entry.actor_id)
	.bind(entry.event_type.as_str())
	.bind(entry.occurred_at)
	.bind(entry.distance_meters)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Records a mutual friendship.
pub async fn insert_friendship(db: &Db, user_id: i64, friend_id: i64) -> Result<()> {
	if user_id == friend_id {
		return Err(Error::InvalidArgument("A user cannot befriend themselves.".to_string()));
	}

	let mut tx = db.pool.begin().await?;

	for (left, right) in [(user_id, friend_id), (friend_id, user_id)] {
		sqlx::query(
			"\
INSERT INTO friendships (user_id, friend_id)
VALUES ($1, $2)
ON CONFLICT (user_id, friend_id) DO NOTHING",
		)
		.bind(left)
		.bind(right)
		.execute(&mut *tx)
		.await?;
	}

	tx.commit().await?;

	Ok(())
}

fn count_to_i32(value: u32) -> Result<i32> {
	i32::try_from(value)
		.map_err(|_| Error::InvalidArgument(format!("Count {value} does not fit the schema.")))
}
