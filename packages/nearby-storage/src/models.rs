use time::OffsetDateTime;
use uuid::Uuid;

use nearby_domain::{
	ActivityLogEntry, CandidateKey, CellId, CommentRef, Coordinates, EventType, GroupSnapshot,
	Preapproval,
};

use crate::{Error, Result};

#[derive(Debug, sqlx::FromRow)]
pub struct CandidateRow {
	pub group_id: Uuid,
	pub cell_id: i64,
}
impl CandidateRow {
	pub fn into_key(self) -> Result<CandidateKey> {
		let cell_id = CellId::from_i64(self.cell_id).ok_or_else(|| {
			Error::InvalidData(format!(
				"Group {} has malformed cell_id {}.",
				self.group_id, self.cell_id
			))
		})?;

		Ok(CandidateKey { group_id: self.group_id, cell_id })
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct GroupRow {
	pub group_id: Uuid,
	pub name: String,
	pub space_id: String,
	pub owner_id: i64,
	pub preapproval: String,
	pub member_count: i32,
	pub active_comment_count: i32,
	pub created_at: OffsetDateTime,
	pub last_comment_at: Option<OffsetDateTime>,
	pub last_significant_comment_author_id: Option<i64>,
	pub last_significant_comment_at: Option<OffsetDateTime>,
}
impl GroupRow {
	pub fn into_snapshot(self) -> Result<GroupSnapshot> {
		let preapproval = Preapproval::parse(&self.preapproval).ok_or_else(|| {
			Error::InvalidData(format!(
				"Group {} has unknown preapproval {:?}.",
				self.group_id, self.preapproval
			))
		})?;
		let member_count = u32::try_from(self.member_count).map_err(|_| {
			Error::InvalidData(format!("Group {} has a negative member_count.", self.group_id))
		})?;
		let active_comment_count = u32::try_from(self.active_comment_count).map_err(|_| {
			Error::InvalidData(format!(
				"Group {} has a negative active_comment_count.",
				self.group_id
			))
		})?;
		let last_significant_comment =
			match (self.last_significant_comment_author_id, self.last_significant_comment_at) {
				(Some(author_id), Some(created_at)) => Some(CommentRef { author_id, created_at }),
				_ => None,
			};

		Ok(GroupSnapshot {
			group_id: self.group_id,
			name: self.name,
			space_id: self.space_id,
			owner_id: self.owner_id,
			created_at: self.created_at,
			last_comment_at: self.last_comment_at.unwrap_or(self.created_at),
			member_count,
			active_comment_count,
			preapproval,
			last_significant_comment,
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct ActivityRow {
	pub group_id: Uuid,
	pub actor_id: i64,
	pub event_type: String,
	pub occurred_at: OffsetDateTime,
	pub distance_meters: Option<f64>,
}
impl ActivityRow {
	pub fn into_entry(self) -> Result<ActivityLogEntry> {
		let event_type = EventType::parse(&self.event_type).ok_or_else(|| {
			Error::InvalidData(format!(
				"Group {} has unknown activity event {:?}.",
				self.group_id, self.event_type
			))
		})?;

		Ok(ActivityLogEntry {
			group_id: self.group_id,
			actor_id: self.actor_id,
			event_type,
			occurred_at: self.occurred_at,
			distance_meters: self.distance_meters,
		})
	}
}

/// A group row to insert. The cell id is derived from `location`.
#[derive(Debug, Clone)]
pub struct NewGroup {
	pub group_id: Uuid,
	pub name: String,
	pub space_id: String,
	pub owner_id: i64,
	pub location: Coordinates,
	pub discoverable: bool,
	pub deleted: bool,
	pub preapproval: Preapproval,
	pub member_count: u32,
	pub active_comment_count: u32,
	pub created_at: OffsetDateTime,
	pub last_comment_at: Option<OffsetDateTime>,
	pub last_significant_comment: Option<CommentRef>,
}
