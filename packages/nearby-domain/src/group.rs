use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::cell::CellId;

/// The projection returned by a spatial sub-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateKey {
	pub group_id: Uuid,
	pub cell_id: CellId,
}

/// Who may join a group without approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preapproval {
	Anyone,
	FriendsOfMembers,
	InviteOnly,
}
impl Preapproval {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Anyone => "anyone",
			Self::FriendsOfMembers => "friends_of_members",
			Self::InviteOnly => "invite_only",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw.trim() {
			"anyone" => Some(Self::Anyone),
			"friends_of_members" => Some(Self::FriendsOfMembers),
			"invite_only" => Some(Self::InviteOnly),
			_ => None,
		}
	}

	pub fn is_open(self) -> bool {
		matches!(self, Self::Anyone)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRef {
	pub author_id: i64,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}

/// A fully hydrated group, as seen by the ranking stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSnapshot {
	pub group_id: Uuid,
	pub name: String,
	pub space_id: String,
	pub owner_id: i64,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	/// Falls back to `created_at` for groups without comments.
	#[serde(with = "crate::time_serde")]
	pub last_comment_at: OffsetDateTime,
	pub member_count: u32,
	pub active_comment_count: u32,
	pub preapproval: Preapproval,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_significant_comment: Option<CommentRef>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn preapproval_names_round_trip() {
		for value in [Preapproval::Anyone, Preapproval::FriendsOfMembers, Preapproval::InviteOnly] {
			assert_eq!(Preapproval::parse(value.as_str()), Some(value));
		}

		assert_eq!(Preapproval::parse("members"), None);
		assert!(Preapproval::Anyone.is_open());
		assert!(!Preapproval::InviteOnly.is_open());
	}
}
