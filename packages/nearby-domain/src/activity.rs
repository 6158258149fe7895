use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
	Open,
	Comment,
	DeleteComment,
	Join,
	Leave,
	Invite,
}
impl EventType {
	pub const ALL: [EventType; 6] = [
		Self::Open,
		Self::Comment,
		Self::DeleteComment,
		Self::Join,
		Self::Leave,
		Self::Invite,
	];

	/// Signed weight of a single event before friend, distance and age adjustments.
	pub fn base_delta(self) -> f64 {
		match self {
			Self::Open | Self::Comment | Self::Join | Self::Invite => 0.1,
			Self::DeleteComment | Self::Leave => -0.1,
		}
	}

	/// Whether a friend performing this event marks the group as involving friends.
	pub fn signals_friend_involvement(self) -> bool {
		matches!(self, Self::Comment | Self::Join | Self::Invite)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Open => "open",
			Self::Comment => "comment",
			Self::DeleteComment => "delete_comment",
			Self::Join => "join",
			Self::Leave => "leave",
			Self::Invite => "invite",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|event| event.as_str() == raw.trim())
	}
}

/// One recent event on a group. Logs are short, ordered and bounded by the writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
	pub group_id: Uuid,
	pub actor_id: i64,
	pub event_type: EventType,
	#[serde(with = "crate::time_serde")]
	pub occurred_at: OffsetDateTime,
	/// Distance between the actor and the group when the event happened.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub distance_meters: Option<f64>,
}
