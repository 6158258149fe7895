use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use nearby_domain::{ActivityLogEntry, GroupSnapshot, curves};

use super::policy::RankingPolicy;
use crate::search::NearbyCandidate;

/// Named factors of a weighted score. Each factor is positive; lower values rank a group as
/// if it were closer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
	pub log: f64,
	pub creation: f64,
	pub member: f64,
	pub comment: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_comment: Option<f64>,
	pub combined: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
	pub group_id: Uuid,
	pub distance_meters: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub breakdown: Option<ScoreBreakdown>,
	/// Ascending order is most relevant first.
	pub ranking: f64,
	pub involves_friends: bool,
}

/// Everything a strategy needs to score one candidate.
#[derive(Debug, Clone, Copy)]
pub struct RankInput<'a> {
	pub candidate: &'a NearbyCandidate,
	pub group: &'a GroupSnapshot,
	/// Empty when the strategy does not use activity logs or the group has none.
	pub log: &'a [ActivityLogEntry],
	pub friends: &'a HashSet<i64>,
	pub now: OffsetDateTime,
}

#[derive(Debug, Clone, Copy)]
struct Factor {
	value: f64,
	involves_friends: bool,
}

pub(crate) fn score_by_recency(input: &RankInput<'_>) -> ScoredCandidate {
	let millis = input.group.last_comment_at.unix_timestamp_nanos() / 1_000_000;

	ScoredCandidate {
		group_id: input.candidate.group_id,
		distance_meters: input.candidate.distance_meters,
		breakdown: None,
		ranking: -(millis as f64),
		involves_friends: false,
	}
}

pub(crate) fn score_weighted(
	input: &RankInput<'_>,
	policy: &RankingPolicy,
	with_last_comment: bool,
) -> ScoredCandidate {
	let log = log_factor(input, policy);
	let creation = creation_factor(input, policy);
	let member = curves::demote(
		f64::from(input.group.member_count),
		policy.member_scale,
		policy.member_max_impact,
	);
	let comment = curves::demote(
		f64::from(input.group.active_comment_count),
		policy.comment_scale,
		policy.comment_max_impact,
	);
	let last_comment = if with_last_comment { last_comment_factor(input, policy) } else { None };
	let combined = curves::floor_factor(
		log.value
			* creation.value
			* member
			* comment
			* last_comment.map(|factor| factor.value).unwrap_or(1.0),
	);

	ScoredCandidate {
		group_id: input.candidate.group_id,
		distance_meters: input.candidate.distance_meters,
		breakdown: Some(ScoreBreakdown {
			log: log.value,
			creation: creation.value,
			member,
			comment,
			last_comment: last_comment.map(|factor| factor.value),
			combined,
		}),
		ranking: combined * input.candidate.distance_meters,
		involves_friends: log.involves_friends
			|| creation.involves_friends
			|| last_comment.is_some_and(|factor| factor.involves_friends),
	}
}

// Compounds every logged event. Positive events shrink the factor, negative ones grow it.
fn log_factor(input: &RankInput<'_>, policy: &RankingPolicy) -> Factor {
	let mut value = 1.0;
	let mut involves_friends = false;

	for entry in input.log {
		let is_friend = input.friends.contains(&entry.actor_id);

		if is_friend && entry.event_type.signals_friend_involvement() {
			involves_friends = true;
		}

		let mut delta = entry.event_type.base_delta() * policy.friend_multiplier(is_friend);

		if let Some(distance) = entry.distance_meters {
			delta *= curves::distance_decay(distance, policy.event_distance_saturation_meters);
		}

		delta *= curves::time_decay(entry.occurred_at, input.now, policy.time_saturation);
		value *= curves::floor_factor(1.0 - delta.min(1.0));
	}

	Factor { value: curves::floor_factor(value), involves_friends }
}

fn creation_factor(input: &RankInput<'_>, policy: &RankingPolicy) -> Factor {
	let owner_is_friend = input.friends.contains(&input.group.owner_id);
	let effect = curves::time_decay(input.group.created_at, input.now, policy.time_saturation)
		* policy.creation_weight
		* policy.friend_multiplier(owner_is_friend);

	Factor {
		value: curves::floor_factor(1.0 - effect.min(1.0)),
		involves_friends: owner_is_friend,
	}
}

fn last_comment_factor(input: &RankInput<'_>, policy: &RankingPolicy) -> Option<Factor> {
	let comment = input.group.last_significant_comment?;
	let author_is_friend = input.friends.contains(&comment.author_id);
	let effect = curves::time_decay(comment.created_at, input.now, policy.time_saturation)
		* policy.last_comment_weight
		* policy.friend_multiplier(author_is_friend);

	Some(Factor {
		value: curves::floor_factor(1.0 - effect.min(1.0)),
		involves_friends: author_is_friend,
	})
}
