use time::Duration;

use nearby_config::Ranking;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Ranking weights resolved once from `[ranking]`.
#[derive(Clone, Debug, PartialEq)]
pub struct RankingPolicy {
	pub friend_factor: f64,
	pub event_distance_saturation_meters: f64,
	pub time_saturation: Duration,
	pub creation_weight: f64,
	pub last_comment_weight: f64,
	pub member_scale: f64,
	pub member_max_impact: f64,
	pub comment_scale: f64,
	pub comment_max_impact: f64,
	pub over_fetch_ratio: f64,
}
impl RankingPolicy {
	pub fn from_config(cfg: &Ranking) -> Self {
		Self {
			friend_factor: cfg.friend_factor.max(1.0),
			event_distance_saturation_meters: cfg.event_distance_saturation_meters,
			time_saturation: Duration::saturating_seconds_f64(
				cfg.time_saturation_days * SECONDS_PER_DAY,
			),
			creation_weight: cfg.creation_weight,
			last_comment_weight: cfg.last_comment_weight,
			member_scale: cfg.member_scale,
			member_max_impact: cfg.member_max_impact.clamp(0.0, 1.0),
			comment_scale: cfg.comment_scale,
			comment_max_impact: cfg.comment_max_impact.clamp(0.0, 1.0),
			over_fetch_ratio: cfg.over_fetch_ratio.max(1.0),
		}
	}

	/// Boost applied to effects caused by a friend of the requester.
	pub fn friend_multiplier(&self, is_friend: bool) -> f64 {
		if is_friend { self.friend_factor } else { 1.0 }
	}
}
impl Default for RankingPolicy {
	fn default() -> Self {
		Self::from_config(&Ranking::default())
	}
}
