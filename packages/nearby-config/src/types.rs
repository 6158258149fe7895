use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub ranking: Ranking,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// Spatial query planning. Tier radii grow geometrically from `initial_radius_meters`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Search {
	pub initial_radius_meters: f64,
	pub radius_multiplier: f64,
	pub tier_count: u32,
	/// Per-tier result limit for the smallest tier. Kept high so dense areas are not cut short.
	pub initial_tier_limit: u32,
	pub tier_limit: u32,
	/// Groups at or beyond this distance are never returned.
	pub max_radius_meters: f64,
	pub max_cells: u32,
	pub query_timeout_ms: Option<u64>,
	pub covering_cache_capacity: usize,
	/// Admins retrieve and receive this many times more groups.
	pub admin_factor: u32,
	pub default_spaces: Vec<String>,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			initial_radius_meters: 2_000.0,
			radius_multiplier: 4.0,
			tier_count: 4,
			initial_tier_limit: 1_000,
			tier_limit: 500,
			max_radius_meters: 128_000.0,
			max_cells: 5,
			query_timeout_ms: None,
			covering_cache_capacity: 4_096,
			admin_factor: 2,
			default_spaces: vec!["everyone".to_string()],
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Ranking {
	/// Multiplier applied to an effect when a friend is involved.
	pub friend_factor: f64,
	/// Events logged this far from the group have no effect.
	pub event_distance_saturation_meters: f64,
	/// Events and comments older than this have no effect.
	pub time_saturation_days: f64,
	pub creation_weight: f64,
	pub last_comment_weight: f64,
	pub member_scale: f64,
	pub member_max_impact: f64,
	pub comment_scale: f64,
	pub comment_max_impact: f64,
	pub over_fetch_ratio: f64,
}
impl Default for Ranking {
	fn default() -> Self {
		Self {
			friend_factor: 2.0,
			event_distance_saturation_meters: 256_000.0,
			time_saturation_days: 30.0,
			creation_weight: 0.25,
			last_comment_weight: 0.2,
			member_scale: 100.0,
			member_max_impact: 0.5,
			comment_scale: 100.0,
			comment_max_impact: 0.5,
			over_fetch_ratio: 1.5,
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}
