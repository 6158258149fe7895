mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Postgres, Ranking, Search, Service, Storage};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	validate_search(&cfg.search)?;
	validate_ranking(&cfg.ranking)?;

	Ok(())
}

pub fn validate_search(search: &Search) -> Result<()> {
	for (path, value) in [
		("search.initial_radius_meters", search.initial_radius_meters),
		("search.radius_multiplier", search.radius_multiplier),
		("search.max_radius_meters", search.max_radius_meters),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{path} must be a finite number.") });
		}
		if value <= 0.0 {
			return Err(Error::Validation {
				message: format!("{path} must be greater than zero."),
			});
		}
	}

	if search.radius_multiplier <= 1.0 {
		return Err(Error::Validation {
			message: "search.radius_multiplier must be greater than 1.0.".to_string(),
		});
	}
	if search.max_radius_meters < search.initial_radius_meters {
		return Err(Error::Validation {
			message: "search.max_radius_meters must be at least search.initial_radius_meters."
				.to_string(),
		});
	}

	for (path, value) in [
		("search.tier_count", search.tier_count),
		("search.initial_tier_limit", search.initial_tier_limit),
		("search.tier_limit", search.tier_limit),
		("search.max_cells", search.max_cells),
		("search.admin_factor", search.admin_factor),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{path} must be greater than zero."),
			});
		}
	}

	if search.query_timeout_ms == Some(0) {
		return Err(Error::Validation {
			message: "search.query_timeout_ms must be greater than zero when set.".to_string(),
		});
	}
	if search.covering_cache_capacity == 0 {
		return Err(Error::Validation {
			message: "search.covering_cache_capacity must be greater than zero.".to_string(),
		});
	}
	if search.default_spaces.is_empty() {
		return Err(Error::Validation {
			message: "search.default_spaces must be non-empty.".to_string(),
		});
	}

	Ok(())
}

pub fn validate_ranking(ranking: &Ranking) -> Result<()> {
	for (path, value) in [
		("ranking.friend_factor", ranking.friend_factor),
		("ranking.event_distance_saturation_meters", ranking.event_distance_saturation_meters),
		("ranking.time_saturation_days", ranking.time_saturation_days),
		("ranking.creation_weight", ranking.creation_weight),
		("ranking.last_comment_weight", ranking.last_comment_weight),
		("ranking.member_scale", ranking.member_scale),
		("ranking.member_max_impact", ranking.member_max_impact),
		("ranking.comment_scale", ranking.comment_scale),
		("ranking.comment_max_impact", ranking.comment_max_impact),
		("ranking.over_fetch_ratio", ranking.over_fetch_ratio),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{path} must be a finite number.") });
		}
		if value < 0.0 {
			return Err(Error::Validation {
				message: format!("{path} must be zero or greater."),
			});
		}
	}

	for (path, value) in [
		("ranking.event_distance_saturation_meters", ranking.event_distance_saturation_meters),
		("ranking.time_saturation_days", ranking.time_saturation_days),
		("ranking.member_scale", ranking.member_scale),
		("ranking.comment_scale", ranking.comment_scale),
	] {
		if value <= 0.0 {
			return Err(Error::Validation {
				message: format!("{path} must be greater than zero."),
			});
		}
	}

	for (path, value) in [
		("ranking.member_max_impact", ranking.member_max_impact),
		("ranking.comment_max_impact", ranking.comment_max_impact),
	] {
		if value > 1.0 {
			return Err(Error::Validation {
				message: format!("{path} must be in the range 0.0-1.0."),
			});
		}
	}

	if ranking.friend_factor < 1.0 {
		return Err(Error::Validation {
			message: "ranking.friend_factor must be 1.0 or greater.".to_string(),
		});
	}
	if ranking.over_fetch_ratio < 1.0 {
		return Err(Error::Validation {
			message: "ranking.over_fetch_ratio must be 1.0 or greater.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.search.default_spaces = cfg
		.search
		.default_spaces
		.iter()
		.map(|space| space.trim())
		.filter(|space| !space.is_empty())
		.map(str::to_string)
		.collect();
}
