use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use nearby_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let table = root
		.as_table_mut()
		.expect("Template config must be a table.")
		.get_mut(section)
		.and_then(Value::as_table_mut)
		.expect("Template config must include the requested section.");

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("nearby_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_payload(payload: String) -> nearby_config::Result<Config> {
	let path = write_temp_config(payload);
	let result = nearby_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

#[test]
fn sample_config_loads() {
	let cfg = load_payload(SAMPLE_CONFIG_TEMPLATE_TOML.to_string())
		.expect("Sample config must be valid.");

	assert_eq!(cfg.search.tier_count, 4);
	assert_eq!(cfg.search.query_timeout_ms, Some(5_000));
	assert_eq!(cfg.ranking.friend_factor, 2.0);
	assert_eq!(cfg.search.default_spaces, vec!["everyone".to_string()]);
}

#[test]
fn search_and_ranking_sections_are_optional() {
	let payload = "\
[service]
log_level = \"debug\"

[storage.postgres]
dsn = \"postgres://localhost/nearby\"
pool_max_conns = 2
";
	let cfg = load_payload(payload.to_string()).expect("Minimal config must be valid.");

	assert_eq!(cfg.search.initial_radius_meters, 2_000.0);
	assert_eq!(cfg.search.max_radius_meters, 128_000.0);
	assert_eq!(cfg.search.max_cells, 5);
	assert_eq!(cfg.ranking.over_fetch_ratio, 1.5);
	assert!(cfg.search.query_timeout_ms.is_none());
}

#[test]
fn radius_multiplier_must_widen_tiers() {
	let err = load_payload(sample_toml_with("search", "radius_multiplier", Value::Float(1.0)))
		.expect_err("Expected radius multiplier validation error.");

	assert!(
		err.to_string().contains("search.radius_multiplier must be greater than 1.0."),
		"Unexpected error: {err}"
	);
}

#[test]
fn tier_count_must_be_positive() {
	let err = load_payload(sample_toml_with("search", "tier_count", Value::Integer(0)))
		.expect_err("Expected tier count validation error.");

	assert!(
		err.to_string().contains("search.tier_count must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn max_radius_must_cover_first_tier() {
	let err = load_payload(sample_toml_with("search", "max_radius_meters", Value::Float(500.0)))
		.expect_err("Expected max radius validation error.");

	assert!(
		err.to_string()
			.contains("search.max_radius_meters must be at least search.initial_radius_meters."),
		"Unexpected error: {err}"
	);
}

#[test]
fn max_impact_must_be_a_fraction() {
	let err = load_payload(sample_toml_with("ranking", "member_max_impact", Value::Float(1.5)))
		.expect_err("Expected max impact validation error.");

	assert!(
		err.to_string().contains("ranking.member_max_impact must be in the range 0.0-1.0."),
		"Unexpected error: {err}"
	);
}

#[test]
fn friend_factor_cannot_demote_friends() {
	let err = load_payload(sample_toml_with("ranking", "friend_factor", Value::Float(0.5)))
		.expect_err("Expected friend factor validation error.");

	assert!(
		err.to_string().contains("ranking.friend_factor must be 1.0 or greater."),
		"Unexpected error: {err}"
	);
}

#[test]
fn blank_default_spaces_are_dropped() {
	let spaces = Value::Array(vec![
		Value::String(" everyone ".to_string()),
		Value::String("   ".to_string()),
		Value::String("women_only".to_string()),
	]);
	let cfg = load_payload(sample_toml_with("search", "default_spaces", spaces))
		.expect("Config with padded spaces must be valid.");

	assert_eq!(cfg.search.default_spaces, vec!["everyone".to_string(), "women_only".to_string()]);
}

#[test]
fn only_blank_default_spaces_are_rejected() {
	let spaces = Value::Array(vec![Value::String(" ".to_string())]);
	let err = load_payload(sample_toml_with("search", "default_spaces", spaces))
		.expect_err("Expected default spaces validation error.");

	assert!(
		err.to_string().contains("search.default_spaces must be non-empty."),
		"Unexpected error: {err}"
	);
}

#[test]
fn missing_file_reports_read_error() {
	let mut path = env::temp_dir();

	path.push("nearby_config_test_missing.toml");

	let err = nearby_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error: {err}");
}
