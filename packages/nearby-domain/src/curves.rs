//! Decay curves shared by every ranking factor. All outputs lie in `[MIN_FACTOR, 1]`.

use time::{Duration, OffsetDateTime};

/// Floor applied to every factor so products never collapse to zero.
pub const MIN_FACTOR: f64 = 1e-9;

const STEEPNESS: f64 = 10.0;
const MIDPOINT: f64 = 0.5;

fn logistic(x: f64) -> f64 {
	1.0 / (1.0 + (STEEPNESS * (x - MIDPOINT)).exp())
}

/// Smooth step from 1 at `x = 0` down to 0 at `x = 1`.
pub fn sigmoidal(x: f64) -> f64 {
	let x = if x.is_nan() { 1.0 } else { x.clamp(0.0, 1.0) };
	let top = logistic(0.0);
	let bottom = logistic(1.0);
	let value = (logistic(x) - bottom) / (top - bottom);

	clamp_factor(value)
}

pub fn exponential(x: f64) -> f64 {
	let x = if x.is_nan() { 0.0 } else { x.max(0.0) };

	clamp_factor((-x).exp())
}

/// Freshness of `timestamp` relative to `now`; future timestamps count as brand new.
pub fn time_decay(timestamp: OffsetDateTime, now: OffsetDateTime, saturation: Duration) -> f64 {
	let age = (now - timestamp).max(Duration::ZERO);
	let saturation = saturation.as_seconds_f64();

	if saturation <= 0.0 {
		return MIN_FACTOR;
	}

	sigmoidal(age.as_seconds_f64() / saturation)
}

pub fn distance_decay(distance_meters: f64, saturation_meters: f64) -> f64 {
	if saturation_meters <= 0.0 {
		return MIN_FACTOR;
	}

	sigmoidal(distance_meters / saturation_meters)
}

/// Dampens large counts: 1 at zero, approaching `1 - max_impact` as `value` grows.
pub fn demote(value: f64, scale: f64, max_impact: f64) -> f64 {
	let max_impact = max_impact.clamp(0.0, 1.0);
	let ratio = if scale > 0.0 { value / scale } else { f64::INFINITY };

	clamp_factor(exponential(ratio) * max_impact + (1.0 - max_impact))
}

/// Keeps a factor strictly positive.
pub fn floor_factor(value: f64) -> f64 {
	if value.is_nan() { MIN_FACTOR } else { value.max(MIN_FACTOR) }
}

fn clamp_factor(value: f64) -> f64 {
	floor_factor(value).min(1.0)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sigmoidal_endpoints() {
		assert_eq!(sigmoidal(0.0), 1.0);
		assert!(sigmoidal(1.0) <= 1e-6);
		assert!(sigmoidal(1.0) > 0.0);
		assert!((sigmoidal(0.5) - 0.5).abs() < 1e-9);
	}

	#[test]
	fn sigmoidal_is_monotone_and_clamped() {
		let mut previous = sigmoidal(-3.0);

		assert_eq!(previous, 1.0);

		for step in 1..=120 {
			let value = sigmoidal(f64::from(step) / 100.0);

			assert!(value <= previous, "Not monotone at step {step}.");
			assert!(value > 0.0);

			previous = value;
		}

		assert_eq!(sigmoidal(7.0), sigmoidal(1.0));
	}

	#[test]
	fn exponential_is_bounded() {
		assert_eq!(exponential(0.0), 1.0);
		assert_eq!(exponential(-2.0), 1.0);
		assert!((exponential(1.0) - (-1.0_f64).exp()).abs() < 1e-12);
		assert_eq!(exponential(1e6), MIN_FACTOR);
	}

	#[test]
	fn demote_spans_its_impact() {
		assert_eq!(demote(0.0, 100.0, 0.5), 1.0);
		assert!((demote(1e9, 100.0, 0.5) - 0.5).abs() < 1e-6);
		assert_eq!(demote(50.0, 100.0, 0.0), 1.0);

		let mid = demote(100.0, 100.0, 0.5);

		assert!((mid - ((-1.0_f64).exp() * 0.5 + 0.5)).abs() < 1e-12);
	}

	#[test]
	fn time_decay_treats_future_as_fresh() {
		let now = OffsetDateTime::UNIX_EPOCH + Duration::days(1_000);
		let month = Duration::days(30);

		assert_eq!(time_decay(now + Duration::hours(1), now, month), 1.0);
		assert!((time_decay(now - Duration::days(15), now, month) - 0.5).abs() < 1e-9);
		assert!(time_decay(now - Duration::days(90), now, month) <= 1e-6);
	}
}
