use serde::{Deserialize, Serialize};

use crate::cell::CellId;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_010.0;

/// A location on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
	/// In degrees.
	pub latitude: f64,
	/// In degrees.
	pub longitude: f64,
	/// In meters. `None` when unknown.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub accuracy: Option<f64>,
}
impl Coordinates {
	pub fn new(latitude: f64, longitude: f64) -> Self {
		Self { latitude, longitude, accuracy: None }
	}

	pub fn with_accuracy(self, accuracy: f64) -> Self {
		Self { accuracy: Some(accuracy), ..self }
	}

	pub fn is_valid(&self) -> bool {
		self.latitude.is_finite()
			&& self.longitude.is_finite()
			&& (-90.0..=90.0).contains(&self.latitude)
			&& (-180.0..=180.0).contains(&self.longitude)
			&& self.accuracy.map(|value| value.is_finite() && value >= 0.0).unwrap_or(true)
	}

	/// Great-circle distance in meters.
	pub fn distance_to(&self, other: &Coordinates) -> f64 {
		let lat1 = self.latitude.to_radians();
		let lat2 = other.latitude.to_radians();
		let delta_lat = (other.latitude - self.latitude).to_radians();
		let delta_lng = (other.longitude - self.longitude).to_radians();
		let a = (delta_lat / 2.0).sin().powi(2)
			+ lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
		let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());

		EARTH_RADIUS_METERS * c
	}

	/// Returns the point reached by travelling `distance` meters along the initial `bearing`
	/// (degrees clockwise from north).
	pub fn offset(&self, bearing: f64, distance: f64) -> Coordinates {
		let angular = distance / EARTH_RADIUS_METERS;
		let bearing = bearing.to_radians();
		let lat1 = self.latitude.to_radians();
		let lng1 = self.longitude.to_radians();
		let lat2 =
			(lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
		let lng2 = lng1
			+ (bearing.sin() * angular.sin() * lat1.cos())
				.atan2(angular.cos() - lat1.sin() * lat2.sin());
		let longitude = (lng2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;

		Coordinates::new(lat2.to_degrees(), longitude)
	}

	/// The leaf cell containing this point.
	pub fn to_cell_id(&self) -> CellId {
		CellId::from_coordinates(self)
	}

	/// The centroid of the given cell.
	pub fn from_cell_id(cell: CellId) -> Coordinates {
		cell.centroid()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn distance_between_known_cities() {
		let san_francisco = Coordinates::new(37.7625244, -122.4449224);
		let los_angeles = Coordinates::new(34.0413083, -118.2494922);
		let distance = san_francisco.distance_to(&los_angeles);

		assert!((distance - 559_000.0).abs() < 5_000.0, "Unexpected distance: {distance}");
	}

	#[test]
	fn offset_round_trips_distance() {
		let origin = Coordinates::new(37.7904209, -122.405975);

		for bearing in [0.0, 45.0, 90.0, 180.0, 270.0] {
			let moved = origin.offset(bearing, 12_345.0);
			let distance = origin.distance_to(&moved);

			assert!((distance - 12_345.0).abs() < 0.5, "Bearing {bearing}: {distance}");
		}
	}

	#[test]
	fn offset_wraps_across_antimeridian() {
		let origin = Coordinates::new(0.0, 179.99);
		let moved = origin.offset(90.0, 10_000.0);

		assert!(moved.longitude < -179.0, "Unexpected longitude: {}", moved.longitude);
		assert!(moved.is_valid());
	}

	#[test]
	fn rejects_out_of_range_coordinates() {
		assert!(Coordinates::new(45.0, 90.0).is_valid());
		assert!(!Coordinates::new(91.0, 0.0).is_valid());
		assert!(!Coordinates::new(0.0, -180.5).is_valid());
		assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
		assert!(!Coordinates::new(0.0, 0.0).with_accuracy(-1.0).is_valid());
	}
}
