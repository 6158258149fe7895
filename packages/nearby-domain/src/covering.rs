use std::{
	collections::VecDeque,
	f64::consts::{FRAC_PI_2, PI},
};

use crate::{
	cell::{self, CellId, MAX_LEVEL},
	coordinates::{Coordinates, EARTH_RADIUS_METERS},
};

const PAD_DEGREES: f64 = 1e-9;
// Absorbs haversine rounding when deciding whether a cell touches the cap.
const SLACK_METERS: f64 = 1e-3;
// An anchor cell may widen a shared covering's radius by at most this share.
const ANCHOR_SHARE: f64 = 1.0 / 16.0;

/// Cells that together contain every point within `radius_meters` of `center`.
///
/// The result is sorted, free of duplicates and holds at most `max_cells` cells. It starts
/// from the finest level whose grid covers the cap's bounding box within the budget, drops the
/// cells that miss the cap, then splits cells straddling the cap's edge for as long as their
/// children still fit. Cells therefore mix levels, and a wider radius never starts from a
/// finer level.
pub fn cover(center: &Coordinates, radius_meters: f64, max_cells: usize) -> Vec<CellId> {
	let max_cells = max_cells.max(1);

	if !radius_meters.is_finite() || radius_meters <= 0.0 {
		return vec![center.to_cell_id()];
	}

	let angular = radius_meters / EARTH_RADIUS_METERS;

	if angular >= PI {
		return vec![CellId::ROOT];
	}

	let bounds = CapBounds::new(center, angular);
	let mut level = 0;

	for candidate in 1..=MAX_LEVEL {
		if bounds.cell_count(candidate) > max_cells {
			break;
		}

		level = candidate;
	}

	let cap = Cap { center: *center, radius_meters };
	let touching = bounds.cells(level).into_iter().filter(|cell| cap.touches(*cell)).collect();
	let mut cells = cap.refine(touching, max_cells);

	cells.sort_unstable();
	cells.dedup();

	cells
}

/// The coarsest ancestor of `center`'s leaf whose every point lies within
/// `radius_meters / 16` of its centroid. Centers sharing an anchor can share one covering.
pub fn anchor(center: &Coordinates, radius_meters: f64) -> CellId {
	let leaf = center.to_cell_id();

	if !radius_meters.is_finite() || radius_meters <= 0.0 {
		return leaf;
	}

	let reach = radius_meters * ANCHOR_SHARE;

	(1..MAX_LEVEL)
		.map(|level| leaf.parent(level))
		.find(|cell| CellRect::of(*cell).reach() <= reach)
		.unwrap_or(leaf)
}

/// A covering of `radius_meters` around every point of `anchor`.
///
/// It covers the cap around the anchor's centroid, widened by the distance from the centroid
/// to the anchor's farthest corner.
pub fn cover_anchor(anchor: CellId, radius_meters: f64, max_cells: usize) -> Vec<CellId> {
	if !radius_meters.is_finite() || radius_meters <= 0.0 {
		return vec![anchor];
	}

	let rect = CellRect::of(anchor);

	cover(&anchor.centroid(), radius_meters + rect.reach() + SLACK_METERS, max_cells)
}

#[derive(Debug, Clone, Copy)]
struct Cap {
	center: Coordinates,
	radius_meters: f64,
}
impl Cap {
	fn touches(&self, cell: CellId) -> bool {
		CellRect::of(cell).min_distance(&self.center) <= self.radius_meters + SLACK_METERS
	}

	fn inside(&self, cell: CellId) -> bool {
		CellRect::of(cell).max_distance(&self.center) <= self.radius_meters
	}

	// Coarsest cells are considered first. A split happens only when the children that still
	// touch the cap fit in the budget; otherwise the cell is kept whole.
	fn refine(&self, cells: Vec<CellId>, max_cells: usize) -> Vec<CellId> {
		let mut pending: VecDeque<CellId> = cells.into();
		let mut settled = Vec::with_capacity(max_cells);

		while let Some(cell) = pending.pop_front() {
			if cell.is_leaf() || self.inside(cell) {
				settled.push(cell);

				continue;
			}

			let children: Vec<CellId> =
				cell.children().into_iter().filter(|child| self.touches(*child)).collect();

			if settled.len() + pending.len() + children.len() > max_cells {
				settled.push(cell);
			} else {
				pending.extend(children);
			}
		}

		settled
	}
}

/// Latitude and longitude bounds of a cell, in degrees.
#[derive(Debug, Clone, Copy)]
struct CellRect {
	lat_lo: f64,
	lat_hi: f64,
	lng_lo: f64,
	lng_hi: f64,
}
impl CellRect {
	fn of(cell: CellId) -> Self {
		let size = (1_u64 << cell.level()) as f64;
		let (column, row) = cell.level_ij();
		let lng_lo = column as f64 / size * 360.0 - 180.0;
		let lat_lo = row as f64 / size * 180.0 - 90.0;

		Self { lat_lo, lat_hi: lat_lo + 180.0 / size, lng_lo, lng_hi: lng_lo + 360.0 / size }
	}

	fn corners(&self) -> [Coordinates; 4] {
		[
			Coordinates::new(self.lat_lo, self.lng_lo),
			Coordinates::new(self.lat_lo, self.lng_hi),
			Coordinates::new(self.lat_hi, self.lng_lo),
			Coordinates::new(self.lat_hi, self.lng_hi),
		]
	}

	// Farthest distance from the centroid to any point of the cell.
	fn reach(&self) -> f64 {
		let centroid = Coordinates::new(
			(self.lat_lo + self.lat_hi) / 2.0,
			(self.lng_lo + self.lng_hi) / 2.0,
		);

		self.corners().iter().map(|corner| centroid.distance_to(corner)).fold(0.0, f64::max)
	}

	fn contains_longitude(&self, longitude: f64) -> bool {
		let offset = (longitude - self.lng_lo).rem_euclid(360.0);

		offset <= self.lng_hi - self.lng_lo
	}

	// Inside the longitude span the nearest point shares the meridian of `point`. Outside it,
	// the nearest point lies on the closer bounding meridian.
	fn min_distance(&self, point: &Coordinates) -> f64 {
		if self.contains_longitude(point.longitude) {
			let latitude = point.latitude.clamp(self.lat_lo, self.lat_hi);

			return point.distance_to(&Coordinates::new(latitude, point.longitude));
		}

		let west = wrap_degrees(point.longitude - self.lng_lo).abs();
		let east = wrap_degrees(point.longitude - self.lng_hi).abs();
		let (edge, delta) = if west <= east { (self.lng_lo, west) } else { (self.lng_hi, east) };
		let lat = point.latitude.to_radians();
		let foot = lat.sin().atan2(lat.cos() * delta.to_radians().cos()).to_degrees();
		let latitude = foot.clamp(-90.0, 90.0).clamp(self.lat_lo, self.lat_hi);

		point.distance_to(&Coordinates::new(latitude, edge))
	}

	// Exact for cells that do not reach the meridian opposite `point`.
	fn max_distance(&self, point: &Coordinates) -> f64 {
		if self.contains_longitude(point.longitude + 180.0) {
			return PI * EARTH_RADIUS_METERS;
		}

		self.corners().iter().map(|corner| point.distance_to(corner)).fold(0.0, f64::max)
	}
}

fn wrap_degrees(degrees: f64) -> f64 {
	(degrees + 180.0).rem_euclid(360.0) - 180.0
}

#[derive(Debug, Clone, Copy)]
struct CapBounds {
	lat_lo: f64,
	lat_hi: f64,
	// `None` spans every longitude.
	lng: Option<(f64, f64)>,
}
impl CapBounds {
	fn new(center: &Coordinates, angular: f64) -> Self {
		let lat = center.latitude.to_radians();
		let lat_lo = lat - angular;
		let lat_hi = lat + angular;
		let lng = if lat_lo <= -FRAC_PI_2 || lat_hi >= FRAC_PI_2 {
			None
		} else {
			let ratio = (angular.sin() / lat.cos()).min(1.0);
			let span = ratio.asin().to_degrees() + PAD_DEGREES;

			if span >= 180.0 {
				None
			} else {
				Some((center.longitude - span, center.longitude + span))
			}
		};

		Self {
			lat_lo: (lat_lo.to_degrees() - PAD_DEGREES).max(-90.0),
			lat_hi: (lat_hi.to_degrees() + PAD_DEGREES).min(90.0),
			lng,
		}
	}

	fn rows(&self, size: u64) -> (u64, u64) {
		(cell::row_index(self.lat_lo, size), cell::row_index(self.lat_hi, size))
	}

	// Unwrapped column bounds; `hi - lo + 1` may exceed `size` only when the span is full.
	fn columns(&self, size: u64) -> (i64, i64) {
		match self.lng {
			None => (0, size as i64 - 1),
			Some((lo, hi)) => {
				let scale = size as f64 / 360.0;
				let lo = ((lo + 180.0) * scale).floor() as i64;
				let hi = ((hi + 180.0) * scale).floor() as i64;

				if hi - lo + 1 >= size as i64 { (0, size as i64 - 1) } else { (lo, hi) }
			},
		}
	}

	fn cell_count(&self, level: u8) -> usize {
		let size = 1_u64 << level;
		let (row_lo, row_hi) = self.rows(size);
		let (col_lo, col_hi) = self.columns(size);
		let rows = (row_hi - row_lo + 1) as usize;
		let columns = (col_hi - col_lo + 1) as usize;

		rows.saturating_mul(columns)
	}

	fn cells(&self, level: u8) -> Vec<CellId> {
		if level == 0 {
			return vec![CellId::ROOT];
		}

		let size = 1_u64 << level;
		let (row_lo, row_hi) = self.rows(size);
		let (col_lo, col_hi) = self.columns(size);
		let mut cells = Vec::new();

		for row in row_lo..=row_hi {
			for column in col_lo..=col_hi {
				let column = column.rem_euclid(size as i64) as u64;

				cells.push(CellId::from_level_ij(level, column, row));
			}
		}

		cells.sort_unstable();
		cells.dedup();

		cells
	}
}
