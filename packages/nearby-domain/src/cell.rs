//! Hierarchical quadtree cells over the latitude/longitude plane.
//!
//! A leaf position is the Z-order interleaving of a 30-bit column index (longitude) and a
//! 30-bit row index (latitude). The id stores that position shifted left by one with a marker
//! bit below the last meaningful position bit, so every descendant of a cell falls inside a
//! single contiguous id range.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coordinates::Coordinates;

pub const MAX_LEVEL: u8 = 30;

const GRID_SIZE: u64 = 1 << MAX_LEVEL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(u64);
impl CellId {
	/// The whole globe.
	pub const ROOT: CellId = CellId(1 << (2 * MAX_LEVEL as u32));

	/// The leaf cell containing `point`. Out-of-range latitudes are clamped and longitudes wrap.
	pub fn from_coordinates(point: &Coordinates) -> Self {
		let column = column_index(point.longitude, GRID_SIZE);
		let row = row_index(point.latitude, GRID_SIZE);

		Self::from_level_ij(MAX_LEVEL, column, row)
	}

	/// The cell at `level` with the given column and row indices in that level's grid.
	pub fn from_level_ij(level: u8, column: u64, row: u64) -> Self {
		let level = level.min(MAX_LEVEL);
		let shift = u32::from(MAX_LEVEL - level);
		let size = 1_u64 << level;
		let column = column.min(size - 1) << shift;
		let row = row.min(size - 1) << shift;
		let position = interleave(column, row);

		CellId((position << 1) | lsb_for_level(level))
	}

	/// Rebuilds a cell from a stored value, rejecting ids that are not well-formed.
	pub fn from_raw(raw: u64) -> Option<Self> {
		if raw == 0 || raw >= 1 << (2 * MAX_LEVEL as u32 + 1) {
			return None;
		}
		if raw.trailing_zeros() % 2 != 0 {
			return None;
		}

		Some(CellId(raw))
	}

	pub fn from_i64(raw: i64) -> Option<Self> {
		u64::try_from(raw).ok().and_then(Self::from_raw)
	}

	pub fn raw(self) -> u64 {
		self.0
	}

	/// Ids never use the sign bit, so the conversion is lossless.
	pub fn to_i64(self) -> i64 {
		self.0 as i64
	}

	pub fn level(self) -> u8 {
		MAX_LEVEL - (self.0.trailing_zeros() / 2) as u8
	}

	pub fn is_leaf(self) -> bool {
		self.0 & 1 == 1
	}

	fn lsb(self) -> u64 {
		self.0 & self.0.wrapping_neg()
	}

	/// The ancestor at `level`. Returns `self` when `level` is not coarser than this cell.
	pub fn parent(self, level: u8) -> Self {
		if level >= self.level() {
			return self;
		}

		let lsb = lsb_for_level(level);

		CellId((self.0 & lsb.wrapping_neg()) | lsb)
	}

	/// The four cells one level finer, in id order. A leaf has none.
	pub fn children(self) -> Vec<CellId> {
		if self.is_leaf() {
			return Vec::new();
		}

		let lsb = self.lsb();
		let child_lsb = lsb >> 2;

		(0..4).map(|index| CellId(self.0 - lsb + (2 * index + 1) * child_lsb)).collect()
	}

	pub fn range_min(self) -> CellId {
		CellId(self.0 - (self.lsb() - 1))
	}

	pub fn range_max(self) -> CellId {
		CellId(self.0 + (self.lsb() - 1))
	}

	/// The inclusive leaf id range spanned by this cell.
	pub fn range(self) -> CellRange {
		CellRange { min: self.range_min(), max: self.range_max() }
	}

	pub fn contains(self, other: CellId) -> bool {
		self.range_min() <= other && other <= self.range_max()
	}

	/// Column and row of this cell in its own level's grid.
	pub fn level_ij(self) -> (u64, u64) {
		let shift = u32::from(MAX_LEVEL - self.level());
		let (column, row) = deinterleave(self.range_min().0 >> 1);

		(column >> shift, row >> shift)
	}

	pub fn centroid(self) -> Coordinates {
		let size = (1_u64 << (MAX_LEVEL - self.level())) as f64;
		let (column, row) = deinterleave(self.range_min().0 >> 1);
		let column = column as f64 + size / 2.0;
		let row = row as f64 + size / 2.0;
		let longitude = column / GRID_SIZE as f64 * 360.0 - 180.0;
		let latitude = row / GRID_SIZE as f64 * 180.0 - 90.0;

		Coordinates::new(latitude, longitude)
	}
}

impl fmt::Display for CellId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:016x}", self.0)
	}
}

/// Inclusive range of leaf cell ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
	pub min: CellId,
	pub max: CellId,
}
impl CellRange {
	pub fn contains(&self, cell: CellId) -> bool {
		self.min <= cell && cell <= self.max
	}
}

/// Column index in a grid of `size` columns. Wraps across the antimeridian.
pub(crate) fn column_index(longitude: f64, size: u64) -> u64 {
	let scaled = ((longitude + 180.0) / 360.0 * size as f64).floor() as i64;

	scaled.rem_euclid(size as i64) as u64
}

/// Row index in a grid of `size` rows. Clamps at the poles.
pub(crate) fn row_index(latitude: f64, size: u64) -> u64 {
	let scaled = ((latitude + 90.0) / 180.0 * size as f64).floor();

	scaled.clamp(0.0, (size - 1) as f64) as u64
}

fn lsb_for_level(level: u8) -> u64 {
	1 << (2 * u32::from(MAX_LEVEL - level))
}

fn interleave(column: u64, row: u64) -> u64 {
	spread(column) | (spread(row) << 1)
}

fn deinterleave(position: u64) -> (u64, u64) {
	(compact(position), compact(position >> 1))
}

fn spread(value: u64) -> u64 {
	let mut x = value & 0x0000_0000_FFFF_FFFF;

	x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
	x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
	x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
	x = (x | (x << 2)) & 0x3333_3333_3333_3333;

	(x | (x << 1)) & 0x5555_5555_5555_5555
}

fn compact(value: u64) -> u64 {
	let mut x = value & 0x5555_5555_5555_5555;

	x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
	x = (x | (x >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
	x = (x | (x >> 4)) & 0x00FF_00FF_00FF_00FF;
	x = (x | (x >> 8)) & 0x0000_FFFF_0000_FFFF;

	(x | (x >> 16)) & 0x0000_0000_FFFF_FFFF
}
