use std::sync::{Arc, Mutex};

use ahash::AHashMap;

use nearby_domain::{CellId, Coordinates, covering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CoveringKey {
	anchor: CellId,
	radius: u64,
	max_cells: usize,
}

/// Memoized coverings, shared by every origin inside the same anchor cell.
///
/// The anchor is the coarsest cell around the origin whose points all lie within a sixteenth of
/// the radius from its centroid, so a shared covering is only slightly wider than the exact
/// one. Entries never go stale, so the map is simply cleared once it is full.
pub struct CoveringCache {
	capacity: usize,
	entries: Mutex<AHashMap<CoveringKey, Arc<[CellId]>>>,
}
impl CoveringCache {
	pub fn new(capacity: usize) -> Self {
		Self { capacity: capacity.max(1), entries: Mutex::new(AHashMap::new()) }
	}

	pub fn cover(
		&self,
		center: &Coordinates,
		radius_meters: f64,
		max_cells: usize,
	) -> Arc<[CellId]> {
		if !radius_meters.is_finite() || radius_meters <= 0.0 {
			return covering::cover(center, radius_meters, max_cells).into();
		}

		let key = CoveringKey {
			anchor: covering::anchor(center, radius_meters),
			radius: radius_meters.to_bits(),
			max_cells,
		};

		{
			let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

			if let Some(cells) = entries.get(&key) {
				return cells.clone();
			}
		}

		let cells: Arc<[CellId]> =
			covering::cover_anchor(key.anchor, radius_meters, max_cells).into();
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		if entries.len() >= self.capacity {
			tracing::debug!(capacity = self.capacity, "Covering cache full. Clearing.");

			entries.clear();
		}

		entries.insert(key, cells.clone());

		cells
	}

	pub fn len(&self) -> usize {
		self.entries.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
