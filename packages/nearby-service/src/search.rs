mod covering_cache;

pub use covering_cache::CoveringCache;

use std::{sync::Arc, time::Duration};

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use uuid::Uuid;

use nearby_config::Search;
use nearby_domain::{CandidateKey, CellId, Coordinates};

use crate::{CandidateStore, Error, Result};

/// A deduplicated spatial hit with its approximate distance from the search origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearbyCandidate {
	pub group_id: Uuid,
	pub cell_id: CellId,
	/// Measured to the centroid of `cell_id`.
	pub distance_meters: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
	pub radius_meters: f64,
	pub limit: u32,
}

type CellResult = (usize, Result<Vec<CandidateKey>>);

struct PendingTier {
	tier: Tier,
	cells: usize,
	tasks: JoinSet<CellResult>,
}

/// Multi-radius spatial retrieval over a [`CandidateStore`].
pub struct ProximitySearchPlanner {
	cfg: Search,
	tiers: Vec<Tier>,
	store: Arc<dyn CandidateStore>,
	coverings: CoveringCache,
}
impl ProximitySearchPlanner {
	pub fn new(cfg: Search, store: Arc<dyn CandidateStore>) -> Self {
		let tiers = build_tiers(&cfg);
		let coverings = CoveringCache::new(cfg.covering_cache_capacity);

		Self { cfg, tiers, store, coverings }
	}

	pub fn tiers(&self) -> &[Tier] {
		&self.tiers
	}

	pub fn coverings(&self) -> &CoveringCache {
		&self.coverings
	}

	/// Finds up to `retrieve_cap` groups near `origin`, closest first when the cap applies.
	///
	/// Sub-queries for every tier start immediately; their results are consumed from the
	/// narrowest tier outwards. A tier whose result count reaches its limit is an undercount, so
	/// it is always unioned with a wider tier. The walk stops at the first tier that is within
	/// its limit and holds enough distinct groups, or at the first exceeded tier after such a
	/// tier. When every tier is exceeded, all of them are unioned rather than the widest alone.
	/// Any failing sub-query fails the whole search.
	pub async fn search(
		&self,
		spaces: &[String],
		origin: &Coordinates,
		retrieve_cap: usize,
	) -> Result<Vec<NearbyCandidate>> {
		if retrieve_cap == 0 {
			return Ok(Vec::new());
		}

		let spaces: Arc<[String]> = spaces.into();
		let pending: Vec<PendingTier> =
			self.tiers.iter().map(|tier| self.spawn_tier(*tier, origin, &spaces)).collect();
		let raw = escalate(pending, retrieve_cap).await?;
		let candidates = measure_unique(raw, origin, self.cfg.max_radius_meters);

		Ok(keep_closest(candidates, retrieve_cap))
	}

	fn spawn_tier(&self, tier: Tier, origin: &Coordinates, spaces: &Arc<[String]>) -> PendingTier {
		let cells = self.coverings.cover(origin, tier.radius_meters, self.cfg.max_cells as usize);
		let timeout = self.cfg.query_timeout_ms.map(Duration::from_millis);
		let mut tasks = JoinSet::new();

		for (index, cell) in cells.iter().enumerate() {
			let store = self.store.clone();
			let spaces = spaces.clone();
			let range = cell.range();
			let limit = tier.limit;

			tasks.spawn(async move {
				let query = store.query_by_cell_range(&spaces, range, limit);
				let result = match timeout {
					Some(timeout) => tokio::time::timeout(timeout, query).await.unwrap_or_else(|_| {
						Err(Error::Retrieval {
							message: format!(
								"Cell query timed out after {} ms.",
								timeout.as_millis()
							),
						})
					}),
					None => query.await,
				};

				(index, result)
			});
		}

		PendingTier { tier, cells: cells.len(), tasks }
	}
}

pub fn build_tiers(cfg: &Search) -> Vec<Tier> {
	let mut radius_meters = cfg.initial_radius_meters;
	let mut tiers = Vec::with_capacity(cfg.tier_count as usize);

	for index in 0..cfg.tier_count {
		let limit = if index == 0 { cfg.initial_tier_limit } else { cfg.tier_limit };

		tiers.push(Tier { radius_meters, limit });

		radius_meters *= cfg.radius_multiplier;
	}

	tiers
}

// Dropping `pending` aborts the sub-queries of tiers that were never consumed.
async fn escalate(pending: Vec<PendingTier>, retrieve_cap: usize) -> Result<Vec<CandidateKey>> {
	let tier_count = pending.len();
	let mut collected = Vec::new();
	let mut has_best = false;

	for (position, pending_tier) in pending.into_iter().enumerate() {
		let Tier { radius_meters, limit } = pending_tier.tier;
		let keys = collect_tier(pending_tier).await?;
		let results = keys.len();
		let exceeded = results >= limit as usize;

		tracing::debug!(radius_meters, limit, results, exceeded, "Search tier consumed.");

		collected.extend(keys);

		if exceeded {
			if has_best {
				break;
			}
			if position + 1 == tier_count {
				tracing::warn!(
					radius_meters,
					limit,
					"Every search tier reached its limit. Results are an undercount."
				);
			}

			continue;
		}

		has_best = true;

		if distinct_groups(&collected) >= retrieve_cap {
			break;
		}
	}

	Ok(collected)
}

async fn collect_tier(mut pending: PendingTier) -> Result<Vec<CandidateKey>> {
	let mut by_cell: Vec<Vec<CandidateKey>> = vec![Vec::new(); pending.cells];

	while let Some(joined) = pending.tasks.join_next().await {
		let (index, result) = joined?;

		by_cell[index] = result?;
	}

	Ok(by_cell.into_iter().flatten().collect())
}

fn distinct_groups(keys: &[CandidateKey]) -> usize {
	keys.iter().map(|key| key.group_id).collect::<AHashSet<_>>().len()
}

fn measure_unique(
	raw: Vec<CandidateKey>,
	origin: &Coordinates,
	max_radius_meters: f64,
) -> Vec<NearbyCandidate> {
	let mut seen = AHashSet::with_capacity(raw.len());

	raw.into_iter()
		.filter(|key| seen.insert(key.group_id))
		.filter_map(|key| {
			let distance_meters = origin.distance_to(&key.cell_id.centroid());

			(distance_meters < max_radius_meters).then_some(NearbyCandidate {
				group_id: key.group_id,
				cell_id: key.cell_id,
				distance_meters,
			})
		})
		.collect()
}

fn keep_closest(mut candidates: Vec<NearbyCandidate>, cap: usize) -> Vec<NearbyCandidate> {
	if cap > 0 && candidates.len() > cap {
		candidates.select_nth_unstable_by(cap - 1, |left, right| {
			left.distance_meters.total_cmp(&right.distance_meters)
		});
		candidates.truncate(cap);
	}

	candidates
}
