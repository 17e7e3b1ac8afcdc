//! Dijkstra search over the implicit 26-connected voxel graph.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::thread;

use tracing::{debug, info};

use crate::geodesic::cost_field::CostField;
use crate::geodesic::distance::DistanceMap;
use crate::geodesic::error::{EndpointRole, GeodesicError, GeodesicResult};
use crate::geodesic::policy::CostPolicy;
use crate::geodesic::voxel::Voxel;
use crate::voxel_grid::volume::Volume3D;

/// Frontier entry. Ordered so `BinaryHeap` pops the smallest distance first,
/// with ties going to the smaller linear index.
#[derive(Debug, Clone, Copy)]
struct State {
	index: usize,
	distance: f64,
}

impl PartialEq for State {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for State {}

impl PartialOrd for State {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for State {
	fn cmp(&self, other: &Self) -> Ordering {
		other
			.distance
			.total_cmp(&self.distance)
			.then_with(|| other.index.cmp(&self.index))
	}
}

/// Counters from one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
	/// Voxels whose distance was settled.
	pub finalized: usize,
	/// Frontier insertions, including re-insertions after improvement.
	pub pushes: usize,
	/// Outdated frontier entries discarded on pop.
	pub stale_pops: usize,
	/// Largest frontier size seen.
	pub peak_frontier: usize,
}

/// A minimum-cost path and what it took to find it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeodesicPath {
	/// Voxels from start to goal inclusive.
	pub voxels: Vec<Voxel>,
	/// Sum of edge weights along `voxels`.
	pub cost: f64,
	pub stats: SearchStats,
}

impl GeodesicPath {
	pub fn start(&self) -> Option<Voxel> {
		self.voxels.first().copied()
	}

	pub fn goal(&self) -> Option<Voxel> {
		self.voxels.last().copied()
	}

	/// Number of lattice steps (one less than the voxel count).
	pub fn steps(&self) -> usize {
		self.voxels.len().saturating_sub(1)
	}

	pub fn into_voxels(self) -> Vec<Voxel> {
		self.voxels
	}
}

/// Single-source shortest-path search over a [`CostField`].
///
/// Each call owns its own frontier and distance map, so one searcher (or many
/// sharing the same field) can be used from several threads at once.
///
/// # Example
///
/// ```
/// use voxel_geodesic::{CostField, GeodesicSearch, Volume3D, Voxel};
///
/// let volume = Volume3D::new(3, 3, 3, 1.0);
/// let field = CostField::with_default_policy(&volume).unwrap();
/// let path = GeodesicSearch::new(field)
/// 	.find_path(Voxel::new(0, 0, 0), Voxel::new(2, 2, 2))
/// 	.unwrap();
///
/// assert_eq!(path.voxels, vec![Voxel::new(0, 0, 0), Voxel::new(1, 1, 1), Voxel::new(2, 2, 2)]);
/// assert!((path.cost - 2.0 * 3.0_f64.sqrt()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GeodesicSearch<'v> {
	field: CostField<'v>,
}

struct Expansion {
	map: DistanceMap,
	stats: SearchStats,
	reached: bool,
}

impl<'v> GeodesicSearch<'v> {
	pub fn new(field: CostField<'v>) -> Self {
		Self { field }
	}

	pub fn field(&self) -> &CostField<'v> {
		&self.field
	}

	fn check_endpoint(&self, voxel: Voxel, role: EndpointRole) -> GeodesicResult<()> {
		match self.field.impassable_reason(voxel) {
			None => Ok(()),
			Some(reason) => Err(GeodesicError::InvalidEndpoint { role, voxel, reason }),
		}
	}

	/// Minimum-cost path from `start` to `goal`.
	///
	/// Both endpoints must be in bounds and traversable. Stops as soon as the
	/// goal is settled. Fails with [`GeodesicError::Unreachable`] if the two
	/// voxels lie in separate traversable regions.
	pub fn find_path(&self, start: Voxel, goal: Voxel) -> GeodesicResult<GeodesicPath> {
		self.check_endpoint(start, EndpointRole::Start)?;
		self.check_endpoint(goal, EndpointRole::Goal)?;

		if start == goal {
			return Ok(GeodesicPath {
				voxels: vec![start],
				cost: 0.0,
				stats: SearchStats {
					finalized: 1,
					pushes: 1,
					stale_pops: 0,
					peak_frontier: 1,
				},
			});
		}

		debug!(%start, %goal, "geodesic search started");
		let dims = self.field.dims();
		let goal_index = goal.linear_index(dims);
		let Expansion { map, stats, reached } = self.expand(start, Some(goal_index), None);

		if !reached {
			debug!(%start, %goal, visited = stats.finalized, "goal unreachable");
			return Err(GeodesicError::Unreachable {
				start,
				goal,
				visited: stats.finalized,
			});
		}

		let cost = map.distance(goal).unwrap_or(f64::INFINITY);
		let voxels = map.path_to(goal).ok_or(GeodesicError::Unreachable {
			start,
			goal,
			visited: stats.finalized,
		})?;

		debug!(
			%start,
			%goal,
			steps = voxels.len() - 1,
			cost,
			finalized = stats.finalized,
			pushes = stats.pushes,
			stale = stats.stale_pops,
			peak_frontier = stats.peak_frontier,
			"geodesic search finished"
		);
		Ok(GeodesicPath { voxels, cost, stats })
	}

	/// Distances from `start` to every voxel it can reach.
	///
	/// With `max_distance`, voxels farther than the cutoff are left unsettled,
	/// which keeps localized queries cheap.
	pub fn distance_field(&self, start: Voxel, max_distance: Option<f64>) -> GeodesicResult<DistanceMap> {
		self.check_endpoint(start, EndpointRole::Start)?;
		let Expansion { map, stats, .. } = self.expand(start, None, max_distance);
		debug!(%start, settled = stats.finalized, ?max_distance, "distance field computed");
		Ok(map)
	}

	/// Core Dijkstra loop with lazy deletion of stale frontier entries.
	fn expand(&self, start: Voxel, goal: Option<usize>, cutoff: Option<f64>) -> Expansion {
		let dims = self.field.dims();
		let limit = cutoff.unwrap_or(f64::INFINITY);
		let start_index = start.linear_index(dims);

		let mut map = DistanceMap::new(dims);
		let mut stats = SearchStats::default();
		let mut heap = BinaryHeap::new();

		map.seed(start_index);
		heap.push(State {
			index: start_index,
			distance: 0.0,
		});
		stats.pushes = 1;
		stats.peak_frontier = 1;

		while let Some(State { index, distance }) = heap.pop() {
			if map.is_finalized(index) || distance > map.tentative(index) {
				stats.stale_pops += 1;
				continue;
			}

			map.finalize(index);
			stats.finalized += 1;
			if Some(index) == goal {
				return Expansion {
					map,
					stats,
					reached: true,
				};
			}

			let voxel = Voxel::from_linear_index(index, dims);
			for (next, weight) in self.field.neighbors(voxel) {
				let next_index = next.linear_index(dims);
				if map.is_finalized(next_index) {
					continue;
				}
				let candidate = distance + weight;
				if candidate > limit {
					continue;
				}
				if map.relax(next_index, candidate, index) {
					heap.push(State {
						index: next_index,
						distance: candidate,
					});
					stats.pushes += 1;
				}
			}
			stats.peak_frontier = stats.peak_frontier.max(heap.len());
		}

		Expansion {
			map,
			stats,
			reached: goal.is_none(),
		}
	}
}

/// Minimum-cost path between two voxels of `volume` under the default policy
/// (zero is background, every positive value is traversable at its own cost).
pub fn geodesic_path(start: Voxel, goal: Voxel, volume: &Volume3D) -> GeodesicResult<Vec<Voxel>> {
	let field = CostField::with_default_policy(volume)?;
	GeodesicSearch::new(field)
		.find_path(start, goal)
		.map(GeodesicPath::into_voxels)
}

/// Like [`geodesic_path`] with an explicit policy, keeping cost and stats.
pub fn geodesic_path_with_policy(
	start: Voxel,
	goal: Voxel,
	volume: &Volume3D,
	policy: CostPolicy,
) -> GeodesicResult<GeodesicPath> {
	let field = CostField::new(volume, policy)?;
	GeodesicSearch::new(field).find_path(start, goal)
}

/// Total edge weight along a caller-supplied path.
///
/// Every voxel must be traversable and every consecutive pair 26-adjacent.
pub fn path_cost(field: &CostField<'_>, path: &[Voxel]) -> GeodesicResult<f64> {
	if path.is_empty() {
		return Err(GeodesicError::InvalidPath {
			step: 0,
			message: "path is empty".to_string(),
		});
	}
	for (step, &voxel) in path.iter().enumerate() {
		if let Some(reason) = field.impassable_reason(voxel) {
			return Err(GeodesicError::InvalidPath {
				step,
				message: format!("voxel {voxel} is {reason}"),
			});
		}
	}
	let mut total = 0.0;
	for (step, pair) in path.windows(2).enumerate() {
		let (a, b) = (pair[0], pair[1]);
		match field.edge_weight(a, b) {
			Ok(Some(weight)) => total += weight,
			Ok(None) => {
				return Err(GeodesicError::InvalidPath {
					step: step + 1,
					message: format!("no edge between {a} and {b}"),
				});
			}
			Err(err) => {
				return Err(GeodesicError::InvalidPath {
					step: step + 1,
					message: err.to_string(),
				});
			}
		}
	}
	Ok(total)
}

/// Run independent searches over one field on scoped worker threads.
///
/// Results come back in the order of `pairs`.
pub fn find_paths_parallel(field: &CostField<'_>, pairs: &[(Voxel, Voxel)]) -> Vec<GeodesicResult<GeodesicPath>> {
	if pairs.is_empty() {
		return Vec::new();
	}

	let threads = thread::available_parallelism()
		.map(|n| n.get())
		.unwrap_or(1)
		.min(pairs.len());
	let chunk_size = pairs.len().div_ceil(threads);
	info!(pairs = pairs.len(), threads, "running geodesic searches in parallel");

	let search = GeodesicSearch::new(*field);
	thread::scope(|scope| {
		let handles: Vec<_> = pairs
			.chunks(chunk_size)
			.map(|chunk| {
				scope.spawn(move || {
					chunk
						.iter()
						.map(|&(start, goal)| search.find_path(start, goal))
						.collect::<Vec<_>>()
				})
			})
			.collect();

		handles
			.into_iter()
			.flat_map(|handle| {
				handle
					.join()
					.unwrap_or_else(|payload| std::panic::resume_unwind(payload))
			})
			.collect()
	})
}
