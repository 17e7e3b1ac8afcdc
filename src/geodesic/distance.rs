//! Per-search distance and predecessor storage.

use std::collections::HashMap;

use crate::geodesic::voxel::Voxel;

#[derive(Debug, Clone, Copy)]
struct Entry {
	distance: f64,
	predecessor: Option<usize>,
	finalized: bool,
}

/// Best known distance and predecessor for every voxel a search touched.
///
/// Keyed by linear voxel index and stored sparsely, so a search that stops
/// early only pays for the region it explored. Distances only ever decrease
/// until a voxel is finalized, after which they are frozen.
#[derive(Debug, Clone)]
pub struct DistanceMap {
	dims: [usize; 3],
	entries: HashMap<usize, Entry>,
}

impl DistanceMap {
	pub(crate) fn new(dims: [usize; 3]) -> Self {
		Self {
			dims,
			entries: HashMap::new(),
		}
	}

	pub(crate) fn seed(&mut self, index: usize) {
		self.entries.insert(
			index,
			Entry {
				distance: 0.0,
				predecessor: None,
				finalized: false,
			},
		);
	}

	#[inline]
	pub(crate) fn tentative(&self, index: usize) -> f64 {
		self.entries.get(&index).map_or(f64::INFINITY, |e| e.distance)
	}

	#[inline]
	pub(crate) fn is_finalized(&self, index: usize) -> bool {
		self.entries.get(&index).is_some_and(|e| e.finalized)
	}

	pub(crate) fn finalize(&mut self, index: usize) {
		if let Some(entry) = self.entries.get_mut(&index) {
			entry.finalized = true;
		}
	}

	/// Record `distance` via `from` if it strictly beats the current best.
	/// Finalized voxels are never touched.
	pub(crate) fn relax(&mut self, index: usize, distance: f64, from: usize) -> bool {
		let entry = self.entries.entry(index).or_insert(Entry {
			distance: f64::INFINITY,
			predecessor: None,
			finalized: false,
		});
		if entry.finalized || distance >= entry.distance {
			return false;
		}
		entry.distance = distance;
		entry.predecessor = Some(from);
		true
	}

	/// Shape of the volume the map indexes into.
	pub fn dims(&self) -> [usize; 3] {
		self.dims
	}

	/// Final distance to `voxel`, or `None` if the search never settled it.
	pub fn distance(&self, voxel: Voxel) -> Option<f64> {
		self.settled(voxel).map(|e| e.distance)
	}

	/// The voxel `voxel` was reached from on its best path.
	pub fn predecessor(&self, voxel: Voxel) -> Option<Voxel> {
		self.settled(voxel)?
			.predecessor
			.map(|idx| Voxel::from_linear_index(idx, self.dims))
	}

	fn settled(&self, voxel: Voxel) -> Option<&Entry> {
		if voxel.i >= self.dims[0] || voxel.j >= self.dims[1] || voxel.k >= self.dims[2] {
			return None;
		}
		self.entries
			.get(&voxel.linear_index(self.dims))
			.filter(|e| e.finalized)
	}

	/// Number of finalized voxels.
	pub fn settled_count(&self) -> usize {
		self.entries.values().filter(|e| e.finalized).count()
	}

	/// Number of voxels touched, finalized or not.
	pub fn touched_count(&self) -> usize {
		self.entries.len()
	}

	/// Finalized voxels and their distances, ordered by linear index.
	pub fn settled_voxels(&self) -> Vec<(Voxel, f64)> {
		let mut out: Vec<(usize, f64)> = self
			.entries
			.iter()
			.filter(|(_, e)| e.finalized)
			.map(|(&idx, e)| (idx, e.distance))
			.collect();
		out.sort_unstable_by_key(|&(idx, _)| idx);
		out.into_iter()
			.map(|(idx, d)| (Voxel::from_linear_index(idx, self.dims), d))
			.collect()
	}

	/// Walk predecessors back from `goal` and return the path source-first.
	/// `None` if `goal` was not settled.
	pub fn path_to(&self, goal: Voxel) -> Option<Vec<Voxel>> {
		let mut entry = self.settled(goal)?;
		let mut path = vec![goal];
		while let Some(prev) = entry.predecessor {
			path.push(Voxel::from_linear_index(prev, self.dims));
			// Predecessors are always finalized before their successors.
			entry = self.entries.get(&prev)?;
			if path.len() > self.entries.len() {
				return None;
			}
		}
		path.reverse();
		Some(path)
	}
}
