//! Cost and traversability queries over an immutable volume.
//!
//! The lattice graph is never materialised: adjacency and edge weights are
//! computed from coordinates on demand, so memory stays proportional to what a
//! search actually touches.

use tracing::debug;

use crate::geodesic::error::{GeodesicError, GeodesicResult, ImpassableReason};
use crate::geodesic::policy::CostPolicy;
use crate::geodesic::voxel::{NEIGHBOR_OFFSETS, Voxel, step_length};
use crate::voxel_grid::volume::Volume3D;

/// Read-only view of a volume under a [`CostPolicy`].
///
/// Holds a shared borrow, so the backing data cannot change while any search
/// over it is running. `CostField` is `Sync`; independent searches may share
/// one across threads.
#[derive(Debug, Clone, Copy)]
pub struct CostField<'v> {
	volume: &'v Volume3D,
	policy: CostPolicy,
}

impl<'v> CostField<'v> {
	/// Wrap `volume`, rejecting policies that could yield non-positive costs
	/// and volumes whose data does not match their extents.
	pub fn new(volume: &'v Volume3D, policy: CostPolicy) -> GeodesicResult<Self> {
		policy.validate()?;
		volume.check_shape()?;
		debug!(
			dims = ?volume.dims(),
			threshold = policy.impassable_threshold,
			combine = %policy.combine,
			"cost field ready"
		);
		Ok(Self { volume, policy })
	}

	/// Wrap `volume` with the default binary-mask policy.
	pub fn with_default_policy(volume: &'v Volume3D) -> GeodesicResult<Self> {
		Self::new(volume, CostPolicy::default())
	}

	#[inline]
	pub fn volume(&self) -> &'v Volume3D {
		self.volume
	}

	#[inline]
	pub fn policy(&self) -> &CostPolicy {
		&self.policy
	}

	#[inline]
	pub fn dims(&self) -> [usize; 3] {
		self.volume.dims()
	}

	#[inline]
	pub fn in_bounds(&self, voxel: Voxel) -> bool {
		self.volume.contains(voxel)
	}

	fn check_bounds(&self, voxel: Voxel) -> GeodesicResult<()> {
		if self.in_bounds(voxel) {
			Ok(())
		} else {
			Err(GeodesicError::OutOfBounds {
				coords: voxel.as_signed(),
				dims: self.dims(),
			})
		}
	}

	/// Raw mask value at `voxel`, widened to `f64`.
	pub fn node_cost(&self, voxel: Voxel) -> GeodesicResult<f64> {
		self.check_bounds(voxel)?;
		Ok(self.cost_at(voxel))
	}

	/// Unchecked lookup; callers have already bounds-checked.
	#[inline]
	fn cost_at(&self, voxel: Voxel) -> f64 {
		f64::from(self.volume.data[voxel.linear_index(self.dims())])
	}

	/// Why `voxel` cannot be entered, or `None` if it can.
	pub fn impassable_reason(&self, voxel: Voxel) -> Option<ImpassableReason> {
		if !self.in_bounds(voxel) {
			return Some(ImpassableReason::OutOfBounds);
		}
		let value = self.cost_at(voxel);
		if !value.is_finite() {
			Some(ImpassableReason::NonFinite)
		} else if value <= self.policy.impassable_threshold {
			Some(ImpassableReason::BelowThreshold {
				value,
				threshold: self.policy.impassable_threshold,
			})
		} else {
			None
		}
	}

	#[inline]
	pub fn is_traversable(&self, voxel: Voxel) -> bool {
		self.in_bounds(voxel) && self.policy.admits(self.cost_at(voxel))
	}

	/// Weight of the edge between two 26-adjacent voxels.
	///
	/// `Ok(None)` when either end is impassable: such pairs have no edge.
	pub fn edge_weight(&self, a: Voxel, b: Voxel) -> GeodesicResult<Option<f64>> {
		self.check_bounds(a)?;
		self.check_bounds(b)?;
		if !a.is_adjacent(&b) {
			return Err(GeodesicError::NotAdjacent { a, b });
		}
		let (ca, cb) = (self.cost_at(a), self.cost_at(b));
		if !self.policy.admits(ca) || !self.policy.admits(cb) {
			return Ok(None);
		}
		Ok(Some(self.weight(a.delta_to(&b), ca, cb)))
	}

	#[inline]
	fn weight(&self, offset: [isize; 3], cost_a: f64, cost_b: f64) -> f64 {
		step_length(offset) * self.policy.combine.combine(cost_a, cost_b)
	}

	/// Traversable 26-neighbours of `voxel` with their edge weights, in
	/// canonical offset order. Empty if `voxel` itself is impassable.
	pub fn neighbors(&self, voxel: Voxel) -> impl Iterator<Item = (Voxel, f64)> + '_ {
		let own = if self.is_traversable(voxel) {
			Some(self.cost_at(voxel))
		} else {
			None
		};
		NEIGHBOR_OFFSETS.into_iter().filter_map(move |offset| {
			let own = own?;
			let next = voxel.offset(offset)?;
			if !self.in_bounds(next) {
				return None;
			}
			let cost = self.cost_at(next);
			if !self.policy.admits(cost) {
				return None;
			}
			Some((next, self.weight(offset, own, cost)))
		})
	}

	/// Number of voxels a search may enter.
	pub fn traversable_count(&self) -> usize {
		self.volume
			.data
			.iter()
			.filter(|&&v| self.policy.admits(f64::from(v)))
			.count()
	}
}
