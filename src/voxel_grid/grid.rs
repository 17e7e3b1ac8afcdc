use bitvec::vec::BitVec;

use crate::voxel_grid::volume::Volume3D;

/// Bit-packed 3D occupancy grid, used for the rasterized path output
#[derive(Clone, Debug)]
pub struct Grid3D {
	pub len_i: usize,  // Number of voxels along I
	pub len_j: usize,  // Number of voxels along J
	pub len_k: usize,  // Number of voxels along K
	pub total_voxels: usize, // Total number of voxels IxJxK
	pub grid_size: f32,  // Voxel edge length, copied from the source volume
	pub x_shift: f32,  // Offset for X to align with I=0
	pub y_shift: f32,  // Offset for Y to align with J=0
	pub z_shift: f32,  // Offset for Z to align with K=0
	pub data: BitVec,  // 1-bit per voxel storage
}

impl Grid3D {
	/// Create a new voxel grid, fully allocated with all voxels set to `false`
	pub fn new(len_i: usize, len_j: usize, len_k: usize, grid_size: f32) -> Self {
		let total_voxels = len_i * len_j * len_k;

		Self {
			len_i,
			len_j,
			len_k,
			total_voxels,
			grid_size,
			x_shift: 0.0,
			y_shift: 0.0,
			z_shift: 0.0,
			data: BitVec::repeat(false, total_voxels),
		}
	}

	/// Empty grid with the same shape, voxel size and origin as `volume`,
	/// so the written result overlays the input mask.
	pub fn matching(volume: &Volume3D) -> Self {
		let mut grid = Self::new(volume.len_i, volume.len_j, volume.len_k, volume.grid_size);
		grid.x_shift = volume.x_shift;
		grid.y_shift = volume.y_shift;
		grid.z_shift = volume.z_shift;
		grid
	}
}
