use std::mem::size_of;

use bitvec::prelude::BitVec;
use tracing::info;

use crate::geodesic::voxel::Voxel;
use crate::voxel_grid::grid;

/// Format large numbers with KB, MB, GB, TB suffixes
pub fn format_bytes(bytes: usize) -> String {
	const KB: usize = 1024;
	const MB: usize = KB * 1024;
	const GB: usize = MB * 1024;
	const TB: usize = GB * 1024;

	if bytes >= TB {
		format!("{:.2} TB", bytes as f64 / TB as f64)
	} else if bytes >= GB {
		format!("{:.2} GB", bytes as f64 / GB as f64)
	} else if bytes >= MB {
		format!("{:.2} MB", bytes as f64 / MB as f64)
	} else if bytes >= KB {
		format!("{:.2} KB", bytes as f64 / KB as f64)
	} else {
		format!("{} bytes", bytes)
	}
}

impl grid::Grid3D {
	/// Log grid shape and memory footprint
	pub fn report_memory(&self) {
		let struct_overhead = size_of::<Self>() - size_of::<BitVec>();
		let bitvec_bytes = self.data.capacity() / 8;
		info!(
			dims = %format!("{} x {} x {}", self.len_i, self.len_j, self.len_k),
			voxels = self.total_voxels,
			grid_size = self.grid_size,
			storage = %format_bytes(bitvec_bytes),
			total = %format_bytes(struct_overhead + bitvec_bytes),
			"output grid allocated"
		);
	}

	#[inline]
	pub fn dims(&self) -> [usize; 3] {
		[self.len_i, self.len_j, self.len_k]
	}

	/// Convert (i, j, k) to a linear index
	#[inline]
	pub fn ijk_to_index(&self, i: usize, j: usize, k: usize) -> usize {
		i + j * self.len_i + k * self.len_i * self.len_j
	}

	/// Convert a linear index back to (i, j, k)
	#[inline]
	pub fn index_to_ijk(&self, index: usize) -> (usize, usize, usize) {
		Voxel::from_linear_index(index, self.dims()).into()
	}

	#[inline]
	pub fn contains(&self, voxel: Voxel) -> bool {
		voxel.i < self.len_i && voxel.j < self.len_j && voxel.k < self.len_k
	}

	/// Voxel state at `voxel`; `false` outside the grid
	#[inline]
	pub fn is_filled(&self, voxel: Voxel) -> bool {
		self.contains(voxel) && self.data[self.ijk_to_index(voxel.i, voxel.j, voxel.k)]
	}

	/// Set a voxel value; writes outside the grid are dropped
	#[inline]
	pub fn set_voxel(&mut self, voxel: Voxel, value: bool) {
		if self.contains(voxel) {
			let index = self.ijk_to_index(voxel.i, voxel.j, voxel.k);
			self.data.set(index, value);
		}
	}

	#[inline]
	pub fn fill_voxel(&mut self, voxel: Voxel) {
		self.set_voxel(voxel, true);
	}

	/// Count the number of filled voxels
	pub fn count_filled(&self) -> usize {
		self.data.count_ones()
	}

	/// One byte per voxel (0 or 1), in storage order
	pub fn to_bytes(&self) -> Vec<u8> {
		self.data.iter().map(|bit| u8::from(*bit)).collect()
	}
}
