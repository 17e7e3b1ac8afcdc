use crate::geodesic::error::{GeodesicError, GeodesicResult};
use crate::geodesic::voxel::Voxel;

/// Dense 3D scalar volume, I varying fastest (same layout as `Grid3D`).
///
/// This is the input side of a search: a brain mask, a weighted cost map or
/// anything else read from disk by the MRC reader.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume3D {
	pub len_i: usize,  // Number of voxels along I
	pub len_j: usize,  // Number of voxels along J
	pub len_k: usize,  // Number of voxels along K
	pub total_voxels: usize,
	pub grid_size: f32,  // Voxel edge length in file units
	pub x_shift: f32,  // Physical origin of voxel (0, 0, 0)
	pub y_shift: f32,
	pub z_shift: f32,
	pub data: Vec<f32>,
}

impl Volume3D {
	/// Create a volume with every voxel set to `fill`.
	pub fn new(len_i: usize, len_j: usize, len_k: usize, fill: f32) -> Self {
		let total_voxels = len_i * len_j * len_k;
		Self {
			len_i,
			len_j,
			len_k,
			total_voxels,
			grid_size: 1.0,
			x_shift: 0.0,
			y_shift: 0.0,
			z_shift: 0.0,
			data: vec![fill; total_voxels],
		}
	}

	/// Wrap existing values; `data.len()` must equal `len_i * len_j * len_k`.
	pub fn from_vec(len_i: usize, len_j: usize, len_k: usize, data: Vec<f32>) -> GeodesicResult<Self> {
		let expected = len_i * len_j * len_k;
		if data.len() != expected {
			return Err(GeodesicError::ShapeMismatch {
				dims: [len_i, len_j, len_k],
				expected,
				actual: data.len(),
			});
		}
		let mut volume = Self::new(len_i, len_j, len_k, 0.0);
		volume.data = data;
		Ok(volume)
	}

	/// Build a volume by evaluating `f(voxel)` for every voxel.
	pub fn from_fn(len_i: usize, len_j: usize, len_k: usize, mut f: impl FnMut(Voxel) -> f32) -> Self {
		let dims = [len_i, len_j, len_k];
		let mut volume = Self::new(len_i, len_j, len_k, 0.0);
		for (idx, slot) in volume.data.iter_mut().enumerate() {
			*slot = f(Voxel::from_linear_index(idx, dims));
		}
		volume
	}

	#[inline]
	pub fn dims(&self) -> [usize; 3] {
		[self.len_i, self.len_j, self.len_k]
	}

	/// Fails when `data` does not hold exactly `len_i * len_j * len_k` values,
	/// e.g. after the public extents were edited by hand.
	pub fn check_shape(&self) -> GeodesicResult<()> {
		let expected = self
			.len_i
			.checked_mul(self.len_j)
			.and_then(|n| n.checked_mul(self.len_k));
		if expected == Some(self.data.len()) {
			return Ok(());
		}
		Err(GeodesicError::ShapeMismatch {
			dims: self.dims(),
			expected: expected.unwrap_or(usize::MAX),
			actual: self.data.len(),
		})
	}

	#[inline]
	pub fn contains(&self, voxel: Voxel) -> bool {
		voxel.i < self.len_i && voxel.j < self.len_j && voxel.k < self.len_k
	}

	/// Value at `voxel`, or `None` outside the volume.
	#[inline]
	pub fn get(&self, voxel: Voxel) -> Option<f32> {
		if !self.contains(voxel) {
			return None;
		}
		self.data.get(voxel.linear_index(self.dims())).copied()
	}

	/// Set the value at `voxel`; out-of-range writes are ignored.
	#[inline]
	pub fn set(&mut self, voxel: Voxel, value: f32) {
		if self.contains(voxel) {
			let idx = voxel.linear_index(self.dims());
			self.data[idx] = value;
		}
	}

	/// Set every voxel in the inclusive box `lo..=hi`, clipped to the volume.
	pub fn fill_box(&mut self, lo: Voxel, hi: Voxel, value: f32) {
		for k in lo.k..=hi.k.min(self.len_k.saturating_sub(1)) {
			for j in lo.j..=hi.j.min(self.len_j.saturating_sub(1)) {
				for i in lo.i..=hi.i.min(self.len_i.saturating_sub(1)) {
					self.set(Voxel::new(i, j, k), value);
				}
			}
		}
	}

	/// Number of voxels strictly above `threshold`.
	pub fn count_above(&self, threshold: f32) -> usize {
		self.data.iter().filter(|&&v| v > threshold).count()
	}

	/// Smallest and largest finite values, if any.
	pub fn value_range(&self) -> Option<(f32, f32)> {
		self.data
			.iter()
			.copied()
			.filter(|v| v.is_finite())
			.fold(None, |acc, v| match acc {
				None => Some((v, v)),
				Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
			})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn from_vec_checks_shape() {
		assert!(Volume3D::from_vec(2, 2, 2, vec![1.0; 8]).is_ok());
		let err = Volume3D::from_vec(2, 2, 2, vec![1.0; 7]);
		assert!(matches!(
			err,
			Err(GeodesicError::ShapeMismatch {
				expected: 8,
				actual: 7,
				..
			})
		));
	}

	#[test]
	fn from_fn_matches_layout() {
		let vol = Volume3D::from_fn(3, 4, 5, |v| (v.i + 10 * v.j + 100 * v.k) as f32);
		assert_eq!(vol.dims(), [3, 4, 5]);
		assert_eq!(vol.total_voxels, 60);
		assert_eq!(vol.get(Voxel::new(2, 3, 4)), Some(432.0));
		assert_eq!(vol.data[1], 1.0);
		assert_eq!(vol.data[3], 10.0);
		assert_eq!(vol.get(Voxel::new(3, 0, 0)), None);
	}

	#[test]
	fn fill_box_clips() {
		let mut vol = Volume3D::new(3, 3, 3, 1.0);
		vol.fill_box(Voxel::new(1, 0, 0), Voxel::new(9, 9, 9), 0.0);
		assert_eq!(vol.count_above(0.5), 9);
		assert_eq!(vol.value_range(), Some((0.0, 1.0)));
	}

	#[test]
	fn value_range_skips_nan() {
		let vol = Volume3D::from_vec(1, 1, 3, vec![f32::NAN, 2.0, -1.0]).unwrap();
		assert_eq!(vol.value_range(), Some((-1.0, 2.0)));
	}
}
