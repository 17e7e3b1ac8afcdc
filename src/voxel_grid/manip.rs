use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::geodesic::voxel::Voxel;
use crate::voxel_grid::grid::Grid3D;

/// (di, dj, dk) offsets of every voxel centre within `radius` of the origin.
/// Empty for a negative or non-finite radius.
pub fn sphere_offsets(radius: f64) -> Vec<[isize; 3]> {
	let mut offsets = Vec::new();
	if !radius.is_finite() || radius < 0.0 {
		return offsets;
	}
	let r_int = radius.floor() as isize;
	let r2 = radius * radius;

	for di in -r_int..=r_int {
		let di2 = di * di;
		for dj in -r_int..=r_int {
			let dj2 = dj * dj;
			for dk in -r_int..=r_int {
				// convert to f64 in last step
				let dist = (di2 + dj2 + dk * dk) as f64;
				if dist <= r2 {
					offsets.push([di, dj, dk]);
				}
			}
		}
	}
	offsets
}

impl Grid3D {
	/// Fill the precomputed sphere around `center`, clipped at the grid border.
	/// Returns how many voxels changed from empty to filled.
	pub fn stamp_sphere(&mut self, center: Voxel, offsets: &[[isize; 3]]) -> usize {
		let mut newly_filled = 0;
		for &offset in offsets {
			let Some(voxel) = center.offset(offset) else {
				continue;
			};
			if self.contains(voxel) && !self.is_filled(voxel) {
				self.fill_voxel(voxel);
				newly_filled += 1;
			}
		}
		newly_filled
	}

	/// Length of the grid's main diagonal, in voxels. No sphere centred inside
	/// the grid reaches farther than this.
	pub fn diagonal_length(&self) -> f64 {
		let [i, j, k] = [self.len_i, self.len_j, self.len_k].map(|n| n as f64);
		(i * i + j * j + k * k).sqrt()
	}

	/// Stamp a sphere of `radius` voxels around every point of `path`.
	/// Returns the number of voxels filled.
	///
	/// Radii past the grid diagonal are clamped to it; the result is the same
	/// and the offset table stays bounded by the grid size.
	pub fn rasterize_path(&mut self, path: &[Voxel], radius: f64, show_progress: bool) -> usize {
		let radius = radius.min(self.diagonal_length());
		let offsets = sphere_offsets(radius);

		let pb = if show_progress {
			ProgressBar::new(path.len() as u64)
		} else {
			ProgressBar::hidden()
		};
		if let Ok(style) = ProgressStyle::default_bar()
			.template("Stamping path: [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
		{
			pb.set_style(style.progress_chars("#>-"));
		}

		let mut filled = 0;
		for &point in path {
			filled += self.stamp_sphere(point, &offsets);
			pb.inc(1);
		}
		pb.finish_and_clear();

		debug!(points = path.len(), radius, sphere_voxels = offsets.len(), filled, "path rasterized");
		filled
	}
}
