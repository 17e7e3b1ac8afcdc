use std::fs::File;
use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::tempdir;

use voxel_geodesic::{GeodesicSearch, CostField, Grid3D, Volume3D, Voxel};

fn brain_like_mask() -> Volume3D {
	// A solid ball of tissue inside an empty box.
	let mut vol = Volume3D::from_fn(16, 16, 16, |v| {
		let d2 = [v.i, v.j, v.k]
			.iter()
			.map(|&c| (c as f32 - 7.5).powi(2))
			.sum::<f32>();
		if d2 <= 49.0 { 1.0 } else { 0.0 }
	});
	vol.grid_size = 0.9;
	vol.x_shift = -7.2;
	vol.y_shift = 3.0;
	vol.z_shift = 1.5;
	vol
}

#[test]
fn volume_round_trip_through_file() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("mask.mrc");
	let vol = brain_like_mask();
	vol.write_to_mrc_file(&path).unwrap();

	let back = Volume3D::read_mrc_file(&path).unwrap();
	assert_eq!(back.dims(), vol.dims());
	assert_eq!(back.data, vol.data);
	assert!((back.grid_size - 0.9).abs() < 1e-5);
	assert_eq!((back.x_shift, back.y_shift, back.z_shift), (-7.2, 3.0, 1.5));
}

#[test]
fn gzipped_masks_are_decompressed() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("mask.mrc.gz");
	let vol = brain_like_mask();

	let mut raw = Vec::new();
	vol.write_mrc(&mut raw).unwrap();
	let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
	encoder.write_all(&raw).unwrap();
	encoder.finish().unwrap();

	let back = Volume3D::read_mrc_file(&path).unwrap();
	assert_eq!(back.data, vol.data);
}

#[test]
fn missing_file_reports_path() {
	let dir = tempdir().unwrap();
	let path = dir.path().join("nope.mrc");
	let err = Volume3D::read_mrc_file(&path).unwrap_err();
	assert!(format!("{err:#}").contains("nope.mrc"));
}

#[test]
fn path_rasterized_into_output_volume() {
	let dir = tempdir().unwrap();
	let mask_path = dir.path().join("mask.mrc");
	let out_path = dir.path().join("mask_geodesic.mrc");
	brain_like_mask().write_to_mrc_file(&mask_path).unwrap();

	let volume = Volume3D::read_mrc_file(&mask_path).unwrap();
	let field = CostField::with_default_policy(&volume).unwrap();
	let (start, goal) = (Voxel::new(3, 7, 7), Voxel::new(12, 8, 7));
	let path = GeodesicSearch::new(field).find_path(start, goal).unwrap();
	assert_eq!(path.steps(), 9);

	let mut grid = Grid3D::matching(&volume);
	let filled = grid.rasterize_path(&path.voxels, 2.0, false);
	assert!(filled > path.voxels.len());
	for v in &path.voxels {
		assert!(grid.is_filled(*v));
	}
	grid.write_to_mrc_file(&out_path).unwrap();

	// The written mask reads back as 0/1 bytes with the input geometry.
	let written = Volume3D::read_mrc_file(&out_path).unwrap();
	assert_eq!(written.dims(), volume.dims());
	assert_eq!(written.x_shift, volume.x_shift);
	assert_eq!(written.count_above(0.5), filled);
	assert_eq!(written.get(start), Some(1.0));
	assert_eq!(written.get(Voxel::new(0, 0, 0)), Some(0.0));
}
