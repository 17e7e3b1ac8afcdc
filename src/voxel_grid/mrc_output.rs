use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use tracing::info;

use crate::voxel_grid::grid::Grid3D;
use crate::voxel_grid::volume::Volume3D;

/// Size of the fixed MRC header in bytes.
pub const MRC_HEADER_BYTES: usize = 1024;

/// "MAP " identifier stored in word 53.
pub const MRC_MAP_ID: [u8; 4] = *b"MAP ";

/// Machine stamp for little-endian data.
pub const MRC_MACHST_LE: [u8; 4] = [0x44, 0x44, 0x00, 0x00];

/// MRC data modes this crate reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MrcMode {
	Int8,
	Int16,
	Float32,
	Uint16,
}

impl MrcMode {
	pub fn from_code(code: i32) -> Option<Self> {
		match code {
			0 => Some(Self::Int8),
			1 => Some(Self::Int16),
			2 => Some(Self::Float32),
			6 => Some(Self::Uint16),
			_ => None,
		}
	}

	pub fn code(self) -> i32 {
		match self {
			Self::Int8 => 0,
			Self::Int16 => 1,
			Self::Float32 => 2,
			Self::Uint16 => 6,
		}
	}

	pub fn bytes_per_voxel(self) -> usize {
		match self {
			Self::Int8 => 1,
			Self::Int16 | Self::Uint16 => 2,
			Self::Float32 => 4,
		}
	}
}

/// MRC header fields this crate reads or writes
#[derive(Debug, Clone, PartialEq)]
pub struct MRCHeader {
	pub len_i: i32, pub len_j: i32, pub len_k: i32,  // Grid dimensions
	pub mode: i32,
	pub m_i: i32, pub m_j: i32, pub m_k: i32,  // Sampling along each axis
	pub x_length: f32, pub y_length: f32, pub z_length: f32,  // Cell size
	pub mapc: i32, pub mapr: i32, pub maps: i32,  // Axis mapping
	pub amin: f32, pub amax: f32, pub amean: f32,  // Data range
	pub nsymbt: i32,  // Extended header length in bytes
	pub xorigin: f32, pub yorigin: f32, pub zorigin: f32,
	pub map: [u8; 4],
	pub mach: [u8; 4],
}

impl MRCHeader {
	/// Header for a `len_i x len_j x len_k` map with cubic voxels.
	pub fn new(dims: [usize; 3], mode: MrcMode, grid_size: f32, origin: [f32; 3], range: (f32, f32, f32)) -> Self {
		let [len_i, len_j, len_k] = dims.map(|d| d as i32);
		MRCHeader {
			len_i, len_j, len_k,
			mode: mode.code(),
			m_i: len_i, m_j: len_j, m_k: len_k,
			x_length: len_i as f32 * grid_size,
			y_length: len_j as f32 * grid_size,
			z_length: len_k as f32 * grid_size,
			mapc: 1, mapr: 2, maps: 3,
			amin: range.0, amax: range.1, amean: range.2,
			nsymbt: 0,
			xorigin: origin[0], yorigin: origin[1], zorigin: origin[2],
			map: MRC_MAP_ID,
			mach: MRC_MACHST_LE,
		}
	}

	/// Serialize exactly `MRC_HEADER_BYTES` little-endian bytes.
	pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
		for v in [self.len_i, self.len_j, self.len_k, self.mode] {
			w.write_i32::<LittleEndian>(v)?;
		}
		for _ in 0..3 {
			w.write_i32::<LittleEndian>(0)?; // nxstart, nystart, nzstart
		}
		for v in [self.m_i, self.m_j, self.m_k] {
			w.write_i32::<LittleEndian>(v)?;
		}
		for v in [self.x_length, self.y_length, self.z_length, 90.0, 90.0, 90.0] {
			w.write_f32::<LittleEndian>(v)?;
		}
		for v in [self.mapc, self.mapr, self.maps] {
			w.write_i32::<LittleEndian>(v)?;
		}
		for v in [self.amin, self.amax, self.amean] {
			w.write_f32::<LittleEndian>(v)?;
		}
		w.write_i32::<LittleEndian>(0)?; // ispg
		w.write_i32::<LittleEndian>(self.nsymbt)?;
		w.write_all(&[0u8; 100])?; // extra
		for v in [self.xorigin, self.yorigin, self.zorigin] {
			w.write_f32::<LittleEndian>(v)?;
		}
		w.write_all(&self.map)?;
		w.write_all(&self.mach)?;
		w.write_f32::<LittleEndian>(0.0)?; // rms
		w.write_i32::<LittleEndian>(0)?; // nlabl
		w.write_all(&[0u8; 800])?; // labels
		Ok(())
	}
}

fn create_writer(path: &Path) -> Result<BufWriter<File>> {
	let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
	Ok(BufWriter::new(file))
}

impl Grid3D {
	/// Write the grid as a mode-0 (byte) MRC map.
	pub fn write_mrc<W: Write>(&self, w: &mut W) -> Result<()> {
		let bytes = self.to_bytes();
		let mean = if self.total_voxels == 0 {
			0.0
		} else {
			self.count_filled() as f32 / self.total_voxels as f32
		};
		let header = MRCHeader::new(
			self.dims(),
			MrcMode::Int8,
			self.grid_size,
			[self.x_shift, self.y_shift, self.z_shift],
			(0.0, 1.0, mean),
		);
		header.write_to(w).context("failed to write MRC header")?;
		w.write_all(&bytes).context("failed to write voxel data")?;
		Ok(())
	}

	/// Save the voxel grid as an MRC file and report save time
	pub fn write_to_mrc_file(&self, path: impl AsRef<Path>) -> Result<()> {
		let path = path.as_ref();
		let start_time = Instant::now();

		let mut writer = create_writer(path)?;
		self.write_mrc(&mut writer)?;
		writer.flush().with_context(|| format!("failed to flush {}", path.display()))?;

		info!(
			path = %path.display(),
			filled = self.count_filled(),
			seconds = start_time.elapsed().as_secs_f64(),
			"MRC file saved"
		);
		Ok(())
	}
}

impl Volume3D {
	/// Write the volume as a mode-2 (float32) MRC map.
	pub fn write_mrc<W: Write>(&self, w: &mut W) -> Result<()> {
		let (lo, hi) = self.value_range().unwrap_or((0.0, 0.0));
		let finite: Vec<f32> = self.data.iter().copied().filter(|v| v.is_finite()).collect();
		let mean = if finite.is_empty() {
			0.0
		} else {
			(finite.iter().map(|&v| f64::from(v)).sum::<f64>() / finite.len() as f64) as f32
		};
		let header = MRCHeader::new(
			self.dims(),
			MrcMode::Float32,
			self.grid_size,
			[self.x_shift, self.y_shift, self.z_shift],
			(lo, hi, mean),
		);
		header.write_to(w).context("failed to write MRC header")?;
		for &v in &self.data {
			w.write_f32::<LittleEndian>(v).context("failed to write voxel data")?;
		}
		Ok(())
	}

	pub fn write_to_mrc_file(&self, path: impl AsRef<Path>) -> Result<()> {
		let path = path.as_ref();
		let mut writer = create_writer(path)?;
		self.write_mrc(&mut writer)?;
		writer.flush().with_context(|| format!("failed to flush {}", path.display()))?;
		info!(path = %path.display(), voxels = self.total_voxels, "MRC volume saved");
		Ok(())
	}
}
