use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::GzDecoder;
use tracing::{info, warn};

use crate::voxel_grid::mrc_output::{MRC_MAP_ID, MRCHeader, MrcMode};
use crate::voxel_grid::volume::Volume3D;

impl MRCHeader {
	/// Parse the fixed 1024-byte header. Leaves the reader at the start of the
	/// extended header, if any.
	pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
		let mut words = [0i32; 4];
		r.read_i32_into::<LittleEndian>(&mut words)?;
		let [len_i, len_j, len_k, mode] = words;

		let mut skip = [0u8; 12];
		r.read_exact(&mut skip)?; // nxstart, nystart, nzstart

		let m_i = r.read_i32::<LittleEndian>()?;
		let m_j = r.read_i32::<LittleEndian>()?;
		let m_k = r.read_i32::<LittleEndian>()?;
		let x_length = r.read_f32::<LittleEndian>()?;
		let y_length = r.read_f32::<LittleEndian>()?;
		let z_length = r.read_f32::<LittleEndian>()?;
		r.read_exact(&mut skip)?; // cell angles
		let mapc = r.read_i32::<LittleEndian>()?;
		let mapr = r.read_i32::<LittleEndian>()?;
		let maps = r.read_i32::<LittleEndian>()?;
		let amin = r.read_f32::<LittleEndian>()?;
		let amax = r.read_f32::<LittleEndian>()?;
		let amean = r.read_f32::<LittleEndian>()?;
		let _ispg = r.read_i32::<LittleEndian>()?;
		let nsymbt = r.read_i32::<LittleEndian>()?;
		let mut extra = [0u8; 100];
		r.read_exact(&mut extra)?;
		let xorigin = r.read_f32::<LittleEndian>()?;
		let yorigin = r.read_f32::<LittleEndian>()?;
		let zorigin = r.read_f32::<LittleEndian>()?;
		let mut map = [0u8; 4];
		r.read_exact(&mut map)?;
		let mut mach = [0u8; 4];
		r.read_exact(&mut mach)?;
		let mut tail = [0u8; 808]; // rms, nlabl, labels
		r.read_exact(&mut tail)?;

		Ok(Self {
			len_i, len_j, len_k,
			mode,
			m_i, m_j, m_k,
			x_length, y_length, z_length,
			mapc, mapr, maps,
			amin, amax, amean,
			nsymbt,
			xorigin, yorigin, zorigin,
			map,
			mach,
		})
	}

	/// Shape as (I, J, K), rejecting non-positive extents.
	pub fn dims(&self) -> Result<[usize; 3]> {
		let dims = [self.len_i, self.len_j, self.len_k];
		if dims.iter().any(|&d| d <= 0) {
			bail!("MRC header has invalid dimensions {:?}", dims);
		}
		Ok(dims.map(|d| d as usize))
	}

	/// Voxel edge length along I, falling back to 1 when the cell is unset.
	pub fn voxel_size(&self) -> f32 {
		if self.m_i > 0 && self.x_length > 0.0 {
			self.x_length / self.m_i as f32
		} else {
			1.0
		}
	}
}

/// Decode `count` voxels. Bytes are pulled through `take`, so the buffer
/// only grows as data actually arrives, whatever the header claims.
fn read_values<R: Read>(r: &mut R, mode: MrcMode, count: usize) -> Result<Vec<f32>> {
	let Some(byte_len) = count.checked_mul(mode.bytes_per_voxel()) else {
		bail!("MRC data size overflows: {count} voxels of {mode:?}");
	};
	let mut bytes = Vec::new();
	r.take(byte_len as u64).read_to_end(&mut bytes)?;
	if bytes.len() != byte_len {
		bail!(
			"MRC data truncated: expected {count} voxels of {mode:?} ({byte_len} bytes), found {} bytes",
			bytes.len()
		);
	}

	let mut data = bytes.as_slice();
	let mut values = vec![0.0f32; count];
	match mode {
		MrcMode::Int8 => {
			for slot in &mut values {
				*slot = f32::from(data.read_i8()?);
			}
		}
		MrcMode::Int16 => {
			for slot in &mut values {
				*slot = f32::from(data.read_i16::<LittleEndian>()?);
			}
		}
		MrcMode::Uint16 => {
			for slot in &mut values {
				*slot = f32::from(data.read_u16::<LittleEndian>()?);
			}
		}
		MrcMode::Float32 => data.read_f32_into::<LittleEndian>(&mut values)?,
	}
	Ok(values)
}

impl Volume3D {
	/// Read an MRC map from any byte stream.
	///
	/// Supports little-endian modes 0, 1, 2 and 6 in the standard column,
	/// row, section axis order.
	pub fn read_mrc<R: Read>(reader: &mut R) -> Result<Self> {
		let header = MRCHeader::read_from(reader).context("failed to read MRC header")?;
		if header.mach[0] == 0x11 {
			bail!("big-endian MRC files are not supported");
		}
		if header.map != MRC_MAP_ID {
			warn!(map = ?header.map, "MRC header lacks the MAP identifier");
		}
		if (header.mapc, header.mapr, header.maps) != (1, 2, 3) {
			bail!(
				"unsupported MRC axis order ({}, {}, {}); expected (1, 2, 3)",
				header.mapc,
				header.mapr,
				header.maps
			);
		}
		let Some(mode) = MrcMode::from_code(header.mode) else {
			bail!("unsupported MRC mode {}", header.mode);
		};
		let [len_i, len_j, len_k] = header.dims()?;

		if header.nsymbt > 0 {
			let skipped = io::copy(&mut reader.by_ref().take(header.nsymbt as u64), &mut io::sink())?;
			if skipped != header.nsymbt as u64 {
				bail!("MRC extended header truncated");
			}
		}

		let Some(count) = len_i.checked_mul(len_j).and_then(|n| n.checked_mul(len_k)) else {
			bail!("MRC dimensions {len_i} x {len_j} x {len_k} overflow");
		};
		let values = read_values(reader, mode, count)?;

		let mut volume = Volume3D::from_vec(len_i, len_j, len_k, values)?;
		volume.grid_size = header.voxel_size();
		volume.x_shift = header.xorigin;
		volume.y_shift = header.yorigin;
		volume.z_shift = header.zorigin;
		Ok(volume)
	}

	/// Read an MRC file; paths ending in `.gz` are decompressed on the fly.
	pub fn read_mrc_file(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let start_time = Instant::now();
		let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
		let gzipped = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

		let volume = if gzipped {
			Self::read_mrc(&mut BufReader::new(GzDecoder::new(file)))
		} else {
			Self::read_mrc(&mut BufReader::new(file))
		}
		.with_context(|| format!("failed to load {}", path.display()))?;

		info!(
			path = %path.display(),
			dims = ?volume.dims(),
			grid_size = volume.grid_size,
			seconds = start_time.elapsed().as_secs_f64(),
			"MRC volume loaded"
		);
		Ok(volume)
	}
}
