use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::geodesic::error::GeodesicError;

/// Centre-to-centre length of a step that changes all three axes.
pub const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// The 26 lattice offsets in canonical order: di, then dj, then dk, each
/// running -1, 0, +1, with the origin skipped.
///
/// Every neighbour walk in the crate goes through this table so that equal-cost
/// ties resolve the same way on every run.
pub const NEIGHBOR_OFFSETS: [[isize; 3]; 26] = build_offsets();

const fn build_offsets() -> [[isize; 3]; 26] {
	let mut out = [[0isize; 3]; 26];
	let mut n = 0;
	let mut di = -1;
	while di <= 1 {
		let mut dj = -1;
		while dj <= 1 {
			let mut dk = -1;
			while dk <= 1 {
				if !(di == 0 && dj == 0 && dk == 0) {
					out[n] = [di, dj, dk];
					n += 1;
				}
				dk += 1;
			}
			dj += 1;
		}
		di += 1;
	}
	out
}

/// Euclidean length of a lattice step, by how many axes it changes.
#[inline]
pub fn step_length(offset: [isize; 3]) -> f64 {
	match offset.iter().filter(|&&d| d != 0).count() {
		0 => 0.0,
		1 => 1.0,
		2 => std::f64::consts::SQRT_2,
		_ => SQRT_3,
	}
}

/// Integer voxel coordinate (i, j, k). Doubles as graph node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Voxel {
	pub i: usize,
	pub j: usize,
	pub k: usize,
}

impl Voxel {
	#[inline]
	pub const fn new(i: usize, j: usize, k: usize) -> Self {
		Self { i, j, k }
	}

	/// Signed view, used when reporting out-of-range coordinates.
	#[inline]
	pub fn as_signed(&self) -> [i64; 3] {
		[self.i as i64, self.j as i64, self.k as i64]
	}

	/// Linear index with I varying fastest, matching the voxel grid layout.
	#[inline]
	pub fn linear_index(&self, dims: [usize; 3]) -> usize {
		self.i + self.j * dims[0] + self.k * dims[0] * dims[1]
	}

	#[inline]
	pub fn from_linear_index(index: usize, dims: [usize; 3]) -> Self {
		let plane = dims[0] * dims[1];
		Self::new(index % dims[0], (index % plane) / dims[0], index / plane)
	}

	/// Shift by a lattice offset. `None` if any component would go negative.
	#[inline]
	pub fn offset(&self, delta: [isize; 3]) -> Option<Self> {
		Some(Self::new(
			self.i.checked_add_signed(delta[0])?,
			self.j.checked_add_signed(delta[1])?,
			self.k.checked_add_signed(delta[2])?,
		))
	}

	/// Per-axis difference `other - self`.
	#[inline]
	pub fn delta_to(&self, other: &Self) -> [isize; 3] {
		[
			other.i as isize - self.i as isize,
			other.j as isize - self.j as isize,
			other.k as isize - self.k as isize,
		]
	}

	/// Chebyshev distance: the fewest 26-connected steps between two voxels.
	pub fn chebyshev_distance(&self, other: &Self) -> usize {
		self.i
			.abs_diff(other.i)
			.max(self.j.abs_diff(other.j))
			.max(self.k.abs_diff(other.k))
	}

	/// True when the voxels differ by at most one along every axis and are not
	/// the same voxel.
	#[inline]
	pub fn is_adjacent(&self, other: &Self) -> bool {
		self.chebyshev_distance(other) == 1
	}
}

impl From<(usize, usize, usize)> for Voxel {
	fn from((i, j, k): (usize, usize, usize)) -> Self {
		Self::new(i, j, k)
	}
}

impl From<[usize; 3]> for Voxel {
	fn from([i, j, k]: [usize; 3]) -> Self {
		Self::new(i, j, k)
	}
}

impl From<Voxel> for (usize, usize, usize) {
	fn from(v: Voxel) -> Self {
		(v.i, v.j, v.k)
	}
}

impl fmt::Display for Voxel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "({}, {}, {})", self.i, self.j, self.k)
	}
}

fn voxel_pattern() -> Option<&'static Regex> {
	static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
	PATTERN
		.get_or_init(|| {
			Regex::new(r"^\s*[(\[]?\s*(\d+)\s*[,\s]\s*(\d+)\s*[,\s]\s*(\d+)\s*[)\]]?\s*$").ok()
		})
		.as_ref()
}

/// Accepts `12,40,7`, `12 40 7`, `(12, 40, 7)` and `[12, 40, 7]`.
impl FromStr for Voxel {
	type Err = GeodesicError;

	fn from_str(text: &str) -> Result<Self, Self::Err> {
		let invalid = || GeodesicError::InvalidVoxelText(text.to_string());
		let caps = voxel_pattern()
			.and_then(|re| re.captures(text))
			.ok_or_else(invalid)?;
		let mut parts = [0usize; 3];
		for (slot, part) in parts.iter_mut().zip(1..=3) {
			*slot = caps[part].parse().map_err(|_| invalid())?;
		}
		Ok(Self::from(parts))
	}
}
