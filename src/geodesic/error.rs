//! Error types for geodesic path search.

use std::fmt;

use thiserror::Error;

use crate::geodesic::voxel::Voxel;

/// Result type for geodesic operations.
pub type GeodesicResult<T> = Result<T, GeodesicError>;

/// Which end of a requested path failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
	Start,
	Goal,
}

impl fmt::Display for EndpointRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Start => f.write_str("start"),
			Self::Goal => f.write_str("goal"),
		}
	}
}

/// Why an endpoint cannot be used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImpassableReason {
	/// The voxel lies outside the volume.
	OutOfBounds,
	/// The voxel's mask value is at or below the impassable threshold.
	BelowThreshold { value: f64, threshold: f64 },
	/// The voxel holds NaN or an infinity.
	NonFinite,
}

impl fmt::Display for ImpassableReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::OutOfBounds => f.write_str("outside the volume"),
			Self::BelowThreshold { value, threshold } => {
				write!(f, "impassable (value {value} <= threshold {threshold})")
			}
			Self::NonFinite => f.write_str("impassable (non-finite value)"),
		}
	}
}

/// Errors that can occur while building a cost field or searching it.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeodesicError {
	/// A queried coordinate lies outside the volume.
	#[error("voxel {coords:?} is out of bounds for volume of shape {dims:?}")]
	OutOfBounds {
		/// Offending coordinate, signed so negative input can be reported.
		coords: [i64; 3],
		/// Volume shape (I, J, K).
		dims: [usize; 3],
	},

	/// Start or goal is outside the volume or not traversable.
	#[error("invalid {role} voxel {voxel}: {reason}")]
	InvalidEndpoint {
		role: EndpointRole,
		voxel: Voxel,
		reason: ImpassableReason,
	},

	/// The search frontier emptied before the goal was reached.
	#[error("goal {goal} is unreachable from {start} ({visited} voxels explored)")]
	Unreachable {
		start: Voxel,
		goal: Voxel,
		/// Number of voxels finalized before giving up.
		visited: usize,
	},

	/// An edge was requested between voxels that are not 26-adjacent.
	#[error("voxels {a} and {b} are not 26-adjacent")]
	NotAdjacent { a: Voxel, b: Voxel },

	/// Volume data length does not match its declared shape.
	#[error("volume of shape {dims:?} needs {expected} values, got {actual}")]
	ShapeMismatch {
		dims: [usize; 3],
		expected: usize,
		actual: usize,
	},

	/// Cost policy cannot guarantee non-negative edge weights.
	#[error("invalid cost policy: {0}")]
	InvalidPolicy(String),

	/// A caller-supplied path broke adjacency or traversability.
	#[error("invalid path at step {step}: {message}")]
	InvalidPath { step: usize, message: String },

	/// Text could not be parsed as `i,j,k`.
	#[error("cannot parse voxel coordinate from {0:?} (expected i,j,k)")]
	InvalidVoxelText(String),
}

impl GeodesicError {
	/// True for failures detected before any search work starts.
	pub fn is_precondition(&self) -> bool {
		!matches!(self, Self::Unreachable { .. })
	}
}
