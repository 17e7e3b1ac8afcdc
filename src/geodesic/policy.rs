//! Traversability and edge-cost configuration.

use std::fmt;
use std::str::FromStr;

use crate::geodesic::error::{GeodesicError, GeodesicResult};

/// How the costs of two adjacent voxels combine into an edge weight factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombineRule {
	/// Arithmetic mean of both endpoint costs.
	#[default]
	Mean,
	/// The larger of the two endpoint costs.
	Max,
}

impl CombineRule {
	#[inline]
	pub fn combine(self, a: f64, b: f64) -> f64 {
		match self {
			Self::Mean => 0.5 * (a + b),
			Self::Max => a.max(b),
		}
	}
}

impl fmt::Display for CombineRule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Mean => f.write_str("mean"),
			Self::Max => f.write_str("max"),
		}
	}
}

impl FromStr for CombineRule {
	type Err = GeodesicError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"mean" | "avg" | "average" => Ok(Self::Mean),
			"max" => Ok(Self::Max),
			other => Err(GeodesicError::InvalidPolicy(format!(
				"unknown combine rule {other:?} (expected mean or max)"
			))),
		}
	}
}

/// Rules that turn mask values into traversal costs.
///
/// A voxel is impassable when its value is at or below `impassable_threshold`
/// or is not finite. Every other voxel costs its own value, and an edge costs
/// the Euclidean step length times `combine` applied to both endpoint costs.
///
/// ```
/// use voxel_geodesic::{CombineRule, CostPolicy};
///
/// let policy = CostPolicy::default();
/// assert_eq!(policy.impassable_threshold, 0.0);
/// assert_eq!(policy.combine, CombineRule::Mean);
///
/// let strict = CostPolicy::default().with_threshold(0.5).with_combine(CombineRule::Max);
/// assert!(strict.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostPolicy {
	/// Values at or below this mark background. Must be finite and >= 0 so
	/// that every traversable voxel has a strictly positive cost.
	pub impassable_threshold: f64,

	/// Endpoint cost combination for edges.
	pub combine: CombineRule,
}

impl Default for CostPolicy {
	fn default() -> Self {
		Self {
			impassable_threshold: 0.0, // binary masks: 0 is background
			combine: CombineRule::Mean,
		}
	}
}

impl CostPolicy {
	#[must_use]
	pub const fn with_threshold(mut self, threshold: f64) -> Self {
		self.impassable_threshold = threshold;
		self
	}

	#[must_use]
	pub const fn with_combine(mut self, combine: CombineRule) -> Self {
		self.combine = combine;
		self
	}

	/// Reject thresholds that would admit zero or negative costs.
	pub fn validate(&self) -> GeodesicResult<()> {
		let t = self.impassable_threshold;
		if !t.is_finite() || t < 0.0 {
			return Err(GeodesicError::InvalidPolicy(format!(
				"impassable threshold must be finite and >= 0, got {t}"
			)));
		}
		Ok(())
	}

	/// True when a raw mask value may be entered.
	#[inline]
	pub fn admits(&self, value: f64) -> bool {
		value.is_finite() && value > self.impassable_threshold
	}
}
