pub mod geodesic {
	pub mod voxel;
	pub mod policy;
	pub mod error;
	pub mod cost_field;
	pub mod distance;
	pub mod search;
}
pub mod voxel_grid {
	pub mod info;
	pub mod volume;
	pub mod grid;
	pub mod manip;
	pub mod utils;
	pub mod mrc_input;
	pub mod mrc_output;
}

pub use geodesic::cost_field::CostField;
pub use geodesic::distance::DistanceMap;
pub use geodesic::error::{EndpointRole, GeodesicError, GeodesicResult, ImpassableReason};
pub use geodesic::policy::{CombineRule, CostPolicy};
pub use geodesic::search::{
	GeodesicPath, GeodesicSearch, SearchStats, find_paths_parallel, geodesic_path,
	geodesic_path_with_policy, path_cost,
};
pub use geodesic::voxel::Voxel;
pub use voxel_grid::grid::Grid3D;
pub use voxel_grid::volume::Volume3D;
