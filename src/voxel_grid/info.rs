use std::env;
use std::sync::Once;

use tracing::info;

/// Executable name, or "voxel_geodesic" if it cannot be determined
pub fn program_name() -> String {
	env::current_exe()
		.ok()
		.as_ref()
		.and_then(|path| path.file_name())
		.and_then(|name| name.to_str())
		.unwrap_or(env!("CARGO_PKG_NAME"))
		.to_string()
}

/// Compile date and time stamped by build.rs
pub fn build_stamp() -> String {
	format!("{} at {}", env!("COMPILE_DATE"), env!("COMPILE_TIME"))
}

/// Log program and build information (only logs once)
pub fn log_build_info() {
	static LOG_BUILD_ONCE: Once = Once::new();
	LOG_BUILD_ONCE.call_once(|| {
		info!(
			program = %program_name(),
			version = env!("CARGO_PKG_VERSION"),
			compiled = %build_stamp(),
			"voxel geodesic path finder"
		);
	});
}
