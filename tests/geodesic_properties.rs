use approx::assert_relative_eq;
use proptest::prelude::*;

use voxel_geodesic::geodesic::voxel::{NEIGHBOR_OFFSETS, SQRT_3};
use voxel_geodesic::{
	CombineRule, CostField, CostPolicy, GeodesicError, GeodesicSearch, Volume3D, Voxel, geodesic_path,
	path_cost,
};

/// Optimal 26-connected cost between two voxels on a unit-cost field.
fn lattice_cost(a: Voxel, b: Voxel) -> f64 {
	let mut d = [a.i.abs_diff(b.i), a.j.abs_diff(b.j), a.k.abs_diff(b.k)];
	d.sort_unstable();
	let [small, mid, large] = d.map(|x| x as f64);
	small * SQRT_3 + (mid - small) * std::f64::consts::SQRT_2 + (large - mid)
}

/// Exhaustive Bellman-Ford relaxation over every voxel; independent of the
/// heap-based search.
fn brute_force_costs(field: &CostField<'_>, start: Voxel) -> Vec<f64> {
	let dims = field.dims();
	let total = dims.iter().product::<usize>();
	let mut dist = vec![f64::INFINITY; total];
	dist[start.linear_index(dims)] = 0.0;
	loop {
		let mut changed = false;
		for idx in 0..total {
			if !dist[idx].is_finite() {
				continue;
			}
			let here = Voxel::from_linear_index(idx, dims);
			for &offset in &NEIGHBOR_OFFSETS {
				let Some(next) = here.offset(offset) else { continue };
				if !field.in_bounds(next) {
					continue;
				}
				if let Ok(Some(w)) = field.edge_weight(here, next) {
					let n = next.linear_index(dims);
					if dist[idx] + w < dist[n] - 1e-12 {
						dist[n] = dist[idx] + w;
						changed = true;
					}
				}
			}
		}
		if !changed {
			return dist;
		}
	}
}

fn assert_valid_path(field: &CostField<'_>, path: &[Voxel], start: Voxel, goal: Voxel) {
	assert_eq!(path.first(), Some(&start));
	assert_eq!(path.last(), Some(&goal));
	for pair in path.windows(2) {
		assert!(pair[0].is_adjacent(&pair[1]), "{} -> {} not adjacent", pair[0], pair[1]);
	}
	for v in path {
		assert!(field.is_traversable(*v), "{v} is not traversable");
	}
}

#[test]
fn uniform_field_matches_lattice_metric() {
	let vol = Volume3D::new(5, 5, 5, 1.0);
	let field = CostField::with_default_policy(&vol).unwrap();
	let search = GeodesicSearch::new(field);
	let start = Voxel::new(0, 1, 4);
	for idx in 0..vol.total_voxels {
		let goal = Voxel::from_linear_index(idx, vol.dims());
		let path = search.find_path(start, goal).unwrap();
		assert_valid_path(&field, &path.voxels, start, goal);
		assert_eq!(path.steps(), start.chebyshev_distance(&goal), "goal {goal}");
		assert_relative_eq!(path.cost, lattice_cost(start, goal), epsilon = 1e-9);
	}
}

#[test]
fn diagonal_example_from_the_docs() {
	let vol = Volume3D::new(3, 3, 3, 1.0);
	let path = geodesic_path(Voxel::new(0, 0, 0), Voxel::new(2, 2, 2), &vol).unwrap();
	assert_eq!(path, vec![Voxel::new(0, 0, 0), Voxel::new(1, 1, 1), Voxel::new(2, 2, 2)]);
	let field = CostField::with_default_policy(&vol).unwrap();
	assert_relative_eq!(path_cost(&field, &path).unwrap(), 2.0 * SQRT_3);
}

#[test]
fn single_voxel_path_for_every_traversable_voxel() {
	let vol = Volume3D::from_fn(3, 3, 3, |v| if (v.i + v.j + v.k) % 2 == 0 { 1.0 } else { 0.0 });
	let field = CostField::with_default_policy(&vol).unwrap();
	for idx in 0..vol.total_voxels {
		let p = Voxel::from_linear_index(idx, vol.dims());
		let result = geodesic_path(p, p, &vol);
		if field.is_traversable(p) {
			assert_eq!(result, Ok(vec![p]));
		} else {
			assert!(matches!(result, Err(GeodesicError::InvalidEndpoint { .. })));
		}
	}
}

#[test]
fn separated_regions_are_unreachable() {
	// Two slabs separated by a background plane at k = 3.
	let mut vol = Volume3D::new(6, 6, 7, 1.0);
	vol.fill_box(Voxel::new(0, 0, 3), Voxel::new(5, 5, 3), 0.0);
	let result = geodesic_path(Voxel::new(1, 1, 0), Voxel::new(4, 4, 6), &vol);
	match result {
		Err(GeodesicError::Unreachable { start, goal, visited }) => {
			assert_eq!(start, Voxel::new(1, 1, 0));
			assert_eq!(goal, Voxel::new(4, 4, 6));
			assert_eq!(visited, 6 * 6 * 3);
		}
		other => panic!("expected Unreachable, got {other:?}"),
	}
}

#[test]
fn diagonal_gap_in_a_wall_is_passable() {
	// 26-connectivity lets the path slip through a corner-touching gap.
	let mut vol = Volume3D::new(3, 3, 3, 0.0);
	vol.set(Voxel::new(0, 0, 0), 1.0);
	vol.set(Voxel::new(1, 1, 1), 1.0);
	vol.set(Voxel::new(2, 2, 2), 1.0);
	let path = geodesic_path(Voxel::new(0, 0, 0), Voxel::new(2, 2, 2), &vol).unwrap();
	assert_eq!(path.len(), 3);
}

#[test]
fn repeated_runs_are_identical() {
	let vol = Volume3D::from_fn(8, 8, 8, |v| {
		if v.i == 4 && v.j < 7 {
			0.0
		} else {
			1.0 + ((v.i * 5 + v.j * 3 + v.k * 7) % 3) as f32
		}
	});
	let runs: Vec<Vec<Voxel>> = (0..4)
		.map(|_| geodesic_path(Voxel::new(0, 0, 0), Voxel::new(7, 0, 7), &vol).unwrap())
		.collect();
	assert!(runs.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn max_rule_never_cheaper_than_mean() {
	let vol = Volume3D::from_fn(6, 6, 6, |v| 1.0 + ((v.i * v.j + v.k) % 5) as f32);
	let (start, goal) = (Voxel::new(0, 0, 0), Voxel::new(5, 5, 5));
	let mean = CostField::new(&vol, CostPolicy::default()).unwrap();
	let max = CostField::new(&vol, CostPolicy::default().with_combine(CombineRule::Max)).unwrap();
	let mean_cost = GeodesicSearch::new(mean).find_path(start, goal).unwrap().cost;
	let max_cost = GeodesicSearch::new(max).find_path(start, goal).unwrap().cost;
	assert!(max_cost >= mean_cost);
}

#[test]
fn raising_the_threshold_closes_passages() {
	// A low-value bridge across the middle of a high-value slab wall.
	let mut vol = Volume3D::new(5, 5, 5, 2.0);
	vol.fill_box(Voxel::new(2, 0, 0), Voxel::new(2, 4, 4), 0.0);
	vol.set(Voxel::new(2, 2, 2), 0.4);
	let (start, goal) = (Voxel::new(0, 2, 2), Voxel::new(4, 2, 2));

	let open = CostField::new(&vol, CostPolicy::default()).unwrap();
	let path = GeodesicSearch::new(open).find_path(start, goal).unwrap();
	assert!(path.voxels.contains(&Voxel::new(2, 2, 2)));

	let closed = CostField::new(&vol, CostPolicy::default().with_threshold(0.5)).unwrap();
	assert!(matches!(
		GeodesicSearch::new(closed).find_path(start, goal),
		Err(GeodesicError::Unreachable { .. })
	));
}

fn mask_value() -> impl Strategy<Value = f32> {
	prop_oneof![
		1 => Just(0.0f32),
		1 => Just(1.0f32),
		2 => 0.1f32..8.0,
	]
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	#[test]
	fn search_is_optimal_against_brute_force(
		values in prop::collection::vec(mask_value(), 125),
		start_idx in 0usize..125,
		goal_idx in 0usize..125,
		max_rule in any::<bool>(),
	) {
		let vol = Volume3D::from_vec(5, 5, 5, values).unwrap();
		let combine = if max_rule { CombineRule::Max } else { CombineRule::Mean };
		let field = CostField::new(&vol, CostPolicy::default().with_combine(combine)).unwrap();
		let start = Voxel::from_linear_index(start_idx, vol.dims());
		let goal = Voxel::from_linear_index(goal_idx, vol.dims());

		let result = GeodesicSearch::new(field).find_path(start, goal);
		if !field.is_traversable(start) || !field.is_traversable(goal) {
			let is_invalid_endpoint = matches!(result, Err(GeodesicError::InvalidEndpoint { .. }));
			prop_assert!(is_invalid_endpoint);
			return Ok(());
		}

		let best = brute_force_costs(&field, start)[goal.linear_index(vol.dims())];
		match result {
			Ok(path) => {
				prop_assert!(best.is_finite());
				assert_valid_path(&field, &path.voxels, start, goal);
				prop_assert!((path.cost - best).abs() <= 1e-9 * best.max(1.0));
				let recomputed = path_cost(&field, &path.voxels).unwrap();
				prop_assert!((recomputed - path.cost).abs() <= 1e-9 * best.max(1.0));
			}
			Err(GeodesicError::Unreachable { .. }) => prop_assert!(best.is_infinite()),
			Err(other) => prop_assert!(false, "unexpected error {}", other),
		}
	}
}
