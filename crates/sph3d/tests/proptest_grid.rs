//! Property-based tests for the spatial grid and solver bookkeeping
//!
//! These tests verify invariants across random layouts:
//! - Every true neighbor is among the 1-ring candidates
//! - Each particle sits in exactly one bucket, the one its position maps to
//! - Positions stay finite and inside the container while stepping

use glam::Vec3;
use proptest::prelude::*;
use sph3d::{BoundingBox, BoxContainer, SpatialGrid, SphParams, SphSolver};

const EXTENT: f32 = 1.0;
const SIMULATION_STEPS: usize = 5;

fn point() -> impl Strategy<Value = Vec3> {
    (0.0f32..EXTENT, 0.0f32..EXTENT, 0.0f32..EXTENT).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_neighbors_complete(
        points in prop::collection::vec(point(), 2..120),
        h in 0.05f32..0.3,
    ) {
        let bounds = BoundingBox::new(Vec3::ZERO, Vec3::splat(EXTENT));
        let [nx, ny, nz] = SpatialGrid::fitted_dims(&bounds, h);
        let mut grid = SpatialGrid::new(bounds, nx, ny, nz, h).unwrap();

        let cells: Vec<usize> = points.iter().map(|&p| grid.cell_index(p)).collect();
        for (i, &cell) in cells.iter().enumerate() {
            grid.add_particle(cell, i);
        }

        for (i, &pi) in points.iter().enumerate() {
            let candidates: Vec<usize> = grid.neighbors(cells[i]).collect();
            for (j, &pj) in points.iter().enumerate() {
                if (pi - pj).length_squared() < h * h {
                    prop_assert!(candidates.contains(&j), "{} misses {}", i, j);
                }
            }
        }
    }

    #[test]
    fn prop_cell_index_in_range(
        p in (-5.0f32..5.0, -5.0f32..5.0, -5.0f32..5.0),
    ) {
        let bounds = BoundingBox::new(Vec3::ZERO, Vec3::splat(EXTENT));
        let grid = SpatialGrid::new(bounds, 4, 5, 6, 0.1).unwrap();
        let index = grid.cell_index(Vec3::new(p.0, p.1, p.2));
        prop_assert!(index < grid.cell_count());
    }

    #[test]
    fn prop_remove_then_add_keeps_single_membership(
        moves in prop::collection::vec((0usize..20, point()), 1..40),
    ) {
        let bounds = BoundingBox::new(Vec3::ZERO, Vec3::splat(EXTENT));
        let mut grid = SpatialGrid::new(bounds, 5, 5, 5, 0.2).unwrap();
        let mut cells = vec![0usize; 20];
        for (i, cell) in cells.iter().enumerate() {
            grid.add_particle(*cell, i);
        }

        for (particle, position) in moves {
            let next = grid.cell_index(position);
            let current = cells[particle];
            if next != current {
                prop_assert!(grid.remove_particle(current, particle));
                grid.add_particle(next, particle);
                cells[particle] = next;
            }
        }

        let mut count = vec![0usize; 20];
        for cell in 0..grid.cell_count() {
            for &p in grid.cell_particles(cell) {
                prop_assert_eq!(cells[p], cell);
                count[p] += 1;
            }
        }
        prop_assert!(count.iter().all(|&c| c == 1));
    }

    #[test]
    fn prop_solver_keeps_particles_contained(
        seed in any::<u64>(),
        count in 20usize..120,
    ) {
        let params = SphParams {
            particle_count: count,
            grid_cells: [7, 7, 7],
            seed,
            ..Default::default()
        };
        let container = BoxContainer::new(Vec3::ZERO, Vec3::splat(EXTENT));
        let mut solver = SphSolver::new(Box::new(container), params).unwrap();

        for _ in 0..SIMULATION_STEPS {
            solver.step(1.0 / 60.0);
        }

        let grid = solver.grid();
        for (i, p) in solver.particles().iter().enumerate() {
            prop_assert!(p.position.is_finite(), "particle {} NaN", i);
            prop_assert!(
                p.position.cmpge(Vec3::ZERO).all() && p.position.cmple(Vec3::splat(EXTENT)).all(),
                "particle {} escaped to {:?}", i, p.position
            );
            prop_assert_eq!(p.cell_index, grid.cell_index(p.position));
        }
    }
}
