//! Neighbor search tests
//!
//! Every pair of particles closer than the smoothing radius must see each other
//! through the 1-ring of cells, and grid buckets must always match particle cells.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sph3d::{BoundingBox, BoxContainer, SpatialGrid, SphParams, SphSolver, SphereContainer, Vec3};

fn random_points(count: usize, bounds: &BoundingBox, seed: u64) -> Vec<Vec3> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            Vec3::new(
                rng.gen_range(bounds.min.x..bounds.max.x),
                rng.gen_range(bounds.min.y..bounds.max.y),
                rng.gen_range(bounds.min.z..bounds.max.z),
            )
        })
        .collect()
}

/// Brute force check that the grid query covers all true neighbors
fn assert_complete(grid: &SpatialGrid, positions: &[Vec3], cells: &[usize], h: f32) {
    for (i, &pi) in positions.iter().enumerate() {
        let candidates: Vec<usize> = grid.neighbors(cells[i]).collect();
        for (j, &pj) in positions.iter().enumerate() {
            if (pi - pj).length_squared() < h * h {
                assert!(
                    candidates.contains(&j),
                    "particle {} at {:?} misses neighbor {} at {:?}",
                    i,
                    pi,
                    j,
                    pj
                );
            }
        }
    }
}

#[test]
fn test_grid_query_is_complete() {
    let bounds = BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0));
    let h = 0.25;
    let mut grid = SpatialGrid::new(bounds, 8, 8, 8, h).unwrap();

    let positions = random_points(600, &bounds, 7);
    let cells: Vec<usize> = positions.iter().map(|&p| grid.cell_index(p)).collect();
    for (i, &cell) in cells.iter().enumerate() {
        grid.add_particle(cell, i);
    }

    assert_complete(&grid, &positions, &cells, h);
}

#[test]
fn test_coarse_grid_is_still_complete() {
    // Cells much wider than h only cost extra candidates
    let bounds = BoundingBox::new(Vec3::ZERO, Vec3::new(3.0, 1.0, 2.0));
    let h = 0.2;
    let mut grid = SpatialGrid::new(bounds, 3, 2, 2, h).unwrap();

    let positions = random_points(300, &bounds, 11);
    let cells: Vec<usize> = positions.iter().map(|&p| grid.cell_index(p)).collect();
    for (i, &cell) in cells.iter().enumerate() {
        grid.add_particle(cell, i);
    }

    assert_complete(&grid, &positions, &cells, h);
}

#[test]
fn test_each_particle_in_exactly_one_bucket() {
    let params = SphParams {
        particle_count: 400,
        ..Default::default()
    };
    let solver = SphSolver::new(Box::new(SphereContainer::new(Vec3::ZERO, 1.0)), params).unwrap();
    let grid = solver.grid();

    let mut seen = vec![0usize; solver.particle_count()];
    for cell in 0..grid.cell_count() {
        for &p in grid.cell_particles(cell) {
            seen[p] += 1;
            assert_eq!(solver.particles()[p].cell_index, cell);
        }
    }
    assert!(seen.iter().all(|&n| n == 1), "bucket counts: {:?}", seen);
}

#[test]
fn test_grid_stays_consistent_while_stepping() {
    let params = SphParams {
        particle_count: 250,
        grid_cells: [9, 9, 9],
        seed: 3,
        ..Default::default()
    };
    let container = BoxContainer::new(Vec3::splat(-0.6), Vec3::splat(0.6));
    let mut solver = SphSolver::new(Box::new(container), params).unwrap();

    for _ in 0..20 {
        solver.step(0.01);

        let grid = solver.grid();
        let mut total = 0;
        for (i, particle) in solver.particles().iter().enumerate() {
            assert_eq!(
                particle.cell_index,
                grid.cell_index(particle.position),
                "particle {} holds a stale cell",
                i
            );
            assert!(grid.cell_particles(particle.cell_index).contains(&i));
        }
        for cell in 0..grid.cell_count() {
            total += grid.cell_particles(cell).len();
        }
        assert_eq!(total, solver.particle_count());
    }

    let positions = solver.particles().positions();
    let cells: Vec<usize> = solver.particles().iter().map(|p| p.cell_index).collect();
    assert_complete(solver.grid(), &positions, &cells, solver.kernels().h);
}
