//! Uniform spatial grid for SPH neighbor search.

use glam::Vec3;

use crate::error::{SphError, SphResult};
use crate::geometry::BoundingBox;

/// Uniform grid of particle buckets over a bounding box.
///
/// Every cell is at least one smoothing radius wide along each axis, so any two
/// particles closer than the radius sit in the same cell or in adjacent ones.
/// Neighbor queries therefore only scan the 1-ring returned by [`Self::neighborhood`].
///
/// Cells are flattened with x fastest: `index = k * nx * ny + j * nx + i`.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    bounds: BoundingBox,
    /// Number of cells in X direction
    pub nx: usize,
    /// Number of cells in Y direction
    pub ny: usize,
    /// Number of cells in Z direction
    pub nz: usize,
    /// Extent of one cell along each axis
    cell_size: Vec3,

    /// Particle indices per cell (unordered, no duplicates)
    cells: Vec<Vec<usize>>,

    /// 1-ring cell indices per cell, including the cell itself
    neighborhoods: Vec<Vec<usize>>,
}

impl SpatialGrid {
    /// Create a grid with `nx * ny * nz` cells covering `bounds`.
    ///
    /// Fails if any count is zero or if a cell would be narrower than `smoothing_radius`.
    pub fn new(
        bounds: BoundingBox,
        nx: usize,
        ny: usize,
        nz: usize,
        smoothing_radius: f32,
    ) -> SphResult<Self> {
        if !(smoothing_radius > 0.0 && smoothing_radius.is_finite()) {
            return Err(SphError::InvalidSmoothingRadius(smoothing_radius));
        }
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(SphError::EmptyGrid { nx, ny, nz });
        }
        let bounds = bounds.validated()?;

        let cell_size = bounds.extent() / Vec3::new(nx as f32, ny as f32, nz as f32);
        for (axis, size) in [('x', cell_size.x), ('y', cell_size.y), ('z', cell_size.z)] {
            if size < smoothing_radius {
                return Err(SphError::CellSmallerThanRadius {
                    axis,
                    cell_size: size,
                    radius: smoothing_radius,
                });
            }
        }

        let mut grid = Self {
            bounds,
            nx,
            ny,
            nz,
            cell_size,
            cells: vec![Vec::new(); nx * ny * nz],
            neighborhoods: Vec::with_capacity(nx * ny * nz),
        };
        grid.build_neighborhoods();
        Ok(grid)
    }

    /// Largest cell counts that still keep every cell at least `smoothing_radius` wide.
    pub fn fitted_dims(bounds: &BoundingBox, smoothing_radius: f32) -> [usize; 3] {
        let extent = bounds.extent();
        [extent.x, extent.y, extent.z].map(|length| {
            let mut count = ((length / smoothing_radius).floor() as usize).max(1);
            // Division can round a cell just under the radius
            while count > 1 && length / (count as f32) < smoothing_radius {
                count -= 1;
            }
            count
        })
    }

    fn build_neighborhoods(&mut self) {
        for k in 0..self.nz {
            for j in 0..self.ny {
                for i in 0..self.nx {
                    let mut ring = Vec::with_capacity(27);
                    for nk in k.saturating_sub(1)..=(k + 1).min(self.nz - 1) {
                        for nj in j.saturating_sub(1)..=(j + 1).min(self.ny - 1) {
                            for ni in i.saturating_sub(1)..=(i + 1).min(self.nx - 1) {
                                ring.push(self.flatten(ni, nj, nk));
                            }
                        }
                    }
                    self.neighborhoods.push(ring);
                }
            }
        }
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn cell_size(&self) -> Vec3 {
        self.cell_size
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    // ========== Index functions ==========

    /// Flattened index of cell (i, j, k).
    #[inline]
    pub fn flatten(&self, i: usize, j: usize, k: usize) -> usize {
        k * self.nx * self.ny + j * self.nx + i
    }

    /// Cell coordinates of a world position, clamped into the grid.
    ///
    /// Positions slightly outside the bounds (wall slack) land in the nearest edge cell.
    #[inline]
    pub fn cell_coords(&self, position: Vec3) -> (usize, usize, usize) {
        let scaled = ((position - self.bounds.min) / self.cell_size).floor();
        let clamp = |v: f32, n: usize| -> usize {
            if v.is_nan() || v < 0.0 {
                0
            } else {
                (v as usize).min(n - 1)
            }
        };
        (
            clamp(scaled.x, self.nx),
            clamp(scaled.y, self.ny),
            clamp(scaled.z, self.nz),
        )
    }

    /// Flattened cell index of a world position.
    #[inline]
    pub fn cell_index(&self, position: Vec3) -> usize {
        let (i, j, k) = self.cell_coords(position);
        self.flatten(i, j, k)
    }

    // ========== Queries ==========

    /// The cell and its up-to-26 neighbors.
    #[inline]
    pub fn neighborhood(&self, cell: usize) -> &[usize] {
        &self.neighborhoods[cell]
    }

    /// Particle indices currently bucketed in `cell`.
    #[inline]
    pub fn cell_particles(&self, cell: usize) -> &[usize] {
        &self.cells[cell]
    }

    /// Iterate over every particle index in the 1-ring of `cell`.
    pub fn neighbors(&self, cell: usize) -> impl Iterator<Item = usize> + '_ {
        self.neighborhoods[cell]
            .iter()
            .flat_map(move |&c| self.cells[c].iter().copied())
    }

    // ========== Membership ==========

    pub fn add_particle(&mut self, cell: usize, particle: usize) {
        debug_assert!(
            !self.cells[cell].contains(&particle),
            "particle {} already in cell {}",
            particle,
            cell
        );
        self.cells[cell].push(particle);
    }

    /// Remove `particle` from `cell` by value. Order of the remaining entries is not kept.
    ///
    /// Returns false if the particle was not in that cell.
    pub fn remove_particle(&mut self, cell: usize, particle: usize) -> bool {
        let bucket = &mut self.cells[cell];
        match bucket.iter().position(|&p| p == particle) {
            Some(slot) => {
                bucket.swap_remove(slot);
                true
            }
            None => false,
        }
    }

    /// Empty every cell.
    pub fn clear(&mut self) {
        for bucket in &mut self.cells {
            bucket.clear();
        }
    }
}
