use thiserror::Error;

/// Errors raised while building a simulation or loading a scene.
///
/// Per-step numeric trouble (unconverged wall collisions, empty correction sums)
/// is contained inside the solver and never surfaces here.
#[derive(Error, Debug)]
pub enum SphError {
    #[error("smoothing radius must be positive and finite, got {0}")]
    InvalidSmoothingRadius(f32),

    #[error("grid cell size along {axis} is {cell_size}, smaller than the smoothing radius {radius}")]
    CellSmallerThanRadius {
        axis: char,
        cell_size: f32,
        radius: f32,
    },

    #[error("grid needs at least one cell per axis, got {nx}x{ny}x{nz}")]
    EmptyGrid { nx: usize, ny: usize, nz: usize },

    #[error("lattice needs at least one cube per axis, got {nx}x{ny}x{nz}")]
    EmptyLattice { nx: usize, ny: usize, nz: usize },

    #[error("particle count must be at least one")]
    NoParticles,

    #[error("invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    #[error("bounding box has no volume")]
    DegenerateBounds,

    #[error("scene file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("scene file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SphResult<T> = Result<T, SphError>;
