//! A fluid body: solver plus surface extractor, with a switchable render mode.

use crate::error::SphResult;
use crate::geometry::Container;
use crate::marching::{Mesh, SurfaceExtractor};
use crate::params::SphParams;
use crate::particle::Particle;
use crate::solver::{SphSolver, StepReport};

/// What a renderer should draw for the fluid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Raw particles
    #[default]
    Particles,
    /// Polygonized density surface
    ImplicitSurface,
}

/// Geometry handed to the renderer for one frame.
pub enum Frame<'a> {
    Particles(&'a [Particle]),
    Surface(&'a Mesh),
}

/// Solver and extractor sharing one domain.
pub struct FluidBody {
    solver: SphSolver,
    extractor: SurfaceExtractor,
    render_mode: RenderMode,
}

impl FluidBody {
    pub fn new(container: Box<dyn Container>, params: SphParams) -> SphResult<Self> {
        let solver = SphSolver::new(container, params)?;
        Self::from_solver(solver)
    }

    /// Wrap an existing solver, sizing the lattice from its `lattice_cubes`.
    pub fn from_solver(solver: SphSolver) -> SphResult<Self> {
        let [nx, ny, nz] = solver.params().lattice_cubes;
        let extractor = SurfaceExtractor::new(*solver.domain(), nx, ny, nz)?;
        Ok(Self {
            solver,
            extractor,
            render_mode: RenderMode::default(),
        })
    }

    pub fn solver(&self) -> &SphSolver {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut SphSolver {
        &mut self.solver
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.render_mode = mode;
    }

    pub fn toggle_render_mode(&mut self) -> RenderMode {
        self.render_mode = match self.render_mode {
            RenderMode::Particles => RenderMode::ImplicitSurface,
            RenderMode::ImplicitSurface => RenderMode::Particles,
        };
        self.render_mode
    }

    /// Advance by the wall-clock time since the last frame.
    pub fn animate(&mut self, elapsed: f32) -> StepReport {
        self.solver.step(elapsed)
    }

    /// Produce render geometry for the current mode. Surface mode re-extracts the mesh.
    pub fn frame(&mut self) -> Frame<'_> {
        match self.render_mode {
            RenderMode::Particles => Frame::Particles(self.solver.particles().as_slice()),
            RenderMode::ImplicitSurface => Frame::Surface(self.extractor.extract(&self.solver)),
        }
    }

    /// Extract the surface regardless of render mode.
    pub fn surface(&mut self) -> &Mesh {
        self.extractor.extract(&self.solver)
    }
}
