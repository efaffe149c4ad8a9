//! Marching tetrahedra iso-surface extraction.
//!
//! The lattice is a regular grid of `(nx+1) x (ny+1) x (nz+1)` vertices over a
//! bounding box. Each lattice cube is split into six tetrahedra around its main
//! diagonal (corner 0 to corner 6), the same way in every cube, so neighboring
//! cubes agree on the diagonal of every shared face and the output has no cracks.
//!
//! Corner numbering of cube (x, y, z):
//!
//! ```text
//!       7-------6        0 = (x,   y,   z)     4 = (x,   y,   z+1)
//!      /|      /|        1 = (x+1, y,   z)     5 = (x+1, y,   z+1)
//!     4-------5 |        2 = (x+1, y+1, z)     6 = (x+1, y+1, z+1)
//!     | 3-----|-2        3 = (x,   y+1, z)     7 = (x,   y+1, z+1)
//!     |/      |/
//!     0-------1
//! ```
//!
//! A vertex is "inside" when its value is strictly positive. Emitted triangles are
//! wound counter-clockwise when seen from the outside.

use glam::Vec3;
use rayon::prelude::*;

use crate::error::{SphError, SphResult};
use crate::field::ImplicitField;
use crate::geometry::BoundingBox;

/// Six tetrahedra sharing the 0-6 diagonal.
const CUBE_TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 6, 1, 2],
    [0, 6, 2, 3],
    [0, 6, 3, 7],
    [0, 6, 7, 4],
    [0, 6, 4, 5],
    [0, 6, 5, 1],
];

/// Corner offsets matching the numbering in the module docs.
const CUBE_CORNERS: [(usize, usize, usize); 8] = [
    (0, 0, 0),
    (1, 0, 0),
    (1, 1, 0),
    (0, 1, 0),
    (0, 0, 1),
    (1, 0, 1),
    (1, 1, 1),
    (0, 1, 1),
];

/// One output triangle with per-vertex normals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub positions: [Vec3; 3],
    pub normals: [Vec3; 3],
}

impl Triangle {
    /// Unnormalized face normal following the winding order.
    pub fn face_normal(&self) -> Vec3 {
        let [a, b, c] = self.positions;
        (b - a).cross(c - a)
    }
}

/// Triangle soup produced by one extraction.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.triangles.len() * 3
    }

    /// Vertex positions in emission order, three per triangle.
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.triangles.iter().flat_map(|t| t.positions)
    }

    /// Vertex normals in emission order, three per triangle.
    pub fn normals(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.triangles.iter().flat_map(|t| t.normals)
    }

    fn clear(&mut self) {
        self.triangles.clear();
    }

    fn push(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }
}

/// A lattice vertex; the position is fixed, value and normal are refreshed per extraction.
#[derive(Clone, Copy, Debug, Default)]
pub struct LatticeVertex {
    pub position: Vec3,
    pub value: f32,
    pub normal: Vec3,
}

impl LatticeVertex {
    #[inline]
    fn inside(&self) -> bool {
        self.value > 0.0
    }
}

/// Crossing point on a lattice edge.
#[derive(Clone, Copy, Debug)]
struct EdgePoint {
    position: Vec3,
    normal: Vec3,
}

/// Marching tetrahedra extractor over a fixed lattice.
pub struct SurfaceExtractor {
    bounds: BoundingBox,
    /// Number of cubes per axis
    cubes: [usize; 3],
    cube_size: Vec3,
    vertices: Vec<LatticeVertex>,
    mesh: Mesh,
}

impl SurfaceExtractor {
    pub fn new(bounds: BoundingBox, nx: usize, ny: usize, nz: usize) -> SphResult<Self> {
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(SphError::EmptyLattice { nx, ny, nz });
        }
        let bounds = bounds.validated()?;
        let cube_size = bounds.extent() / Vec3::new(nx as f32, ny as f32, nz as f32);

        let mut extractor = Self {
            bounds,
            cubes: [nx, ny, nz],
            cube_size,
            vertices: Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1)),
            mesh: Mesh::default(),
        };
        for z in 0..=nz {
            for y in 0..=ny {
                for x in 0..=nx {
                    let position = extractor.vertex_position(x, y, z);
                    extractor.vertices.push(LatticeVertex {
                        position,
                        ..Default::default()
                    });
                }
            }
        }
        Ok(extractor)
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn cubes(&self) -> [usize; 3] {
        self.cubes
    }

    /// The mesh from the last extraction.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Flattened lattice index, x fastest.
    #[inline]
    pub fn vertex_index(&self, x: usize, y: usize, z: usize) -> usize {
        let [nx, ny, _] = self.cubes;
        z * (nx + 1) * (ny + 1) + y * (nx + 1) + x
    }

    pub fn vertex(&self, x: usize, y: usize, z: usize) -> &LatticeVertex {
        &self.vertices[self.vertex_index(x, y, z)]
    }

    fn vertex_position(&self, x: usize, y: usize, z: usize) -> Vec3 {
        self.bounds.min
            + Vec3::new(
                x as f32 * self.cube_size.x,
                y as f32 * self.cube_size.y,
                z as f32 * self.cube_size.z,
            )
    }

    /// Sample `field` on the lattice and rebuild the mesh of its zero level-set.
    pub fn extract<F: ImplicitField + ?Sized>(&mut self, field: &F) -> &Mesh {
        self.refresh_vertices(field);

        self.mesh.clear();
        let [nx, ny, nz] = self.cubes;
        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    self.polygonize_cube(x, y, z);
                }
            }
        }

        log::debug!(
            "extracted {} triangles from {}x{}x{} lattice",
            self.mesh.len(),
            nx,
            ny,
            nz
        );
        &self.mesh
    }

    fn refresh_vertices<F: ImplicitField + ?Sized>(&mut self, field: &F) {
        self.vertices.par_iter_mut().for_each(|vertex| {
            let sample = field.sample_at(vertex.position);
            vertex.value = sample.value;
            vertex.normal = sample.normal;
        });
    }

    fn polygonize_cube(&mut self, x: usize, y: usize, z: usize) {
        let corners = CUBE_CORNERS.map(|(dx, dy, dz)| self.vertex_index(x + dx, y + dy, z + dz));

        // Skip cubes that lie entirely on one side
        let first = self.vertices[corners[0]].inside();
        if corners.iter().all(|&c| self.vertices[c].inside() == first) {
            return;
        }

        for [a, b, c, d] in CUBE_TETRAHEDRA {
            self.polygonize_tetrahedron([corners[a], corners[b], corners[c], corners[d]]);
        }
    }

    fn polygonize_tetrahedron(&mut self, tet: [usize; 4]) {
        let mut inside = [0usize; 4];
        let mut outside = [0usize; 4];
        let (mut n_inside, mut n_outside) = (0, 0);
        for v in tet {
            if self.vertices[v].inside() {
                inside[n_inside] = v;
                n_inside += 1;
            } else {
                outside[n_outside] = v;
                n_outside += 1;
            }
        }

        match (n_inside, n_outside) {
            (0, _) | (_, 0) => {}
            (1, 3) => self.emit_triangle(inside[0], [outside[0], outside[1], outside[2]], true),
            (3, 1) => self.emit_triangle(outside[0], [inside[0], inside[1], inside[2]], false),
            (2, 2) => self.emit_quad([inside[0], inside[1]], [outside[0], outside[1]]),
            _ => unreachable!("a tetrahedron has four vertices"),
        }
    }

    /// One vertex on its own side: cut the three edges leaving it.
    fn emit_triangle(&mut self, lone: usize, others: [usize; 3], lone_inside: bool) {
        let points = others.map(|o| self.edge_point(lone, o));

        let centroid = (points[0].position + points[1].position + points[2].position) / 3.0;
        let lone_position = self.vertices[lone].position;
        let outward = if lone_inside {
            centroid - lone_position
        } else {
            lone_position - centroid
        };

        self.push_oriented([points[0], points[1], points[2]], outward);
    }

    /// Two vertices on each side: the cut is a quad, split along its first diagonal.
    fn emit_quad(&mut self, inside: [usize; 2], outside: [usize; 2]) {
        let [in1, in2] = inside;
        let [out1, out2] = outside;

        // Consecutive points share a tetrahedron vertex, so this walks the quad's rim
        let mut quad = [
            self.edge_point(in1, out1),
            self.edge_point(in1, out2),
            self.edge_point(in2, out2),
            self.edge_point(in2, out1),
        ];

        let outward = (self.vertices[out1].position + self.vertices[out2].position)
            - (self.vertices[in1].position + self.vertices[in2].position);
        let winding = (quad[1].position - quad[0].position)
            .cross(quad[2].position - quad[0].position)
            .dot(outward);
        if winding < 0.0 {
            quad.swap(1, 3);
        }

        self.push_triangle([quad[0], quad[1], quad[2]]);
        self.push_triangle([quad[0], quad[2], quad[3]]);
    }

    fn push_oriented(&mut self, mut points: [EdgePoint; 3], outward: Vec3) {
        let winding = (points[1].position - points[0].position)
            .cross(points[2].position - points[0].position)
            .dot(outward);
        if winding < 0.0 {
            points.swap(1, 2);
        }
        self.push_triangle(points);
    }

    fn push_triangle(&mut self, points: [EdgePoint; 3]) {
        self.mesh.push(Triangle {
            positions: points.map(|p| p.position),
            normals: points.map(|p| p.normal),
        });
    }

    /// Zero crossing on the edge between two lattice vertices of opposite sign.
    ///
    /// Always evaluated from the lower lattice index so every tetrahedron sharing the
    /// edge gets a bit-identical point.
    fn edge_point(&self, a: usize, b: usize) -> EdgePoint {
        let (v1, v2) = if a < b {
            (&self.vertices[a], &self.vertices[b])
        } else {
            (&self.vertices[b], &self.vertices[a])
        };

        EdgePoint {
            position: interpolate(v1.position, v1.value, v2.position, v2.value),
            normal: interpolate(v1.normal, v1.value, v2.normal, v2.value).normalize_or_zero(),
        }
    }
}

/// Linear zero crossing `p1 + (p2 - p1) * val1 / (val1 - val2)`.
///
/// Only called on sign-changing edges, where `val1 != val2`.
#[inline]
pub fn interpolate(p1: Vec3, val1: f32, p2: Vec3, val2: f32) -> Vec3 {
    p1 + (p2 - p1) * (val1 / (val1 - val2))
}
