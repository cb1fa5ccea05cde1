//! Deformable mass-spring meshes.
//!
//! A [`SoftBody`] is a set of vertices joined by Hooke springs and grouped
//! into triangles for area bookkeeping. Springs only deposit acceleration;
//! positions move in the per-vertex integration pass that follows.

use glam::Vec2;

use crate::error::{
    KineticsError, Result, check_damping, check_edge, check_mass, check_time_step,
};
use crate::force::Environment;
use crate::spring::{
    MassNode, PointState, SpringParams, apply_spring, check_spring_stiffness, integrate_point,
};

/// A vertex of a soft body.
#[derive(Debug, Clone)]
pub struct SoftBodyVertex {
    /// Current position.
    pub position: Vec2,
    /// Velocity.
    pub velocity: Vec2,
    /// Accumulated acceleration (cleared by integration).
    pub acceleration: Vec2,
    mass: f32,
    fixed: bool,
}

impl SoftBodyVertex {
    /// Creates a free vertex.
    pub fn new(position: Vec2, mass: f32) -> Result<Self> {
        Ok(Self {
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            mass: check_mass(mass)?,
            fixed: false,
        })
    }

    /// Creates a pinned vertex.
    pub fn fixed(position: Vec2, mass: f32) -> Result<Self> {
        let mut vertex = Self::new(position, mass)?;
        vertex.fixed = true;
        Ok(vertex)
    }

    /// Mass.
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Whether integration skips this vertex.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Pins or releases the vertex.
    pub fn set_fixed(&mut self, fixed: bool) {
        self.fixed = fixed;
        if fixed {
            self.velocity = Vec2::ZERO;
            self.acceleration = Vec2::ZERO;
        }
    }

    fn integrate(&mut self, gravity: Vec2, dt: f32) {
        if self.fixed {
            self.acceleration = Vec2::ZERO;
            return;
        }
        integrate_point(
            PointState {
                position: &mut self.position,
                velocity: &mut self.velocity,
                acceleration: &mut self.acceleration,
            },
            gravity,
            dt,
        );
    }
}

impl MassNode for SoftBodyVertex {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn inv_mass(&self) -> f32 {
        if self.fixed { 0.0 } else { 1.0 / self.mass }
    }

    fn accelerate(&mut self, acceleration: Vec2) {
        self.acceleration += acceleration;
    }
}

/// A spring between two soft body vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    /// First vertex index.
    pub a: usize,
    /// Second vertex index.
    pub b: usize,
    rest_length: f32,
    /// Hooke coefficient.
    pub stiffness: f32,
    /// Damping along the spring axis.
    pub damping: f32,
}

impl Spring {
    /// Separation at which the spring is relaxed. Fixed at construction.
    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }

    /// Deposits this spring's force into the endpoint accelerations.
    pub fn update(&self, vertices: &mut [SoftBodyVertex]) -> Option<f32> {
        apply_spring(
            vertices,
            self.a,
            self.b,
            SpringParams {
                rest_length: self.rest_length,
                stiffness: self.stiffness,
                damping: self.damping,
            },
        )
    }
}

/// Three vertex indices with their construction-time area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Vertex indices.
    pub vertices: [usize; 3],
    rest_area: f32,
}

impl Triangle {
    /// Area at construction time.
    pub fn rest_area(&self) -> f32 {
        self.rest_area
    }

    /// Area for the given vertex positions.
    pub fn area(&self, vertices: &[SoftBodyVertex]) -> f32 {
        let [a, b, c] = self.vertices;
        triangle_area(vertices[a].position, vertices[b].position, vertices[c].position)
    }
}

/// Unsigned area from the 2D cross product.
pub fn triangle_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    0.5 * (b - a).perp_dot(c - a).abs()
}

/// A deformable mass-spring mesh.
#[derive(Debug, Clone, Default)]
pub struct SoftBody {
    vertices: Vec<SoftBodyVertex>,
    springs: Vec<Spring>,
    triangles: Vec<Triangle>,
}

impl SoftBody {
    /// Creates an empty soft body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a triangulated lattice.
    ///
    /// Every cell gets edge springs on its sides plus both diagonals, and is
    /// split into two triangles. `mass` is the mass of each vertex.
    pub fn grid(
        origin: Vec2,
        size: Vec2,
        columns: usize,
        rows: usize,
        mass: f32,
        stiffness: f32,
    ) -> Result<Self> {
        if columns < 2 || rows < 2 {
            return Err(KineticsError::InvalidGrid { columns, rows });
        }

        let dx = size.x / (columns - 1) as f32;
        let dy = size.y / (rows - 1) as f32;
        let index = |x: usize, y: usize| y * columns + x;

        let mut body = Self::new();
        for y in 0..rows {
            for x in 0..columns {
                let pos = origin + Vec2::new(x as f32 * dx, y as f32 * dy);
                body.add_vertex(SoftBodyVertex::new(pos, mass)?);
            }
        }

        for y in 0..rows {
            for x in 0..columns {
                let i = index(x, y);
                if x + 1 < columns {
                    body.add_spring(i, index(x + 1, y), stiffness)?;
                }
                if y + 1 < rows {
                    body.add_spring(i, index(x, y + 1), stiffness)?;
                }
                if x + 1 < columns && y + 1 < rows {
                    body.add_spring(i, index(x + 1, y + 1), stiffness)?;
                    body.add_spring(index(x + 1, y), index(x, y + 1), stiffness)?;
                    body.add_triangle(i, index(x + 1, y), index(x, y + 1))?;
                    body.add_triangle(index(x + 1, y), index(x + 1, y + 1), index(x, y + 1))?;
                }
            }
        }

        Ok(body)
    }

    /// Builds a disc: a center vertex plus `segments` rim vertices.
    ///
    /// Rim vertices are joined to their neighbours and to the center; each
    /// rim edge forms a triangle with the center.
    pub fn ring(
        center: Vec2,
        radius: f32,
        segments: usize,
        mass: f32,
        stiffness: f32,
    ) -> Result<Self> {
        if segments < 3 {
            return Err(KineticsError::InvalidShape(format!(
                "ring needs at least 3 segments, got {segments}"
            )));
        }
        if !(radius.is_finite() && radius > 0.0) {
            return Err(KineticsError::InvalidShape(format!(
                "ring radius must be positive, got {radius}"
            )));
        }

        let mut body = Self::new();
        let hub = body.add_vertex(SoftBodyVertex::new(center, mass)?);
        for i in 0..segments {
            let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
            let pos = center + Vec2::from_angle(angle) * radius;
            body.add_vertex(SoftBodyVertex::new(pos, mass)?);
        }

        for i in 0..segments {
            let rim = 1 + i;
            let next = 1 + (i + 1) % segments;
            body.add_spring(hub, rim, stiffness)?;
            body.add_spring(rim, next, stiffness)?;
            body.add_triangle(hub, rim, next)?;
        }

        Ok(body)
    }

    /// Adds a vertex and returns its index.
    pub fn add_vertex(&mut self, vertex: SoftBodyVertex) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    /// Adds an undamped spring; rest length is the current separation.
    pub fn add_spring(&mut self, a: usize, b: usize, stiffness: f32) -> Result<usize> {
        self.add_damped_spring(a, b, stiffness, 0.0)
    }

    /// Adds a damped spring; rest length is the current separation.
    pub fn add_damped_spring(
        &mut self,
        a: usize,
        b: usize,
        stiffness: f32,
        damping: f32,
    ) -> Result<usize> {
        check_edge(a, b, self.vertices.len())?;
        let rest_length = (self.vertices[b].position - self.vertices[a].position).length();
        self.springs.push(Spring {
            a,
            b,
            rest_length,
            stiffness: check_spring_stiffness(stiffness)?,
            damping: check_damping(damping)?,
        });
        Ok(self.springs.len() - 1)
    }

    /// Adds a triangle, recording its current area.
    pub fn add_triangle(&mut self, a: usize, b: usize, c: usize) -> Result<usize> {
        let len = self.vertices.len();
        if let Some(&index) = [a, b, c].iter().find(|&&i| i >= len) {
            return Err(KineticsError::NodeOutOfRange { index, len });
        }
        let rest_area = triangle_area(
            self.vertices[a].position,
            self.vertices[b].position,
            self.vertices[c].position,
        );
        self.triangles.push(Triangle {
            vertices: [a, b, c],
            rest_area,
        });
        Ok(self.triangles.len() - 1)
    }

    /// Pins a vertex in place.
    pub fn pin(&mut self, index: usize) -> Result<()> {
        let len = self.vertices.len();
        let vertex = self
            .vertices
            .get_mut(index)
            .ok_or(KineticsError::NodeOutOfRange { index, len })?;
        vertex.set_fixed(true);
        Ok(())
    }

    /// Returns the vertices.
    pub fn vertices(&self) -> &[SoftBodyVertex] {
        &self.vertices
    }

    /// Returns a mutable vertex.
    pub fn vertex_mut(&mut self, index: usize) -> Option<&mut SoftBodyVertex> {
        self.vertices.get_mut(index)
    }

    /// Returns the springs.
    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    /// Returns the triangles.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Current total triangle area.
    pub fn area(&self) -> f32 {
        self.triangles.iter().map(|t| t.area(&self.vertices)).sum()
    }

    /// Total triangle area at construction.
    pub fn rest_area(&self) -> f32 {
        self.triangles.iter().map(Triangle::rest_area).sum()
    }

    /// Vertex positions.
    pub fn positions(&self) -> Vec<Vec2> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    /// Advances the body: springs deposit acceleration, then vertices integrate.
    pub fn update(&mut self, dt: f32, env: &Environment) -> Result<()> {
        check_time_step(dt)?;

        for spring in &self.springs {
            spring.update(&mut self.vertices);
        }

        for vertex in &mut self.vertices {
            vertex.integrate(env.gravity, dt);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_g() -> Environment {
        Environment::new(Vec2::ZERO)
    }

    #[test]
    fn test_triangle_area() {
        assert_eq!(triangle_area(Vec2::ZERO, Vec2::X, Vec2::Y), 0.5);
        // Winding does not matter
        assert_eq!(triangle_area(Vec2::ZERO, Vec2::Y, Vec2::X), 0.5);
    }

    #[test]
    fn test_rest_length_captured_at_construction() {
        let mut body = SoftBody::new();
        let a = body.add_vertex(SoftBodyVertex::new(Vec2::ZERO, 1.0).unwrap());
        let b = body.add_vertex(SoftBodyVertex::new(Vec2::new(3.0, 4.0), 1.0).unwrap());
        body.add_spring(a, b, 10.0).unwrap();

        assert_eq!(body.springs()[0].rest_length(), 5.0);

        body.vertex_mut(b).unwrap().position = Vec2::new(6.0, 8.0);
        assert_eq!(body.springs()[0].rest_length(), 5.0);
    }

    #[test]
    fn test_invalid_edges() {
        let mut body = SoftBody::new();
        body.add_vertex(SoftBodyVertex::new(Vec2::ZERO, 1.0).unwrap());
        assert!(body.add_spring(0, 1, 1.0).is_err());
        assert!(body.add_spring(0, 0, 1.0).is_err());
        assert!(body.add_triangle(0, 1, 2).is_err());
        body.add_vertex(SoftBodyVertex::new(Vec2::X, 1.0).unwrap());
        assert!(body.add_spring(0, 1, -1.0).is_err());
        assert!(body.add_damped_spring(0, 1, 1.0, -0.5).is_err());
    }

    #[test]
    fn test_stretched_spring_returns_toward_rest() {
        let mut body = SoftBody::new();
        let a = body.add_vertex(SoftBodyVertex::new(Vec2::ZERO, 1.0).unwrap());
        let b = body.add_vertex(SoftBodyVertex::new(Vec2::X, 1.0).unwrap());
        body.add_spring(a, b, 50.0).unwrap();

        // Perturb
        body.vertex_mut(b).unwrap().position = Vec2::new(1.5, 0.0);
        let initial = 0.5;

        body.update(0.01, &zero_g()).unwrap();
        let separation = (body.vertices()[b].position - body.vertices()[a].position).length();
        assert!((separation - 1.0).abs() < initial);

        // Symmetric masses: center of mass stays put
        let center = (body.vertices()[a].position + body.vertices()[b].position) * 0.5;
        assert!((center - Vec2::new(0.75, 0.0)).length() < 1e-5);
        // Momentum stays zero
        let momentum = body.vertices()[a].velocity + body.vertices()[b].velocity;
        assert!(momentum.length() < 1e-5);
    }

    #[test]
    fn test_fixed_vertex_never_moves() {
        let mut body = SoftBody::grid(Vec2::ZERO, Vec2::new(2.0, 2.0), 3, 3, 1.0, 200.0).unwrap();
        body.pin(0).unwrap();
        let pinned = body.vertices()[0].position;

        let env = Environment::default();
        body.update(1.0 / 60.0, &env).unwrap();
        // Free vertices start falling
        assert!(body.vertices()[8].position.y > 2.0);

        for _ in 0..119 {
            body.update(1.0 / 60.0, &env).unwrap();
        }

        assert_eq!(body.vertices()[0].position, pinned);
        assert_eq!(body.vertices()[0].velocity, Vec2::ZERO);
        assert!(body.vertices().iter().all(|v| v.position.is_finite()));
    }

    #[test]
    fn test_coincident_vertices_stay_finite() {
        let mut body = SoftBody::new();
        let a = body.add_vertex(SoftBodyVertex::new(Vec2::ZERO, 1.0).unwrap());
        let b = body.add_vertex(SoftBodyVertex::new(Vec2::X, 1.0).unwrap());
        body.add_spring(a, b, 100.0).unwrap();
        body.vertex_mut(b).unwrap().position = Vec2::ZERO;

        body.update(1.0 / 60.0, &Environment::default()).unwrap();

        for v in body.vertices() {
            assert!(v.position.is_finite());
            assert!(v.velocity.is_finite());
        }
    }

    #[test]
    fn test_grid_topology() {
        let body = SoftBody::grid(Vec2::ZERO, Vec2::new(2.0, 1.0), 3, 2, 1.0, 10.0).unwrap();
        assert_eq!(body.vertices().len(), 6);
        // 4 horizontal + 3 vertical + 2 cells * 2 diagonals
        assert_eq!(body.springs().len(), 11);
        assert_eq!(body.triangles().len(), 4);
        assert!((body.rest_area() - 2.0).abs() < 1e-5);
        assert!((body.area() - body.rest_area()).abs() < 1e-5);
    }

    #[test]
    fn test_grid_rejects_degenerate() {
        assert!(SoftBody::grid(Vec2::ZERO, Vec2::ONE, 1, 4, 1.0, 1.0).is_err());
        assert!(SoftBody::grid(Vec2::ZERO, Vec2::ONE, 2, 2, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_ring_topology() {
        let body = SoftBody::ring(Vec2::ZERO, 1.0, 8, 0.5, 10.0).unwrap();
        assert_eq!(body.vertices().len(), 9);
        assert_eq!(body.springs().len(), 16);
        assert_eq!(body.triangles().len(), 8);
        // Regular octagon area: 2 * sqrt(2) * r^2
        assert!((body.rest_area() - 2.0 * 2f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_area_tracks_deformation() {
        let mut body = SoftBody::new();
        for pos in [Vec2::ZERO, Vec2::X, Vec2::Y] {
            body.add_vertex(SoftBodyVertex::new(pos, 1.0).unwrap());
        }
        body.add_triangle(0, 1, 2).unwrap();
        body.vertex_mut(1).unwrap().position = Vec2::new(2.0, 0.0);

        assert_eq!(body.rest_area(), 0.5);
        assert_eq!(body.area(), 1.0);
    }

    #[test]
    fn test_acceleration_cleared_after_update() {
        let mut body = SoftBody::new();
        body.add_vertex(SoftBodyVertex::new(Vec2::ZERO, 1.0).unwrap());
        body.add_vertex(SoftBodyVertex::new(Vec2::X, 1.0).unwrap());
        body.add_spring(0, 1, 10.0).unwrap();
        body.vertex_mut(1).unwrap().position = Vec2::new(2.0, 0.0);

        body.update(0.01, &zero_g()).unwrap();
        for v in body.vertices() {
            assert_eq!(v.acceleration, Vec2::ZERO);
        }
    }
}
