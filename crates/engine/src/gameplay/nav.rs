use glam::Vec3;
use rand::{Rng, RngCore};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NavError {
    #[error("walkable surface has no triangles")]
    NoWalkableSurface,
    #[error("triangle index count {count} is not a multiple of 3")]
    RaggedIndices { count: usize },
    #[error("triangle index {index} at slot {slot} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        slot: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("vertex {index} is not finite")]
    NonFiniteVertex { index: usize },
}

/// Query contract for anything that knows where agents may stand.
pub trait SurfaceNavigator {
    /// Closest walkable point within `max_radius` of `point`, if any.
    fn project(&self, point: Vec3, max_radius: f32) -> Option<Vec3>;

    /// Some point on the walkable surface, chosen at random.
    fn random_walkable_point(&self, rng: &mut dyn RngCore) -> Result<Vec3, NavError>;
}

/// Projects `point` onto the surface, falling back to a random walkable point
/// when nothing lies within `max_radius`.
pub fn sample_position(
    navigator: &dyn SurfaceNavigator,
    point: Vec3,
    max_radius: f32,
    rng: &mut dyn RngCore,
) -> Result<Vec3, NavError> {
    if let Some(projected) = navigator.project(point, max_radius) {
        return Ok(projected);
    }
    let fallback = navigator.random_walkable_point(rng)?;
    debug!(
        requested = ?point,
        max_radius,
        fallback = ?fallback,
        "nav_projection_fell_back_to_random_point"
    );
    Ok(fallback)
}

/// Triangle soup describing the walkable surface of a level.
#[derive(Debug, Clone, PartialEq)]
pub struct NavMesh {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
}

impl NavMesh {
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Result<Self, NavError> {
        if indices.len() % 3 != 0 {
            return Err(NavError::RaggedIndices {
                count: indices.len(),
            });
        }
        if let Some(index) = vertices.iter().position(|vertex| !vertex.is_finite()) {
            return Err(NavError::NonFiniteVertex { index });
        }
        for (slot, &index) in indices.iter().enumerate() {
            if index as usize >= vertices.len() {
                return Err(NavError::IndexOutOfRange {
                    slot,
                    index,
                    vertex_count: vertices.len(),
                });
            }
        }
        Ok(Self { vertices, indices })
    }

    /// Flat rectangle at height `min.y` spanning `min.xz..max.xz`, as two triangles.
    pub fn floor_rect(min: Vec3, max: Vec3) -> Self {
        let y = min.y;
        Self {
            vertices: vec![
                Vec3::new(min.x, y, min.z),
                Vec3::new(max.x, y, min.z),
                Vec3::new(max.x, y, max.z),
                Vec3::new(min.x, y, max.z),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangle(&self, triangle_index: usize) -> Option<[Vec3; 3]> {
        let base = triangle_index.checked_mul(3)?;
        let corners = self.indices.get(base..base + 3)?;
        Some([
            self.vertices[corners[0] as usize],
            self.vertices[corners[1] as usize],
            self.vertices[corners[2] as usize],
        ])
    }

    fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|corners| {
            [
                self.vertices[corners[0] as usize],
                self.vertices[corners[1] as usize],
                self.vertices[corners[2] as usize],
            ]
        })
    }

    /// True when `point` lies on some triangle, within `tolerance`.
    pub fn contains(&self, point: Vec3, tolerance: f32) -> bool {
        self.triangles().any(|[a, b, c]| {
            closest_point_on_triangle(point, a, b, c).distance_squared(point)
                <= tolerance * tolerance
        })
    }
}

impl SurfaceNavigator for NavMesh {
    fn project(&self, point: Vec3, max_radius: f32) -> Option<Vec3> {
        if !point.is_finite() || !(max_radius >= 0.0) {
            return None;
        }
        let max_distance_sq = max_radius * max_radius;
        let mut best: Option<(f32, Vec3)> = None;
        for [a, b, c] in self.triangles() {
            let candidate = closest_point_on_triangle(point, a, b, c);
            let distance_sq = candidate.distance_squared(point);
            if distance_sq > max_distance_sq {
                continue;
            }
            if best.map_or(true, |(best_sq, _)| distance_sq < best_sq) {
                best = Some((distance_sq, candidate));
            }
        }
        best.map(|(_, candidate)| candidate)
    }

    // Triangles are picked by index rather than weighted by area, so small
    // triangles are over-represented.
    fn random_walkable_point(&self, rng: &mut dyn RngCore) -> Result<Vec3, NavError> {
        let triangle_count = self.triangle_count();
        if triangle_count == 0 {
            return Err(NavError::NoWalkableSurface);
        }
        let triangle_index = rng.gen_range(0..triangle_count);
        let [a, b, c] = self
            .triangle(triangle_index)
            .ok_or(NavError::NoWalkableSurface)?;
        let edge_point = a.lerp(b, rng.gen::<f32>());
        Ok(edge_point.lerp(c, rng.gen::<f32>()))
    }
}

// Real-Time Collision Detection, 5.1.5.
fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    if !denom.is_finite() {
        // Degenerate triangle; the nearest corner is good enough.
        return [a, b, c]
            .into_iter()
            .min_by(|lhs, rhs| {
                lhs.distance_squared(p)
                    .total_cmp(&rhs.distance_squared(p))
            })
            .unwrap_or(a);
    }
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}
