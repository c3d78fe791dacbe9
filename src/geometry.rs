//! Containment tests used for drop-zone and floor-boundary collision.
//!
//! Everything here is pure and allocation-free apart from `Polygon`'s vertex list. Coordinates are
//! whatever space the caller works in (pixels for the opening drop zone, percent-of-viewport for the
//! floor), the math does not care.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

/// Ray-casting point-in-polygon test.
///
/// A horizontal ray is cast from `point` towards +x and edge crossings are counted; an odd count
/// means the point is inside. An edge only counts when it straddles the ray under the half-open
/// rule `(yi > py) != (yj > py)`. That rule never holds for a horizontal edge (`yi == yj`), so the
/// crossing division below cannot divide by zero.
///
/// Boundary convention: for an axis-aligned rectangle, points lying on the minimum-x or minimum-y
/// edge are inside, points on the maximum-x or maximum-y edge are outside. Fewer than three
/// vertices never contain anything.
pub fn point_in_polygon(point: Vec2, vertices: &[Vec2]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let vi = vertices[i];
        let vj = vertices[j];

        if (vi.y > point.y) != (vj.y > point.y) {
            let crossing_x = vi.x + (point.y - vi.y) * (vj.x - vi.x) / (vj.y - vi.y);
            if point.x < crossing_x {
                inside = !inside;
            }
        }

        j = i;
    }

    inside
}

/// True when `((x-cx)/rx)² + ((y-cy)/ry)² <= 1`. A zero, negative, or non-finite radius on
/// either axis describes no area at all and always yields `false`.
pub fn point_in_ellipse(point: Vec2, center: Vec2, radius_x: f32, radius_y: f32) -> bool {
    let valid = |r: f32| r.is_finite() && r > 0.0;
    if !valid(radius_x) || !valid(radius_y) {
        return false;
    }

    let dx = (point.x - center.x) / radius_x;
    let dy = (point.y - center.y) / radius_y;
    dx * dx + dy * dy <= 1.0
}

/// Axis-aligned ellipse.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: Vec2,
    pub radii: Vec2,
}

impl Ellipse {
    pub fn new(center: Vec2, radii: Vec2) -> Self {
        Self { center, radii }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point_in_ellipse(point, self.center, self.radii.x, self.radii.y)
    }
}

/// Closed polygon given by its ordered vertices.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Vec2>,
}

impl Polygon {
    pub fn new(vertices: impl Into<Vec<Vec2>>) -> Self {
        Self {
            vertices: vertices.into(),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point_in_polygon(point, &self.vertices)
    }

    /// Copy of the polygon with every vertex shifted by `offset`.
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| *v + offset).collect(),
        }
    }
}

/// Axis-aligned box described by its center and full size. Y grows downwards, matching screen
/// space, so "bottom" is `center.y + size.y / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub center: Vec2,
    pub size: Vec2,
}

impl Bounds {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let half = self.size * 0.5;
        let delta = (point - self.center).abs();
        delta.x <= half.x && delta.y <= half.y
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.center + offset, self.size)
    }

    /// Center, bottom-center, and the centers of the four quadrants.
    pub fn sample_points(&self) -> [Vec2; 6] {
        let quarter = self.size * 0.25;
        let c = self.center;
        [
            c,
            Vec2::new(c.x, c.y + self.size.y * 0.5),
            Vec2::new(c.x - quarter.x, c.y - quarter.y),
            Vec2::new(c.x + quarter.x, c.y - quarter.y),
            Vec2::new(c.x - quarter.x, c.y + quarter.y),
            Vec2::new(c.x + quarter.x, c.y + quarter.y),
        ]
    }
}
