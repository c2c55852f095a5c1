//! Pointy-top pixel geometry for tile centers and edges.
//!
//! Beams record where they are inside a tile (center, or the midpoint of an
//! edge) so the rendering layer can draw them. The kernel only needs these
//! three points, so the layout is deliberately tiny.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::hex::{CubeCoordinate, Direction, FractionalCube};

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Pointy-top hex layout with the origin tile centered at `(0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Circumradius of a tile (center to corner).
    pub size: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self { size: 1.0 }
    }
}

impl Layout {
    pub fn new(size: f64) -> Self {
        assert!(
            size > 0.0 && size.is_finite(),
            "tile size must be positive and finite, got {size}"
        );
        Self { size }
    }

    /// Distance from a tile center to the midpoint of any edge.
    #[inline]
    pub fn inradius(&self) -> f64 {
        self.size * SQRT_3 / 2.0
    }

    /// Pixel position of a tile center.
    pub fn tile_center(&self, tile: CubeCoordinate) -> DVec2 {
        let q = tile.q() as f64;
        let r = tile.r() as f64;
        DVec2::new(
            self.size * (SQRT_3 * q + SQRT_3 / 2.0 * r),
            self.size * (1.5 * r),
        )
    }

    /// Midpoint of the edge of `tile` facing `direction`.
    pub fn boundary_point(&self, tile: CubeCoordinate, direction: Direction) -> DVec2 {
        let center = self.tile_center(tile);
        let neighbor = self.tile_center(tile.neighbor(direction));
        (center + neighbor) * 0.5
    }

    /// The tile containing a pixel position.
    pub fn pixel_to_tile(&self, point: DVec2) -> CubeCoordinate {
        let q = (SQRT_3 / 3.0 * point.x - point.y / 3.0) / self.size;
        let r = (2.0 / 3.0 * point.y) / self.size;
        FractionalCube::new(q, r, -q - r).round()
    }
}
