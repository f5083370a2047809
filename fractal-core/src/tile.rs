//! Tile: the unit of dispatched work for both the 2D and 3D engines.

use serde::{Deserialize, Serialize};

/// Rectangular pixel region within a view, plus the full-canvas size needed
/// to locate its origin in the complex (or screen) plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl Tile {
    pub fn new(x: u32, y: u32, width: u32, height: u32, canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            canvas_width,
            canvas_height,
        }
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    /// Pixel step size in fractal-space units, given the view's complex-plane width/height.
    pub fn pixel_step(&self, plane_width: f64, plane_height: f64) -> (f64, f64) {
        (
            plane_width / self.canvas_width as f64,
            plane_height / self.canvas_height as f64,
        )
    }

    /// Complex-plane coordinate of this tile's top-left pixel, relative to the
    /// view center, given the plane width/height of the full canvas.
    pub fn origin_offset(&self, plane_width: f64, plane_height: f64) -> (f64, f64) {
        let (step_x, step_y) = self.pixel_step(plane_width, plane_height);
        let half_w = self.canvas_width as f64 / 2.0;
        let half_h = self.canvas_height as f64 / 2.0;
        (
            (self.x as f64 - half_w) * step_x,
            (self.y as f64 - half_h) * step_y,
        )
    }

    /// Splits into a grid of sub-tiles no larger than `max_dim` on either side.
    /// Used by the scheduler to chop a view's full canvas into dispatch units.
    pub fn tile_grid(canvas_width: u32, canvas_height: u32, max_dim: u32) -> Vec<Tile> {
        let mut tiles = Vec::new();
        let mut y = 0;
        while y < canvas_height {
            let h = max_dim.min(canvas_height - y);
            let mut x = 0;
            while x < canvas_width {
                let w = max_dim.min(canvas_width - x);
                tiles.push(Tile::new(x, y, w, h, canvas_width, canvas_height));
                x += max_dim;
            }
            y += max_dim;
        }
        tiles
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    Plane,
    Volumetric,
}

/// Flags byte of the binary tile-result header.
pub const TILE_RESULT_VERSION: u16 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_area_and_contains() {
        let t = Tile::new(10, 20, 100, 50, 1000, 1000);
        assert_eq!(t.area(), 5000);
        assert!(t.contains(50, 40));
        assert!(!t.contains(110, 70));
    }

    #[test]
    fn tile_grid_covers_canvas_exactly() {
        let tiles = Tile::tile_grid(100, 100, 32);
        let total: u32 = tiles.iter().map(|t| t.area()).sum();
        assert_eq!(total, 100 * 100);
    }

    #[test]
    fn tile_grid_handles_non_divisible_dims() {
        let tiles = Tile::tile_grid(65, 33, 32);
        // 3 columns (32,32,1) x 2 rows (32,1)
        assert_eq!(tiles.len(), 6);
        let total: u32 = tiles.iter().map(|t| t.area()).sum();
        assert_eq!(total, 65 * 33);
    }

    #[test]
    fn pixel_step_scales_by_canvas_dims() {
        let t = Tile::new(0, 0, 10, 10, 100, 50);
        let (sx, sy) = t.pixel_step(4.0, 2.0);
        assert!((sx - 0.04).abs() < 1e-12);
        assert!((sy - 0.04).abs() < 1e-12);
    }

    #[test]
    fn origin_offset_of_center_tile_is_near_zero() {
        let t = Tile::new(50, 25, 1, 1, 100, 50);
        let (ox, oy) = t.origin_offset(4.0, 2.0);
        assert!(ox.abs() < 0.05);
        assert!(oy.abs() < 0.05);
    }

    #[test]
    fn serialization_roundtrip() {
        let t = Tile::new(1, 2, 3, 4, 100, 200);
        let json = serde_json::to_string(&t).unwrap();
        let back: Tile = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
