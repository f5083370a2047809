//! View: the camera/viewport state for both the 2D plane engine and the 3D
//! raymarcher.

use crate::points::Point3;
use crate::BigFloat;
use serde::{Deserialize, Serialize};

/// Viewport into the complex plane, with BigFloat precision.
///
/// Defines a rectangular region in fractal coordinates:
/// - `center`: center point (x, y) in fractal space
/// - `width`/`height`: visible extent in fractal space
/// - `rotation`: view rotation in radians (f64 is sufficient; rotation does
///   not accumulate precision loss the way position does)
///
/// At extreme zoom depths (10^2000), width/height are ~10^-2000.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct View {
    pub center: (BigFloat, BigFloat),
    pub width: BigFloat,
    pub height: BigFloat,
    pub rotation: f64,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl View {
    pub fn with_bigfloat(
        center_x: BigFloat,
        center_y: BigFloat,
        width: BigFloat,
        height: BigFloat,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Self {
        Self {
            center: (center_x, center_y),
            width,
            height,
            rotation: 0.0,
            canvas_width,
            canvas_height,
        }
    }

    pub fn from_f64(
        center_x: f64,
        center_y: f64,
        width: f64,
        height: f64,
        precision_bits: usize,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Self {
        Self {
            center: (
                BigFloat::with_precision(center_x, precision_bits),
                BigFloat::with_precision(center_y, precision_bits),
            ),
            width: BigFloat::with_precision(width, precision_bits),
            height: BigFloat::with_precision(height, precision_bits),
            rotation: 0.0,
            canvas_width,
            canvas_height,
        }
    }

    /// Parses decimal strings for coordinates/extent that exceed f64 precision.
    pub fn from_strings(
        center_x: &str,
        center_y: &str,
        width: &str,
        height: &str,
        precision_bits: usize,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Result<Self, String> {
        Ok(Self {
            center: (
                BigFloat::from_string(center_x, precision_bits)?,
                BigFloat::from_string(center_y, precision_bits)?,
            ),
            width: BigFloat::from_string(width, precision_bits)?,
            height: BigFloat::from_string(height, precision_bits)?,
            rotation: 0.0,
            canvas_width,
            canvas_height,
        })
    }

    pub fn precision_bits(&self) -> usize {
        self.width.precision_bits()
    }

    /// Zoom relative to `reference_width` (the fractal kind's default plane width).
    /// Computed via log2, so it stays meaningful even when `width` has
    /// underflowed f64 (e.g. 10^-2000 scale renders).
    pub fn zoom(&self, reference_width: f64) -> f64 {
        2f64.powf(reference_width.log2() - self.width.log2_approx())
    }

    pub fn with_rotation(mut self, radians: f64) -> Self {
        self.rotation = radians;
        self
    }
}

/// Camera for the 3D distance-estimated fractals. Position and orientation
/// are plain f64 triples — 3D scenes don't need arbitrary-precision depth
/// the way 2D deep-zoom does (distances stay within a bounded working volume).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Point3<f64>,
    pub look_at: Point3<f64>,
    pub up: Point3<f64>,
    pub fov_radians: f64,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl Camera {
    pub fn new(
        position: Point3<f64>,
        look_at: Point3<f64>,
        fov_radians: f64,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Self {
        Self {
            position,
            look_at,
            up: Point3::new(0.0, 1.0, 0.0),
            fov_radians,
            canvas_width,
            canvas_height,
        }
    }

    /// Orthonormal basis (forward, right, up) for ray generation.
    pub fn basis(&self) -> (Point3<f64>, Point3<f64>, Point3<f64>) {
        let forward = self.look_at.sub(&self.position).normalize();
        let right = cross(&forward, &self.up).normalize();
        let true_up = cross(&right, &forward);
        (forward, right, true_up)
    }

    /// World-space ray direction for pixel `(px, py)`, with sub-pixel jitter
    /// `(jx, jy)` in `[0, 1)` for anti-aliasing.
    pub fn ray_direction(&self, px: u32, py: u32, jx: f64, jy: f64) -> Point3<f64> {
        let (forward, right, up) = self.basis();
        let aspect = self.canvas_width as f64 / self.canvas_height as f64;
        let half_h = (self.fov_radians / 2.0).tan();
        let half_w = half_h * aspect;

        let u = ((px as f64 + jx) / self.canvas_width as f64) * 2.0 - 1.0;
        let v = 1.0 - ((py as f64 + jy) / self.canvas_height as f64) * 2.0;

        forward
            .add(&right.scale(u * half_w))
            .add(&up.scale(v * half_h))
            .normalize()
    }
}

fn cross(a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    Point3::new(
        a.y * b.z - a.z * b.y,
        a.z * b.x - a.x * b.z,
        a.x * b.y - a.y * b.x,
    )
}
