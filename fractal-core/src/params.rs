//! Fractal parameters: the tagged variant over plane (2D) and volumetric
//! (3D) fractal kinds, plus the common numeric knobs shared by every kernel.

use crate::complex::{F64Complex, Quaternion};
use crate::points::Point3;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PlaneKind {
    Mandelbrot { power: f64 },
    Julia { c: F64Complex },
    BurningShip,
    Tricorn,
    MandelPower { n: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuatJuliaVariant {
    Quat,
    Bicomplex,
    Hypercomplex,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KleinianVariant {
    Knighty,
    Apollonian,
    Schottky,
}

/// A single affine transform `p ↦ M·p + t`, row-major 3x3 linear part.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Affine3 {
    pub matrix: [[f64; 3]; 3],
    pub translation: Point3<f64>,
}

impl Affine3 {
    pub fn identity() -> Self {
        Self {
            matrix: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            translation: Point3::zero(),
        }
    }

    pub fn apply(&self, p: &Point3<f64>) -> Point3<f64> {
        let m = &self.matrix;
        Point3::new(
            m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + self.translation.x,
            m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + self.translation.y,
            m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + self.translation.z,
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum VolumeKind {
    Mandelbulb {
        power: f64,
        variant: String,
    },
    Mandelbox {
        scale: f64,
        fold: f64,
        r_min: f64,
        r_fix: f64,
        rotations: Vec<f64>,
    },
    Menger {
        variant: String,
        cross_width: f64,
    },
    Sierpinski {
        variant: String,
    },
    QuatJulia {
        c: Quaternion,
        slice_w: f64,
        variant: QuatJuliaVariant,
        power: f64,
    },
    Kleinian {
        box_size: Point3<f64>,
        klein_r: f64,
        klein_i: f64,
        variant: KleinianVariant,
    },
    Ifs {
        transforms: Vec<Affine3>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dimension")]
pub enum FractalKind {
    Plane(PlaneKind),
    Volume(VolumeKind),
}

/// Common numeric knobs shared across every kernel, per §3.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommonParams {
    pub max_iterations: u32,
    pub bailout: f64,
    pub epsilon: f64,
    pub max_steps: u32,
    pub max_distance: f64,
    pub step_multiplier: f64,
    pub julia_mode: bool,
}

impl Default for CommonParams {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            bailout: 4.0,
            epsilon: 1e-5,
            max_steps: 256,
            max_distance: 100.0,
            step_multiplier: 0.9,
            julia_mode: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FractalParams {
    pub kind: FractalKind,
    pub common: CommonParams,
}

impl FractalParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.common.bailout <= 0.0 {
            return Err("bailout must be positive".into());
        }
        if self.common.epsilon <= 0.0 {
            return Err("epsilon must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.common.step_multiplier) || self.common.step_multiplier <= 0.0 {
            return Err("stepMultiplier must be in (0, 1]".into());
        }
        if self.common.max_distance <= 0.0 {
            return Err("maxDistance must be positive".into());
        }
        if let FractalKind::Volume(VolumeKind::Mandelbulb { power, .. }) = &self.kind {
            if *power <= 0.0 {
                return Err("Mandelbulb power must be positive".into());
            }
        }
        Ok(())
    }

    pub fn is_volumetric(&self) -> bool {
        matches!(self.kind, FractalKind::Volume(_))
    }
}
