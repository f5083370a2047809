//! Distance-estimator kernels for the volumetric fractal kinds (C1, 3D half).
//!
//! Each kernel takes a world-space position and returns a conservative lower
//! bound on the distance to the surface, plus coloring side-channels (orbit
//! trap, fold/escape iteration count) the raymarcher threads through to the
//! tile result.

pub mod ifs;
pub mod kleinian;
pub mod mandelbox;
pub mod mandelbulb;
pub mod menger;
pub mod quat_julia;
pub mod sierpinski;

use fractal_core::{Point3, VolumeKind};

#[derive(Clone, Copy, Debug)]
pub struct DeResult {
    pub distance: f64,
    pub iterations: u32,
    pub orbit_trap: f64,
}

impl DeResult {
    pub fn new(distance: f64, iterations: u32, orbit_trap: f64) -> Self {
        DeResult {
            distance,
            iterations,
            orbit_trap,
        }
    }
}

pub fn distance_estimate(kind: &VolumeKind, pos: Point3<f64>, common_max_iterations: u32, bailout: f64) -> DeResult {
    match kind {
        VolumeKind::Mandelbulb { power, .. } => {
            mandelbulb::de(pos, *power, common_max_iterations, bailout)
        }
        VolumeKind::Mandelbox {
            scale,
            fold,
            r_min,
            r_fix,
            ..
        } => mandelbox::de(pos, *scale, *fold, *r_min, *r_fix, common_max_iterations),
        VolumeKind::Menger { cross_width, .. } => menger::de(pos, *cross_width, common_max_iterations),
        VolumeKind::Sierpinski { .. } => sierpinski::de(pos, common_max_iterations),
        VolumeKind::QuatJulia { c, slice_w, power, .. } => {
            quat_julia::de(pos, *c, *slice_w, *power, common_max_iterations, bailout)
        }
        VolumeKind::Kleinian {
            box_size,
            klein_r,
            klein_i,
            ..
        } => kleinian::de(pos, *box_size, *klein_r, *klein_i, common_max_iterations),
        VolumeKind::Ifs { transforms } => ifs::de(pos, transforms, common_max_iterations),
    }
}

/// Fold a coordinate into `[-limit, limit]` by reflection, as the box- and
/// menger-family kernels all need before their nonlinear step.
pub(crate) fn box_fold(v: f64, limit: f64) -> f64 {
    v.clamp(-limit, limit) * 2.0 - v
}

/// Spherical fold used by Mandelbox: inverts the point when inside
/// `[r_min, r_fix]` to create the characteristic nested-cube structure.
pub(crate) fn sphere_fold(p: &mut Point3<f64>, dr: &mut f64, r_min: f64, r_fix: f64) {
    let r2 = p.x * p.x + p.y * p.y + p.z * p.z;
    if r2 < r_min * r_min {
        let factor = (r_fix * r_fix) / (r_min * r_min);
        p.x *= factor;
        p.y *= factor;
        p.z *= factor;
        *dr *= factor;
    } else if r2 < r_fix * r_fix {
        let factor = (r_fix * r_fix) / r2;
        p.x *= factor;
        p.y *= factor;
        p.z *= factor;
        *dr *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_fold_identity_inside_limit() {
        assert_eq!(box_fold(0.5, 1.0), 0.5);
    }

    #[test]
    fn box_fold_reflects_outside_limit() {
        assert_eq!(box_fold(1.5, 1.0), 0.5);
    }

    #[test]
    fn sphere_fold_inverts_inside_r_min() {
        let mut p = Point3::new(0.01, 0.0, 0.0);
        let mut dr = 1.0;
        sphere_fold(&mut p, &mut dr, 0.5, 1.0);
        assert!(p.x > 0.01);
        assert!(dr > 1.0);
    }

    #[test]
    fn sphere_fold_leaves_far_points_untouched() {
        let mut p = Point3::new(10.0, 0.0, 0.0);
        let mut dr = 1.0;
        sphere_fold(&mut p, &mut dr, 0.5, 1.0);
        assert_eq!(p.x, 10.0);
        assert_eq!(dr, 1.0);
    }
}
