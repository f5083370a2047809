//! Mandelbox: alternating box-fold and spherical-fold (Amazing Box family),
//! producing the characteristic nested rounded-cube structure.

use fractal_core::Point3;

use super::{box_fold, sphere_fold, DeResult};

pub fn de(pos: Point3<f64>, scale: f64, fold_limit: f64, r_min: f64, r_fix: f64, max_iterations: u32) -> DeResult {
    let c = pos;
    let mut z = pos;
    let mut dr = 1.0f64;
    let mut trap = f64::MAX;

    for _ in 0..max_iterations {
        z = Point3::new(
            box_fold(z.x, fold_limit),
            box_fold(z.y, fold_limit),
            box_fold(z.z, fold_limit),
        );

        sphere_fold(&mut z, &mut dr, r_min, r_fix);

        z = z.scale(scale).add(&c);
        dr = dr * scale.abs() + 1.0;

        trap = trap.min(z.length());
    }

    let r = z.length();
    let distance = r / dr.abs().max(1e-300);
    DeResult::new(distance.max(0.0), max_iterations, trap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_stays_bounded_under_standard_parameters() {
        let result = de(Point3::zero(), -1.5, 1.0, 0.5, 1.0, 20);
        assert!(result.distance.is_finite());
    }

    #[test]
    fn far_point_has_larger_distance_estimate_than_near_point() {
        let near = de(Point3::new(0.1, 0.0, 0.0), -1.5, 1.0, 0.5, 1.0, 20);
        let far = de(Point3::new(10.0, 10.0, 10.0), -1.5, 1.0, 0.5, 1.0, 20);
        assert!(far.distance > near.distance);
    }
}
