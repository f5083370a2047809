//! Mandelbulb: the triplex-number generalization of `z ← zⁿ + c` to `Point3`,
//! using the standard spherical-coordinate power formula with analytic
//! derivative tracking for the distance estimate.

use fractal_core::Point3;

use super::DeResult;

pub fn de(pos: Point3<f64>, power: f64, max_iterations: u32, bailout: f64) -> DeResult {
    let c = pos;
    let mut z = pos;
    let mut dr = 1.0f64;
    let mut r = 0.0f64;
    let mut trap = f64::MAX;
    let bailout_sq = bailout * bailout;

    let mut iterations = 0u32;
    for i in 0..max_iterations {
        r = z.length();
        trap = trap.min(r);
        if r * r > bailout_sq {
            iterations = i;
            break;
        }

        // dr' = r^(n-1) * n * dr + 1
        dr = r.powf(power - 1.0) * power * dr + 1.0;

        let r_safe = r.max(1e-300);
        let theta = (z.z / r_safe).clamp(-1.0, 1.0).acos();
        let phi = z.y.atan2(z.x);
        let zr = r.powf(power);

        let new_theta = theta * power;
        let new_phi = phi * power;

        z = Point3::new(
            zr * new_theta.sin() * new_phi.cos(),
            zr * new_theta.sin() * new_phi.sin(),
            zr * new_theta.cos(),
        )
        .add(&c);

        iterations = i + 1;
    }

    let distance = if r > 0.0 { 0.5 * r.ln() * r / dr } else { 0.0 };
    DeResult::new(distance.max(0.0), iterations, trap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_never_escapes_and_distance_is_finite() {
        let result = de(Point3::zero(), 8.0, 50, 4.0);
        assert_eq!(result.iterations, 50);
        assert!(result.distance.is_finite());
    }

    #[test]
    fn far_point_escapes_quickly() {
        let result = de(Point3::new(5.0, 5.0, 5.0), 8.0, 50, 4.0);
        assert!(result.iterations < 5);
    }

    #[test]
    fn orbit_trap_is_at_most_initial_radius() {
        let pos = Point3::new(0.3, 0.0, 0.0);
        let result = de(pos, 8.0, 20, 4.0);
        assert!(result.orbit_trap <= pos.length() + 1e-9);
    }
}
