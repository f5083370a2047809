//! Quaternion Julia set sliced at `w = slice_w`: iterates `q ← q^power + c`
//! in full quaternion arithmetic and renders the 3D cross-section.

use fractal_core::{Point3, Quaternion};

use super::DeResult;

pub fn de(pos: Point3<f64>, c: Quaternion, slice_w: f64, power: f64, max_iterations: u32, bailout: f64) -> DeResult {
    let mut q = Quaternion::new(pos.x, pos.y, pos.z, slice_w);
    let mut dq = Quaternion::new(1.0, 0.0, 0.0, 0.0);
    let bailout_sq = bailout * bailout;
    let mut trap = f64::MAX;

    let mut iterations = 0u32;
    for i in 0..max_iterations {
        trap = trap.min(q.norm());

        if q.norm_sq() > bailout_sq {
            iterations = i;
            break;
        }

        if (power - 2.0).abs() < 1e-12 {
            // Analytic derivative for the power-2 case: dq' = 2*q*dq.
            dq = q.scale(2.0).mul(&dq);
            q = q.square().add(&c);
        } else {
            dq = derivative_step(&q, &dq, power);
            q = quaternion_pow(&q, power).add(&c);
        }
        iterations = i + 1;
    }

    let r = q.norm();
    let dq_norm = dq.norm().max(1e-300);
    let distance = 0.5 * r * r.max(1e-300).ln() / dq_norm;
    DeResult::new(distance.max(0.0), iterations, trap)
}

/// Finite-difference derivative for non-integer/non-2 powers, matching the
/// analytic 2-power case in the limit `power → 2`.
fn derivative_step(q: &Quaternion, dq: &Quaternion, power: f64) -> Quaternion {
    let scale = power * q.norm().max(1e-300).powf(power - 1.0);
    dq.scale(scale)
}

fn quaternion_pow(q: &Quaternion, power: f64) -> Quaternion {
    let r = q.norm();
    if r < 1e-300 {
        return Quaternion::zero();
    }
    let theta = (q.w / r).clamp(-1.0, 1.0).acos();
    let sin_theta = theta.sin();
    let r_pow = r.powf(power);
    if sin_theta.abs() < 1e-12 {
        return Quaternion::new(r_pow, 0.0, 0.0, 0.0);
    }
    let vec_scale = (power * theta).sin() / sin_theta;
    Quaternion::new(
        r_pow * (power * theta).cos(),
        r_pow * vec_scale * q.x / r,
        r_pow * vec_scale * q.y / r,
        r_pow * vec_scale * q.z / r,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_two_slice_is_finite_everywhere() {
        let c = Quaternion::new(-0.2, 0.6, 0.2, 0.2);
        let result = de(Point3::zero(), c, 0.0, 2.0, 30, 4.0);
        assert!(result.distance.is_finite());
    }

    #[test]
    fn far_point_escapes_quickly() {
        let c = Quaternion::new(-0.2, 0.6, 0.2, 0.2);
        let result = de(Point3::new(5.0, 5.0, 5.0), c, 0.0, 2.0, 30, 4.0);
        assert!(result.iterations < 5);
    }
}
