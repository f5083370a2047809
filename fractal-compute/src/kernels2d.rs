//! Escape-time kernels for the Mandelbrot-family plane fractals (C1).
//!
//! Each kernel shares the common escape test `|z|² > bailout²` and produces
//! both the raw iteration count and the smooth (fractional) count.

use fractal_core::{CommonParams, F64Complex, PlaneKind};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EscapeResult {
    pub iterations: u32,
    pub escaped: bool,
    pub final_z: (f64, f64),
}

/// `iterate(point, params) → {iterations, finalZ, escaped}`.
pub fn iterate(kind: &PlaneKind, point: F64Complex, common: &CommonParams) -> EscapeResult {
    let zero = F64Complex::new(0.0, 0.0);
    match kind {
        PlaneKind::Mandelbrot { power } if *power == 2.0 => {
            iterate_quadratic(zero, point, common, false)
        }
        PlaneKind::Mandelbrot { power } => iterate_power(zero, point, *power, common),
        PlaneKind::Julia { c } => iterate_quadratic(point, *c, common, false),
        PlaneKind::BurningShip => iterate_burning_ship(zero, point, common),
        PlaneKind::Tricorn => iterate_tricorn(zero, point, common),
        PlaneKind::MandelPower { n } => iterate_power(zero, point, *n, common),
    }
}

/// Tight inner loop for power-2 Mandelbrot/Julia: maintains `(zr, zi, zr², zi²)`.
fn iterate_quadratic(
    z0: F64Complex,
    c: F64Complex,
    common: &CommonParams,
    _conjugate: bool,
) -> EscapeResult {
    let mut zr = z0.re;
    let mut zi = z0.im;
    let mut zr2 = zr * zr;
    let mut zi2 = zi * zi;
    let bailout_sq = common.bailout * common.bailout;

    let mut n = 0u32;
    while n < common.max_iterations {
        if zr2 + zi2 > bailout_sq {
            return EscapeResult {
                iterations: n,
                escaped: true,
                final_z: (zr, zi),
            };
        }
        let new_zi = 2.0 * zr * zi + c.im;
        let new_zr = zr2 - zi2 + c.re;
        zr = new_zr;
        zi = new_zi;
        zr2 = zr * zr;
        zi2 = zi * zi;
        n += 1;
    }

    EscapeResult {
        iterations: common.max_iterations,
        escaped: false,
        final_z: (zr, zi),
    }
}

fn iterate_burning_ship(z0: F64Complex, c: F64Complex, common: &CommonParams) -> EscapeResult {
    let mut zr = z0.re;
    let mut zi = z0.im;
    let bailout_sq = common.bailout * common.bailout;

    let mut n = 0u32;
    while n < common.max_iterations {
        if zr * zr + zi * zi > bailout_sq {
            return EscapeResult {
                iterations: n,
                escaped: true,
                final_z: (zr, zi),
            };
        }
        let ar = zr.abs();
        let ai = zi.abs();
        let new_zr = ar * ar - ai * ai + c.re;
        let new_zi = 2.0 * ar * ai + c.im;
        zr = new_zr;
        zi = new_zi;
        n += 1;
    }

    EscapeResult {
        iterations: common.max_iterations,
        escaped: false,
        final_z: (zr, zi),
    }
}

/// Tricorn: conjugate then square, `zi' = -2·zr·zi + ci`.
fn iterate_tricorn(z0: F64Complex, c: F64Complex, common: &CommonParams) -> EscapeResult {
    let mut zr = z0.re;
    let mut zi = z0.im;
    let bailout_sq = common.bailout * common.bailout;

    let mut n = 0u32;
    while n < common.max_iterations {
        if zr * zr + zi * zi > bailout_sq {
            return EscapeResult {
                iterations: n,
                escaped: true,
                final_z: (zr, zi),
            };
        }
        let new_zr = zr * zr - zi * zi + c.re;
        let new_zi = -2.0 * zr * zi + c.im;
        zr = new_zr;
        zi = new_zi;
        n += 1;
    }

    EscapeResult {
        iterations: common.max_iterations,
        escaped: false,
        final_z: (zr, zi),
    }
}

/// Higher-power Mandelbrot via polar form; `r = 0` is clamped to avoid NaN in `atan2`.
fn iterate_power(z0: F64Complex, c: F64Complex, power: f64, common: &CommonParams) -> EscapeResult {
    let mut zr = z0.re;
    let mut zi = z0.im;
    let bailout_sq = common.bailout * common.bailout;

    let mut n = 0u32;
    while n < common.max_iterations {
        if zr * zr + zi * zi > bailout_sq {
            return EscapeResult {
                iterations: n,
                escaped: true,
                final_z: (zr, zi),
            };
        }
        let r = (zr * zr + zi * zi).sqrt().max(1e-300);
        let theta = if r <= 1e-300 { 0.0 } else { zi.atan2(zr) };
        let r_pow = r.powf(power);
        let new_zr = r_pow * (power * theta).cos() + c.re;
        let new_zi = r_pow * (power * theta).sin() + c.im;
        zr = new_zr;
        zi = new_zi;
        n += 1;
    }

    EscapeResult {
        iterations: common.max_iterations,
        escaped: false,
        final_z: (zr, zi),
    }
}

/// `n + 1 − log₂(log|z|²/2) / log 2`. Interior pixels return `max_iterations`.
pub fn smooth_iteration_count(result: &EscapeResult, max_iterations: u32) -> f64 {
    if !result.escaped {
        return max_iterations as f64;
    }
    let (zr, zi) = result.final_z;
    let mag_sq = (zr * zr + zi * zi).max(1.0 + 1e-10);
    let log_zn = mag_sq.ln() / 2.0;
    result.iterations as f64 + 1.0 - (log_zn.ln() / std::f64::consts::LN_2).max(f64::MIN_POSITIVE.ln())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common(max_iterations: u32) -> CommonParams {
        CommonParams {
            max_iterations,
            bailout: 4.0,
            ..Default::default()
        }
    }

    #[test]
    fn s1_direct_mandelbrot_point_on_cardioid_stays_interior() {
        let kind = PlaneKind::Mandelbrot { power: 2.0 };
        let c = F64Complex::new(0.25, 0.0);
        let result = iterate(&kind, c, &common(1000));
        assert!(!result.escaped);
        assert_eq!(result.iterations, 1000);
    }

    #[test]
    fn s2_direct_mandelbrot_c_equals_one_escapes_at_three() {
        let kind = PlaneKind::Mandelbrot { power: 2.0 };
        let c = F64Complex::new(1.0, 0.0);
        let result = iterate(&kind, c, &common(1000));
        assert!(result.escaped);
        assert_eq!(result.iterations, 3);
    }

    #[test]
    fn s3_burning_ship_known_escape() {
        let kind = PlaneKind::BurningShip;
        let c = F64Complex::new(-1.75, -0.04);
        let result = iterate(&kind, c, &common(200));
        assert!(result.escaped);
    }

    #[test]
    fn s9_zero_max_iterations_returns_zero_and_interior() {
        let kind = PlaneKind::Mandelbrot { power: 2.0 };
        let c = F64Complex::new(1.0, 0.0);
        let result = iterate(&kind, c, &common(0));
        assert_eq!(result.iterations, 0);
        assert!(!result.escaped);
    }

    #[test]
    fn tricorn_pins_sign_convention_with_concrete_escape() {
        // c = (0.5, 0.5): conjugate-then-square diverges quickly under this
        // sign convention; pins the behavior the spec leaves as an open question.
        let kind = PlaneKind::Tricorn;
        let c = F64Complex::new(0.5, 0.5);
        let result = iterate(&kind, c, &common(200));
        assert!(result.escaped);
        assert!(result.iterations < 10);
    }

    #[test]
    fn mandel_power_clamps_r_zero_without_nan() {
        let kind = PlaneKind::MandelPower { n: 3.0 };
        let c = F64Complex::new(0.0, 0.0);
        let result = iterate(&kind, c, &common(50));
        assert!(result.final_z.0.is_finite());
        assert!(result.final_z.1.is_finite());
    }

    #[test]
    fn smooth_iteration_count_is_interior_constant_when_not_escaped() {
        let result = EscapeResult {
            iterations: 500,
            escaped: false,
            final_z: (0.0, 0.0),
        };
        assert_eq!(smooth_iteration_count(&result, 500), 500.0);
    }

    #[test]
    fn smooth_iteration_count_is_close_to_raw_count_on_escape() {
        let kind = PlaneKind::Mandelbrot { power: 2.0 };
        let c = F64Complex::new(1.0, 0.0);
        let result = iterate(&kind, c, &common(1000));
        let smooth = smooth_iteration_count(&result, 1000);
        assert!((smooth - result.iterations as f64).abs() < 1.0);
    }
}
