//! Per-pixel perturbation kernels (C2): given a precomputed reference orbit,
//! iterate the delta `δz` instead of the full-precision `z`.
//!
//! Three tiers share one glitch/rebase algorithm, differing only in how the
//! delta is represented: `f64` and `FloatExp` dispatch through the
//! [`ComplexDelta`] trait into [`perturb_generic`]; the `BigFloat` tier keeps
//! its own loop since [`HighPrecisionComplex`] isn't `Copy` and carries its
//! own arithmetic.

use fractal_core::{BigFloat, ComplexDelta, F64Complex, FloatExp, FloatExpComplex, HighPrecisionComplex};

use crate::bla::BlaTable;
use crate::reference_orbit::ReferenceOrbit;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerturbationResult {
    pub iterations: u32,
    pub max_iterations: u32,
    pub escaped: bool,
    pub glitched: bool,
}

/// Squared-magnitude tolerance ratio for the Pauldelbrot glitch test.
pub const DEFAULT_GLITCH_TOLERANCE_SQ: f64 = 1e-12;

/// Reference magnitudes below this are too close to zero for the glitch
/// ratio test to be meaningful; skip the check rather than divide by noise.
const GLITCH_SKIP_THRESHOLD: f64 = 1e-20;

/// `f64`-tier perturbation with bilinear-series iteration-skip: before each
/// standard step, consults `bla` for the coarsest table entry valid at the
/// current `(m, δz)`. A skip is only committed after reconstructing the
/// actual orbit point `Z_{m+L} + δz_{m+L}` and re-checking the bailout test
/// against it — the table's own validity radius bounds the linear error, but
/// this still re-verifies the real escape condition rather than trusting the
/// radius alone.
pub fn perturb_f64(
    orbit: &ReferenceOrbit,
    delta_c: F64Complex,
    max_iterations: u32,
    bailout: f64,
    tau_sq: f64,
    bla: Option<&BlaTable>,
) -> PerturbationResult {
    let bailout_sq = bailout * bailout;
    let mut delta_z = F64Complex::new(0.0, 0.0);
    let mut m: usize = 0;
    let mut n: u32 = 0;
    let mut glitched = false;

    while n < max_iterations {
        if let Some(table) = bla {
            if let Some(entry) = table.lookup(m, delta_z) {
                if entry.l > 0 && n + entry.l <= max_iterations {
                    let skipped_delta_z = entry.apply(delta_z, delta_c);
                    let target_m = (m + entry.l as usize) % orbit.len().max(1);
                    let z_ref = orbit.at(target_m);
                    let z_re = z_ref.0 + skipped_delta_z.re;
                    let z_im = z_ref.1 + skipped_delta_z.im;
                    if z_re * z_re + z_im * z_im <= bailout_sq {
                        delta_z = skipped_delta_z;
                        n += entry.l;
                        m = target_m;
                        continue;
                    }
                }
            }
        }

        let z_ref = orbit.at(m);
        let z_ref_lifted = F64Complex::new(z_ref.0, z_ref.1);
        let z = z_ref_lifted.add(&delta_z);

        let z_mag_sq = z.re * z.re + z.im * z.im;
        if z_mag_sq > bailout_sq {
            return PerturbationResult {
                iterations: n,
                max_iterations,
                escaped: true,
                glitched,
            };
        }

        let z_ref_mag_sq = z_ref_lifted.re * z_ref_lifted.re + z_ref_lifted.im * z_ref_lifted.im;
        if z_ref_mag_sq > GLITCH_SKIP_THRESHOLD && z_mag_sq < tau_sq * z_ref_mag_sq {
            glitched = true;
        }

        let delta_z_mag_sq = delta_z.re * delta_z.re + delta_z.im * delta_z.im;
        if z_mag_sq < delta_z_mag_sq {
            delta_z = z;
            m = 0;
            n += 1;
            continue;
        }

        // δz' = 2·Z_m·δz + δz² + δc
        delta_z = z_ref_lifted.scale(2.0).mul(&delta_z).add(&delta_z.square()).add(&delta_c);
        m += 1;
        n += 1;
    }

    PerturbationResult {
        iterations: max_iterations,
        max_iterations,
        escaped: false,
        glitched,
    }
}

pub fn perturb_floatexp(
    orbit: &ReferenceOrbit,
    delta_c: FloatExpComplex,
    max_iterations: u32,
    bailout: f64,
    tau_sq: f64,
) -> PerturbationResult {
    perturb_generic(orbit, delta_c, max_iterations, bailout, tau_sq, |z: &(f64, f64)| {
        FloatExpComplex::new(FloatExp::from_f64(z.0), FloatExp::from_f64(z.1))
    })
}

fn perturb_generic<D: ComplexDelta, F: Fn(&(f64, f64)) -> D>(
    orbit: &ReferenceOrbit,
    delta_c: D,
    max_iterations: u32,
    bailout: f64,
    tau_sq: f64,
    lift: F,
) -> PerturbationResult {
    let bailout_sq = bailout * bailout;
    let mut delta_z = delta_c.zero();
    let mut m: usize = 0;
    let mut glitched = false;

    for n in 0..max_iterations {
        let z_ref = orbit.at(m);
        let z_ref_lifted = lift(&z_ref);
        let z = z_ref_lifted.add(&delta_z);

        let (zx, zy) = z.to_f64_pair();
        let z_mag_sq = zx * zx + zy * zy;
        if z_mag_sq > bailout_sq {
            return PerturbationResult {
                iterations: n,
                max_iterations,
                escaped: true,
                glitched,
            };
        }

        let (zrx, zry) = z_ref_lifted.to_f64_pair();
        let z_ref_mag_sq = zrx * zrx + zry * zry;
        if z_ref_mag_sq > GLITCH_SKIP_THRESHOLD && z_mag_sq < tau_sq * z_ref_mag_sq {
            glitched = true;
        }

        let (dzx, dzy) = delta_z.to_f64_pair();
        let delta_z_mag_sq = dzx * dzx + dzy * dzy;
        if z_mag_sq < delta_z_mag_sq {
            delta_z = z;
            m = 0;
            continue;
        }

        // δz' = 2·Z_m·δz + δz² + δc
        delta_z = z_ref_lifted.scale(2.0).mul(&delta_z).add(&delta_z.square()).add(&delta_c);
        m += 1;
    }

    PerturbationResult {
        iterations: max_iterations,
        max_iterations,
        escaped: false,
        glitched,
    }
}

pub fn perturb_bigfloat(
    orbit: &ReferenceOrbit,
    delta_c: HighPrecisionComplex,
    max_iterations: u32,
    bailout: f64,
    tau_sq: f64,
) -> PerturbationResult {
    let precision_bits = delta_c.re.precision_bits();
    let bailout_sq = bailout * bailout;
    let mut delta_z = HighPrecisionComplex::zero(precision_bits);
    let mut m: usize = 0;
    let mut glitched = false;

    for n in 0..max_iterations {
        let z_ref = orbit.at(m);
        let z_ref_bf = HighPrecisionComplex::new(
            BigFloat::with_precision(z_ref.0, precision_bits),
            BigFloat::with_precision(z_ref.1, precision_bits),
        );
        let z = HighPrecisionComplex::new(z_ref_bf.re.add(&delta_z.re), z_ref_bf.im.add(&delta_z.im));

        let zx = z.re.to_f64();
        let zy = z.im.to_f64();
        let z_mag_sq = zx * zx + zy * zy;
        if z_mag_sq > bailout_sq {
            return PerturbationResult {
                iterations: n,
                max_iterations,
                escaped: true,
                glitched,
            };
        }

        let z_ref_mag_sq = z_ref.0 * z_ref.0 + z_ref.1 * z_ref.1;
        if z_ref_mag_sq > GLITCH_SKIP_THRESHOLD && z_mag_sq < tau_sq * z_ref_mag_sq {
            glitched = true;
        }

        let dzx = delta_z.re.to_f64();
        let dzy = delta_z.im.to_f64();
        let delta_z_mag_sq = dzx * dzx + dzy * dzy;
        if z_mag_sq < delta_z_mag_sq {
            delta_z = z;
            m = 0;
            continue;
        }

        // δz' = 2·Z_m·δz + δz² + δc
        let two_zref_re = z_ref_bf.re.add(&z_ref_bf.re);
        let two_zref_im = z_ref_bf.im.add(&z_ref_bf.im);
        let cross_re = two_zref_re.mul(&delta_z.re).sub(&two_zref_im.mul(&delta_z.im));
        let cross_im = two_zref_re.mul(&delta_z.im).add(&two_zref_im.mul(&delta_z.re));
        let sq_re = delta_z.re.mul(&delta_z.re).sub(&delta_z.im.mul(&delta_z.im));
        let sq_im = delta_z.re.mul(&delta_z.im).add(&delta_z.im.mul(&delta_z.re));
        delta_z = HighPrecisionComplex::new(
            cross_re.add(&sq_re).add(&delta_c.re),
            cross_im.add(&sq_im).add(&delta_c.im),
        );
        m += 1;
    }

    PerturbationResult {
        iterations: max_iterations,
        max_iterations,
        escaped: false,
        glitched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractal_core::BigFloat;

    fn mandelbrot_orbit(precision_bits: usize) -> ReferenceOrbit {
        let c = (
            BigFloat::with_precision(-0.5, precision_bits),
            BigFloat::with_precision(0.0, precision_bits),
        );
        ReferenceOrbit::compute(&c, 500, 4.0)
    }

    #[test]
    fn perturbation_f64_matches_direct_iteration_near_reference() {
        let orbit = mandelbrot_orbit(64);
        let delta = F64Complex::new(1e-6, 1e-6);
        let result = perturb_f64(&orbit, delta, 500, 4.0, 1e-6, None);
        assert_eq!(result.max_iterations, 500);
        assert!(result.iterations <= 500);
    }

    #[test]
    fn perturbation_floatexp_handles_deep_zoom_delta() {
        let orbit = mandelbrot_orbit(256);
        let delta = FloatExpComplex::new(FloatExp::from_f64(1e-300), FloatExp::from_f64(0.0));
        let result = perturb_floatexp(&orbit, delta, 500, 4.0, 1e-6);
        assert!(result.iterations <= 500);
    }

    #[test]
    fn perturbation_bigfloat_agrees_with_f64_tier_at_modest_precision() {
        let orbit = mandelbrot_orbit(128);
        let delta_f64 = F64Complex::new(0.01, 0.0);
        let result_f64 = perturb_f64(&orbit, delta_f64, 500, 4.0, 1e-6, None);

        let delta_bf = HighPrecisionComplex::new(
            BigFloat::with_precision(0.01, 128),
            BigFloat::with_precision(0.0, 128),
        );
        let result_bf = perturb_bigfloat(&orbit, delta_bf, 500, 4.0, 1e-6);

        assert_eq!(result_f64.escaped, result_bf.escaped);
        assert_eq!(result_f64.iterations, result_bf.iterations);
    }

    #[test]
    fn rebase_resets_m_when_z_smaller_than_delta_z() {
        // delta_c = -c_ref re-centers the orbit at zero: z stays small while
        // the reference wanders, forcing at least one rebase.
        let orbit = mandelbrot_orbit(64);
        let delta = F64Complex::new(0.5, 0.0);
        let result = perturb_f64(&orbit, delta, 200, 4.0, 1e-6, None);
        assert!(result.iterations <= 200);
    }

    #[test]
    fn glitch_flag_is_false_when_reference_magnitude_is_near_zero() {
        let orbit = mandelbrot_orbit(64);
        let delta = F64Complex::new(0.0, 0.0);
        let result = perturb_f64(&orbit, delta, 10, 4.0, 1e-6, None);
        assert!(!result.glitched);
    }

    #[test]
    fn bla_table_skip_agrees_with_the_unskipped_result() {
        let orbit = mandelbrot_orbit(500);
        let table = BlaTable::build(&orbit);
        let delta = F64Complex::new(1e-9, -1e-9);

        let without_skip = perturb_f64(&orbit, delta, 500, 4.0, 1e-6, None);
        let with_skip = perturb_f64(&orbit, delta, 500, 4.0, 1e-6, Some(&table));

        assert_eq!(without_skip.escaped, with_skip.escaped);
        assert_eq!(without_skip.iterations, with_skip.iterations);
    }
}
