//! Full-precision reference orbit computation, shared by every perturbation
//! kernel regardless of which delta representation the pixel loop uses.
//!
//! Alongside the orbit itself this tracks the derivative `Der_n` w.r.t. `c`,
//! which the bilinear approximation series needs to skip early iterations.

use fractal_core::{BigFloat, HighPrecisionComplex};

#[derive(Clone, Debug)]
pub struct ReferenceOrbit {
    pub c_ref: (f64, f64),
    pub orbit: Vec<(f64, f64)>,
    /// `Der_n`, the orbit's derivative w.r.t. `c`, snapshotted as f64 alongside `orbit`.
    pub derivatives: Vec<(f64, f64)>,
    pub escaped_at: Option<u32>,
}

impl ReferenceOrbit {
    /// Iterates `Z_{n+1} = Z_n² + c` and `Der_{n+1} = 2·Z_n·Der_n + 1` at full
    /// precision, snapshotting both sequences to f64 at every step.
    pub fn compute(c_ref: &(BigFloat, BigFloat), max_iterations: u32, bailout: f64) -> Self {
        let precision_bits = c_ref.0.precision_bits();
        let mut z = HighPrecisionComplex::zero(precision_bits);
        let c = HighPrecisionComplex::new(c_ref.0.clone(), c_ref.1.clone());

        let mut der_re = BigFloat::zero(precision_bits);
        let mut der_im = BigFloat::zero(precision_bits);
        let one = BigFloat::one(precision_bits);

        let bailout_sq = BigFloat::with_precision(bailout * bailout, precision_bits);
        let c_ref_f64 = (c_ref.0.to_f64(), c_ref.1.to_f64());

        let mut orbit = Vec::with_capacity(max_iterations as usize + 1);
        let mut derivatives = Vec::with_capacity(max_iterations as usize + 1);
        let mut escaped_at = None;

        orbit.push((z.re.to_f64(), z.im.to_f64()));
        derivatives.push((der_re.to_f64(), der_im.to_f64()));

        for n in 0..max_iterations {
            // Der_{n+1} = 2 * z * der + 1
            let two_zre = z.re.add(&z.re);
            let two_zim = z.im.add(&z.im);
            let new_der_re = two_zre
                .mul(&der_re)
                .sub(&two_zim.mul(&der_im))
                .add(&one);
            let new_der_im = two_zre.mul(&der_im).add(&two_zim.mul(&der_re));
            der_re = new_der_re;
            der_im = new_der_im;

            z = z.square_plus(&c);

            orbit.push((z.re.to_f64(), z.im.to_f64()));
            derivatives.push((der_re.to_f64(), der_im.to_f64()));

            let mag_sq = z.norm_sq();
            if mag_sq.gt(&bailout_sq) {
                escaped_at = Some(n + 1);
                break;
            }
        }

        ReferenceOrbit {
            c_ref: c_ref_f64,
            orbit,
            derivatives,
            escaped_at,
        }
    }

    pub fn len(&self) -> usize {
        self.orbit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orbit.is_empty()
    }

    pub fn at(&self, m: usize) -> (f64, f64) {
        self.orbit[m % self.orbit.len()]
    }

    pub fn derivative_at(&self, m: usize) -> (f64, f64) {
        self.derivatives[m % self.derivatives.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_at_origin_stays_bounded_and_does_not_escape() {
        let c = (BigFloat::with_precision(0.0, 128), BigFloat::with_precision(0.0, 128));
        let orbit = ReferenceOrbit::compute(&c, 200, 4.0);
        assert!(orbit.escaped_at.is_none());
        assert_eq!(orbit.len(), 201);
    }

    #[test]
    fn orbit_at_c_equals_one_escapes_at_expected_iteration() {
        let c = (BigFloat::with_precision(1.0, 128), BigFloat::with_precision(0.0, 128));
        let orbit = ReferenceOrbit::compute(&c, 200, 4.0);
        assert_eq!(orbit.escaped_at, Some(3));
    }

    #[test]
    fn wrap_around_indexing_never_panics_past_orbit_length() {
        let c = (BigFloat::with_precision(0.25, 128), BigFloat::with_precision(0.0, 128));
        let orbit = ReferenceOrbit::compute(&c, 50, 4.0);
        let wrapped = orbit.at(orbit.len() + 5);
        let direct = orbit.at(5);
        assert_eq!(wrapped, direct);
    }

    #[test]
    fn derivative_grows_away_from_zero_under_iteration() {
        let c = (BigFloat::with_precision(0.25, 128), BigFloat::with_precision(0.0, 128));
        let orbit = ReferenceOrbit::compute(&c, 50, 4.0);
        let (d0_re, _) = orbit.derivative_at(0);
        let (d_last_re, _) = orbit.derivative_at(orbit.len() - 1);
        assert_eq!(d0_re, 0.0);
        assert!(d_last_re.abs() > 0.0);
    }
}
