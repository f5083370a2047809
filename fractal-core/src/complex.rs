//! Complex number types: the f64 hot-path pair, the high-precision pair used
//! only inside the reference orbit, and the `ComplexDelta` trait abstraction
//! that lets the perturbation engine be generic over delta representation.

use crate::{BigFloat, FloatExp};
use serde::{Deserialize, Serialize};

/// Complex number type for perturbation delta arithmetic.
///
/// Abstracts operations needed for perturbation iteration, enabling a single
/// generic implementation over `F64Complex` (shallow zoom) and
/// `FloatExpComplex` (deep zoom, beyond f64's exponent range).
pub trait ComplexDelta: Clone + Sized {
    fn zero(&self) -> Self;
    fn from_f64_pair(re: f64, im: f64) -> Self;
    fn to_f64_pair(&self) -> (f64, f64);
    fn add(&self, other: &Self) -> Self;
    fn sub(&self, other: &Self) -> Self;
    fn mul(&self, other: &Self) -> Self;
    fn scale(&self, factor: f64) -> Self;
    fn square(&self) -> Self;
    /// Magnitude squared as f64 (for escape/rebase/glitch checks).
    fn norm_sq(&self) -> f64;
}

/// Simple f64 complex number — the default perturbation delta representation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct F64Complex {
    pub re: f64,
    pub im: f64,
}

impl F64Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl ComplexDelta for F64Complex {
    #[inline]
    fn zero(&self) -> Self {
        Self { re: 0.0, im: 0.0 }
    }

    #[inline]
    fn from_f64_pair(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    #[inline]
    fn to_f64_pair(&self) -> (f64, f64) {
        (self.re, self.im)
    }

    #[inline]
    fn add(&self, other: &Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }

    #[inline]
    fn sub(&self, other: &Self) -> Self {
        Self {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }

    #[inline]
    fn mul(&self, other: &Self) -> Self {
        Self {
            re: self.re * other.re - self.im * other.im,
            im: self.re * other.im + self.im * other.re,
        }
    }

    #[inline]
    fn scale(&self, factor: f64) -> Self {
        Self {
            re: self.re * factor,
            im: self.im * factor,
        }
    }

    #[inline]
    fn square(&self) -> Self {
        Self {
            re: self.re * self.re - self.im * self.im,
            im: 2.0 * self.re * self.im,
        }
    }

    #[inline]
    fn norm_sq(&self) -> f64 {
        self.re * self.re + self.im * self.im
    }
}

/// Extended-range complex delta, built from two `FloatExp` components.
/// Used once `FloatExp::from_f64` of the pixel-step size would underflow —
/// deep enough zoom that `F64Complex` deltas can't represent the magnitude.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FloatExpComplex {
    pub re: FloatExp,
    pub im: FloatExp,
}

impl FloatExpComplex {
    pub fn new(re: FloatExp, im: FloatExp) -> Self {
        Self { re, im }
    }
}

impl ComplexDelta for FloatExpComplex {
    #[inline]
    fn zero(&self) -> Self {
        Self {
            re: FloatExp::zero(),
            im: FloatExp::zero(),
        }
    }

    #[inline]
    fn from_f64_pair(re: f64, im: f64) -> Self {
        Self {
            re: FloatExp::from_f64(re),
            im: FloatExp::from_f64(im),
        }
    }

    #[inline]
    fn to_f64_pair(&self) -> (f64, f64) {
        (self.re.to_f64(), self.im.to_f64())
    }

    #[inline]
    fn add(&self, other: &Self) -> Self {
        Self {
            re: self.re.add(&other.re),
            im: self.im.add(&other.im),
        }
    }

    #[inline]
    fn sub(&self, other: &Self) -> Self {
        Self {
            re: self.re.sub(&other.re),
            im: self.im.sub(&other.im),
        }
    }

    #[inline]
    fn mul(&self, other: &Self) -> Self {
        let re = self.re.mul(&other.re).sub(&self.im.mul(&other.im));
        let im = self.re.mul(&other.im).add(&self.im.mul(&other.re));
        Self { re, im }
    }

    #[inline]
    fn scale(&self, factor: f64) -> Self {
        Self {
            re: self.re.mul_f64(factor),
            im: self.im.mul_f64(factor),
        }
    }

    #[inline]
    fn square(&self) -> Self {
        let re = self.re.mul(&self.re).sub(&self.im.mul(&self.im));
        let im = self.re.mul(&self.im).mul_f64(2.0);
        Self { re, im }
    }

    #[inline]
    fn norm_sq(&self) -> f64 {
        FloatExp::norm_sq(&self.re, &self.im)
    }
}

/// Pair of high-precision scalars, used only inside the reference-orbit
/// computation (`z ← z² + c` at full precision). Never touches the per-pixel
/// hot path.
#[derive(Clone, Debug)]
pub struct HighPrecisionComplex {
    pub re: BigFloat,
    pub im: BigFloat,
}

impl HighPrecisionComplex {
    pub fn new(re: BigFloat, im: BigFloat) -> Self {
        Self { re, im }
    }

    pub fn zero(precision_bits: usize) -> Self {
        Self {
            re: BigFloat::zero(precision_bits),
            im: BigFloat::zero(precision_bits),
        }
    }

    /// `z² + c`, the reference-orbit recurrence.
    pub fn square_plus(&self, c: &Self) -> Self {
        let re_sq = self.re.mul(&self.re);
        let im_sq = self.im.mul(&self.im);
        let two_re_im = self.re.mul(&self.im).mul(&BigFloat::with_precision(
            2.0,
            self.re.precision_bits(),
        ));
        Self {
            re: re_sq.sub(&im_sq).add(&c.re),
            im: two_re_im.add(&c.im),
        }
    }

    pub fn norm_sq(&self) -> BigFloat {
        self.re.mul(&self.re).add(&self.im.mul(&self.im))
    }

    pub fn to_f64_pair(&self) -> (f64, f64) {
        (self.re.to_f64(), self.im.to_f64())
    }
}

/// Quaternion (f64×4): scalar `w` and vector part `(x, y, z)`.
/// Supports the Hamilton product and squaring needed for quaternion Julia.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Hamilton product `self * other`.
    pub fn mul(&self, other: &Self) -> Self {
        Self {
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        }
    }

    pub fn square(&self) -> Self {
        self.mul(self)
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            w: self.w + other.w,
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }

    pub fn scale(&self, s: f64) -> Self {
        Self {
            w: self.w * s,
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    pub fn norm_sq(&self) -> f64 {
        self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn norm(&self) -> f64 {
        self.norm_sq().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f64_complex_mul() {
        let a = F64Complex::new(1.0, 2.0);
        let b = F64Complex::new(3.0, 4.0);
        assert_eq!(a.mul(&b).to_f64_pair(), (-5.0, 10.0));
    }

    #[test]
    fn f64_complex_square_matches_mul_self() {
        let a = F64Complex::new(3.0, 4.0);
        assert_eq!(a.square(), a.mul(&a));
    }

    #[test]
    fn float_exp_complex_matches_f64_complex_in_normal_range() {
        let a = F64Complex::new(1.0, 2.0);
        let b = F64Complex::new(3.0, 4.0);
        let expected = a.mul(&b);

        let fa = FloatExpComplex::from_f64_pair(1.0, 2.0);
        let fb = FloatExpComplex::from_f64_pair(3.0, 4.0);
        let (re, im) = fa.mul(&fb).to_f64_pair();

        assert!((re - expected.re).abs() < 1e-12);
        assert!((im - expected.im).abs() < 1e-12);
    }

    #[test]
    fn float_exp_complex_survives_deep_zoom_magnitudes() {
        let a = FloatExpComplex::from_f64_pair(1e-300, 1e-300);
        let squared = a.square();
        assert!(!squared.re.is_zero() || squared.re.to_f64() == 0.0);
        // 1e-300 squared underflows f64 (min positive ~1e-308 for subnormals,
        // but re²-im² here is 0); confirm FloatExp tracks a valid exponent.
        assert!(squared.norm_sq() >= 0.0);
    }

    #[test]
    fn high_precision_complex_square_plus_matches_f64_reference() {
        let c = HighPrecisionComplex::new(
            BigFloat::with_precision(-0.75, 128),
            BigFloat::with_precision(0.1, 128),
        );
        let z0 = HighPrecisionComplex::zero(128);
        let z1 = z0.square_plus(&c);
        assert_eq!(z1.to_f64_pair(), (-0.75, 0.1));

        let z2 = z1.square_plus(&c);
        let (re, im) = z2.to_f64_pair();
        // z1² + c = (-0.75+0.1i)² + (-0.75+0.1i) = (0.5525 - 0.15i) + c
        assert!((re - (0.5625 - 0.01 - 0.75)).abs() < 1e-9);
        assert!((im - (-0.15 + 0.1)).abs() < 1e-9);
    }

    #[test]
    fn quaternion_hamilton_product_of_units() {
        let i = Quaternion::new(0.0, 1.0, 0.0, 0.0);
        let j = Quaternion::new(0.0, 0.0, 1.0, 0.0);
        let k = i.mul(&j);
        assert_eq!(k, Quaternion::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn quaternion_norm_of_unit_is_one() {
        let q = Quaternion::new(1.0, 0.0, 0.0, 0.0);
        assert!((q.norm() - 1.0).abs() < 1e-12);
    }
}
