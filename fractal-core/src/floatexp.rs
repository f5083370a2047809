//! Extended-range floating point for perturbation arithmetic.
//!
//! FloatExp = f64 mantissa + i64 exponent, providing unlimited range
//! with 53-bit precision. An order of magnitude faster than BigFloat for
//! per-pixel delta iteration, at deep zooms where delta magnitude exceeds
//! f64's exponent range but full reference-orbit precision is unnecessary.

use crate::BigFloat;
use serde::{Deserialize, Serialize};

/// Extended-range floating point: f64 mantissa + i64 exponent.
/// Value = mantissa × 2^exp (or 0 if mantissa == 0).
/// Mantissa normalized to [0.5, 1.0) for non-zero values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FloatExp {
    mantissa: f64,
    exp: i64,
}

impl FloatExp {
    pub fn zero() -> Self {
        Self {
            mantissa: 0.0,
            exp: 0,
        }
    }

    /// Create from f64 (normalizes automatically).
    pub fn from_f64(val: f64) -> Self {
        if val == 0.0 {
            return Self::zero();
        }
        let (mantissa, exp) = libm::frexp(val);
        Self {
            mantissa,
            exp: exp as i64,
        }
    }

    /// Convert to f64 (may overflow/underflow for extreme exponents).
    pub fn to_f64(&self) -> f64 {
        if self.mantissa == 0.0 {
            return 0.0;
        }
        if self.exp > 1023 {
            return if self.mantissa > 0.0 {
                f64::INFINITY
            } else {
                f64::NEG_INFINITY
            };
        }
        if self.exp < -1074 {
            return 0.0;
        }
        libm::ldexp(self.mantissa, self.exp as i32)
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0.0
    }

    pub fn mantissa(&self) -> f64 {
        self.mantissa
    }

    pub fn exp(&self) -> i64 {
        self.exp
    }

    #[inline]
    pub fn mul(&self, other: &Self) -> Self {
        if self.mantissa == 0.0 || other.mantissa == 0.0 {
            return Self::zero();
        }
        Self {
            mantissa: self.mantissa * other.mantissa,
            exp: self.exp + other.exp,
        }
        .normalize()
    }

    /// Multiply by f64 scalar (for 2·Z·δz where Z is the reference orbit's f64 shadow).
    #[inline]
    pub fn mul_f64(&self, scalar: f64) -> Self {
        if self.mantissa == 0.0 || scalar == 0.0 {
            return Self::zero();
        }
        Self {
            mantissa: self.mantissa * scalar,
            exp: self.exp,
        }
        .normalize()
    }

    #[inline]
    pub fn add(&self, other: &Self) -> Self {
        if self.mantissa == 0.0 {
            return *other;
        }
        if other.mantissa == 0.0 {
            return *self;
        }

        let exp_diff = self.exp - other.exp;

        if exp_diff > 53 {
            return *self;
        }
        if exp_diff < -53 {
            return *other;
        }

        let (mantissa, exp) = if exp_diff >= 0 {
            let scaled_other = libm::ldexp(other.mantissa, -(exp_diff as i32));
            (self.mantissa + scaled_other, self.exp)
        } else {
            let scaled_self = libm::ldexp(self.mantissa, exp_diff as i32);
            (scaled_self + other.mantissa, other.exp)
        };

        Self { mantissa, exp }.normalize()
    }

    #[inline]
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    #[inline]
    pub fn neg(&self) -> Self {
        Self {
            mantissa: -self.mantissa,
            exp: self.exp,
        }
    }

    /// Squared magnitude of complex number (re, im).
    /// Returns f64 since the result is bounded for escape testing (|z|² vs. bailout²).
    #[inline]
    pub fn norm_sq(re: &FloatExp, im: &FloatExp) -> f64 {
        let re_sq = re.mul(re);
        let im_sq = im.mul(im);
        re_sq.add(&im_sq).to_f64()
    }

    /// Convert from BigFloat, extracting mantissa and exponent.
    ///
    /// For values within f64 range, uses direct conversion. For extreme
    /// values (|log2| large enough to under/overflow f64), extracts the
    /// exponent from the approximate log2 magnitude instead.
    pub fn from_bigfloat(bf: &BigFloat) -> Self {
        let f64_val = bf.to_f64();
        if f64_val != 0.0 && f64_val.is_finite() {
            return Self::from_f64(f64_val);
        }

        let log2 = bf.log2_approx();
        if log2 == f64::NEG_INFINITY {
            return Self::zero();
        }

        let exp = log2.round() as i64;
        let mantissa_log2 = log2 - exp as f64;
        let mantissa = libm::exp2(mantissa_log2);

        Self { mantissa, exp }.normalize()
    }

    /// Normalize mantissa to [0.5, 1.0).
    #[inline]
    fn normalize(self) -> Self {
        if self.mantissa == 0.0 {
            return Self::zero();
        }
        let abs_m = self.mantissa.abs();
        if (0.5..1.0).contains(&abs_m) {
            return self;
        }
        let (m, e) = libm::frexp(self.mantissa);
        Self {
            mantissa: m,
            exp: self.exp + e as i64,
        }
    }
}
