//! Arbitrary-precision scalar for the reference-orbit hot path (C2).
//!
//! Uses f64 internally when `precision_bits <= 64`, falling back to
//! `dashu_float::FBig` otherwise. The switch is transparent to callers: every
//! operation is expressed in terms of `BigFloat`, never the underlying repr.
//! Per-pixel kernels never touch this type directly — only reference orbit
//! and viewport/precision bookkeeping do.

use dashu_base::{Abs, Approximation, BitTest, Sign};
use dashu_float::ops::SquareRoot;
use dashu_float::{DBig, FBig};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub struct BigFloat {
    value: BigFloatValue,
    precision_bits: usize,
}

#[derive(Clone, Debug)]
enum BigFloatValue {
    F64(f64),
    Arbitrary(FBig),
}

impl BigFloat {
    /// No default precision — every constructor site states its requirement.
    pub fn with_precision(val: f64, precision_bits: usize) -> Self {
        let value = if precision_bits <= 64 {
            BigFloatValue::F64(val)
        } else {
            let fbig = if val == 0.0 {
                FBig::ZERO.with_precision(precision_bits).unwrap()
            } else {
                FBig::try_from(val)
                    .unwrap()
                    .with_precision(precision_bits)
                    .unwrap()
            };
            BigFloatValue::Arbitrary(fbig)
        };
        Self {
            value,
            precision_bits,
        }
    }

    pub fn zero(precision_bits: usize) -> Self {
        Self::with_precision(0.0, precision_bits)
    }

    pub fn one(precision_bits: usize) -> Self {
        Self::with_precision(1.0, precision_bits)
    }

    pub fn precision_bits(&self) -> usize {
        self.precision_bits
    }

    /// Lossy for values that need more than 53 bits of mantissa.
    pub fn to_f64(&self) -> f64 {
        match &self.value {
            BigFloatValue::F64(v) => *v,
            BigFloatValue::Arbitrary(v) => v.to_f64().value(),
        }
    }

    /// Parses decimal strings beyond f64 range (e.g. `"1e-2000"`).
    pub fn from_string(val: &str, precision_bits: usize) -> Result<Self, String> {
        if precision_bits <= 64 {
            val.parse::<f64>()
                .map(|f| Self::with_precision(f, precision_bits))
                .map_err(|e| format!("failed to parse f64: {e}"))
        } else {
            val.parse::<DBig>()
                .map_err(|e| format!("failed to parse decimal: {e}"))
                .map(|dbig| {
                    let fbig_halfaway = match dbig.with_base_and_precision::<2>(precision_bits) {
                        Approximation::Exact(v) => v,
                        Approximation::Inexact(v, _) => v,
                    };
                    let fbig = fbig_halfaway.with_rounding::<dashu_float::round::mode::Zero>();
                    Self {
                        value: BigFloatValue::Arbitrary(fbig),
                        precision_bits,
                    }
                })
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        self.binop(other, |a, b| a + b, |a, b| a + b)
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.binop(other, |a, b| a - b, |a, b| a - b)
    }

    pub fn mul(&self, other: &Self) -> Self {
        self.binop(other, |a, b| a * b, |a, b| a * b)
    }

    pub fn div(&self, other: &Self) -> Self {
        self.binop(other, |a, b| a / b, |a, b| a / b)
    }

    fn binop(
        &self,
        other: &Self,
        f64_op: impl Fn(f64, f64) -> f64,
        big_op: impl Fn(&FBig, &FBig) -> FBig,
    ) -> Self {
        let result_precision = self.precision_bits.max(other.precision_bits);
        let value = match (&self.value, &other.value) {
            (BigFloatValue::F64(a), BigFloatValue::F64(b)) if result_precision <= 64 => {
                BigFloatValue::F64(f64_op(*a, *b))
            }
            _ => BigFloatValue::Arbitrary(big_op(&self.to_fbig(), &other.to_fbig())),
        };
        Self {
            value,
            precision_bits: result_precision,
        }
    }

    pub fn sqrt(&self) -> Self {
        let value = match &self.value {
            BigFloatValue::F64(v) if self.precision_bits <= 64 => BigFloatValue::F64(v.sqrt()),
            _ => BigFloatValue::Arbitrary(self.to_fbig().sqrt()),
        };
        Self {
            value,
            precision_bits: self.precision_bits,
        }
    }

    pub fn abs(&self) -> Self {
        match &self.value {
            BigFloatValue::F64(v) => Self {
                value: BigFloatValue::F64(v.abs()),
                precision_bits: self.precision_bits,
            },
            BigFloatValue::Arbitrary(v) => Self {
                value: BigFloatValue::Arbitrary(v.clone().abs()),
                precision_bits: self.precision_bits,
            },
        }
    }

    /// Base-2 logarithm of the magnitude, approximated from the exponent for
    /// values whose magnitude has under/overflowed the f64 range.
    pub fn log2_approx(&self) -> f64 {
        match &self.value {
            BigFloatValue::F64(v) => {
                if *v == 0.0 {
                    f64::NEG_INFINITY
                } else {
                    v.abs().log2()
                }
            }
            BigFloatValue::Arbitrary(v) => {
                let f = v.to_f64().value();
                if f != 0.0 && f.is_finite() {
                    return f.abs().log2();
                }
                let repr = v.repr();
                let significand = repr.significand();
                if significand.sign() == Sign::Positive && significand.is_zero() {
                    return f64::NEG_INFINITY;
                }
                let bits = significand.clone().unsigned_abs().bit_len() as f64;
                bits + repr.exponent() as f64
            }
        }
    }

    fn to_fbig(&self) -> FBig {
        match &self.value {
            BigFloatValue::F64(v) => {
                if *v == 0.0 {
                    FBig::ZERO.with_precision(self.precision_bits).unwrap()
                } else {
                    FBig::try_from(*v)
                        .unwrap()
                        .with_precision(self.precision_bits)
                        .unwrap()
                }
            }
            BigFloatValue::Arbitrary(v) => v.clone(),
        }
    }
}

impl PartialEq for BigFloat {
    fn eq(&self, other: &Self) -> bool {
        match (&self.value, &other.value) {
            (BigFloatValue::F64(a), BigFloatValue::F64(b)) => a == b,
            _ => self.to_fbig() == other.to_fbig(),
        }
    }
}

impl PartialOrd for BigFloat {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (&self.value, &other.value) {
            (BigFloatValue::F64(a), BigFloatValue::F64(b)) => a.partial_cmp(b),
            _ => self.to_fbig().partial_cmp(&other.to_fbig()),
        }
    }
}

impl std::fmt::Display for BigFloat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            BigFloatValue::F64(v) => write!(f, "{v}"),
            BigFloatValue::Arbitrary(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct BigFloatSerde {
    value: String,
    precision_bits: usize,
}

impl Serialize for BigFloat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let value = match &self.value {
            BigFloatValue::F64(v) => v.to_string(),
            BigFloatValue::Arbitrary(v) => v.to_string(),
        };
        BigFloatSerde {
            value,
            precision_bits: self.precision_bits,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BigFloat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let serde = BigFloatSerde::deserialize(deserializer)?;
        Self::from_string(&serde.value, serde.precision_bits)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_returns_positive_for_negative_value() {
        let neg = BigFloat::with_precision(-5.0, 64);
        assert_eq!(neg.abs().to_f64(), 5.0);
    }

    #[test]
    fn abs_preserves_precision() {
        let neg = BigFloat::with_precision(-5.0, 256);
        assert_eq!(neg.abs().precision_bits(), 256);
    }

    #[test]
    fn add_sub_mul_div_roundtrip_f64() {
        let a = BigFloat::with_precision(3.0, 64);
        let b = BigFloat::with_precision(2.0, 64);
        assert_eq!(a.add(&b).to_f64(), 5.0);
        assert_eq!(a.sub(&b).to_f64(), 1.0);
        assert_eq!(a.mul(&b).to_f64(), 6.0);
        assert_eq!(a.div(&b).to_f64(), 1.5);
    }

    #[test]
    fn arbitrary_precision_arithmetic_beyond_f64() {
        let a = BigFloat::from_string("1e-500", 4096).unwrap();
        let b = BigFloat::from_string("1e-500", 4096).unwrap();
        let sum = a.add(&b);
        assert!(sum.log2_approx() < -1600.0);
    }

    #[test]
    fn comparison_orders_arbitrary_precision_values() {
        let small = BigFloat::from_string("1e-500", 2048).unwrap();
        let big = BigFloat::from_string("1e-100", 2048).unwrap();
        assert!(small < big);
        assert!(big > small);
    }

    #[test]
    fn serialization_roundtrip_preserves_extreme_values() {
        let original = BigFloat::from_string("1e-2000", 7000).unwrap();
        let json = serde_json::to_string(&original).unwrap();
        let restored: BigFloat = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, original);
        assert_eq!(restored.precision_bits(), 7000);
    }

    #[test]
    fn log2_approx_matches_f64_in_normal_range() {
        let v = BigFloat::with_precision(8.0, 64);
        assert!((v.log2_approx() - 3.0).abs() < 1e-9);
    }
}
