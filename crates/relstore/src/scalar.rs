use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use num::complex::Complex64;
use num::rational::Rational64;
use num::{CheckedAdd, ToPrimitive};
use relstore_error::{internal, RelError, Result};

use crate::datatype::DataType;

/// A single dynamically typed value.
///
/// Equality, hashing and ordering are total so that values can be used as
/// index keys and grouping values. Floats compare by `total_cmp` after
/// folding `-0.0` into `0.0`, so the two zeros are equal and `NaN` equals
/// itself. Complex values compare lexicographically on their real then
/// imaginary parts. Values of different kinds never compare equal and are
/// ordered by kind.
#[derive(Debug, Clone)]
pub enum ScalarValue {
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Rational(Rational64),
    Complex(Complex64),
    Utf8(String),
}

impl ScalarValue {
    pub fn datatype(&self) -> DataType {
        match self {
            ScalarValue::Int32(_) => DataType::Int32,
            ScalarValue::Int64(_) => DataType::Int64,
            ScalarValue::Float64(_) => DataType::Float64,
            ScalarValue::Rational(_) => DataType::Rational,
            ScalarValue::Complex(_) => DataType::Complex,
            ScalarValue::Utf8(_) => DataType::Utf8,
        }
    }

    /// Add two values of the same kind.
    ///
    /// Integer and rational addition is checked, overflow is an error.
    pub fn try_add(&self, other: &ScalarValue) -> Result<ScalarValue> {
        let overflow = || internal!("overflow adding {self} and {other}");
        Ok(match (self, other) {
            (Self::Int32(a), Self::Int32(b)) => {
                Self::Int32(i32::checked_add(*a, *b).ok_or_else(overflow)?)
            }
            (Self::Int64(a), Self::Int64(b)) => {
                Self::Int64(i64::checked_add(*a, *b).ok_or_else(overflow)?)
            }
            (Self::Float64(a), Self::Float64(b)) => Self::Float64(a + b),
            (Self::Rational(a), Self::Rational(b)) => {
                Self::Rational(a.checked_add(b).ok_or_else(overflow)?)
            }
            (Self::Complex(a), Self::Complex(b)) => Self::Complex(a + b),
            (a, b) => {
                return Err(RelError::type_mismatch(
                    format!("numeric {}", a.datatype()),
                    b.datatype(),
                ))
            }
        })
    }

    /// Divide a value by a row count.
    ///
    /// Integers and floats produce a Float64, rationals and complex values
    /// stay in their own kind.
    pub fn try_div_count(&self, count: usize) -> Result<ScalarValue> {
        if count == 0 {
            return Err(internal!("division by zero count"));
        }
        Ok(match self {
            Self::Int32(v) => Self::Float64(*v as f64 / count as f64),
            Self::Int64(v) => Self::Float64(*v as f64 / count as f64),
            Self::Float64(v) => Self::Float64(*v / count as f64),
            Self::Rational(v) => {
                let count = i64::try_from(count).map_err(|_| internal!("count too large"))?;
                Self::Rational(*v / Rational64::from_integer(count))
            }
            Self::Complex(v) => Self::Complex(*v / count as f64),
            Self::Utf8(_) => return Err(RelError::type_mismatch("numeric", DataType::Utf8)),
        })
    }

    /// Numeric view of the value, if it has one.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Int32(v) => Some(*v as f64),
            Self::Int64(v) => Some(*v as f64),
            Self::Float64(v) => Some(*v),
            Self::Rational(v) => v.to_f64(),
            Self::Complex(v) => Some(v.re),
            Self::Utf8(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// Rank of the value's kind, orders values of different kinds.
    const fn kind_rank(&self) -> u8 {
        match self {
            Self::Int32(_) => 0,
            Self::Int64(_) => 1,
            Self::Float64(_) => 2,
            Self::Rational(_) => 3,
            Self::Complex(_) => 4,
            Self::Utf8(_) => 5,
        }
    }
}

impl Ord for ScalarValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int32(a), Self::Int32(b)) => a.cmp(b),
            (Self::Int64(a), Self::Int64(b)) => a.cmp(b),
            (Self::Float64(a), Self::Float64(b)) => cmp_f64(*a, *b),
            (Self::Rational(a), Self::Rational(b)) => a.cmp(b),
            (Self::Complex(a), Self::Complex(b)) => {
                cmp_f64(a.re, b.re).then_with(|| cmp_f64(a.im, b.im))
            }
            (Self::Utf8(a), Self::Utf8(b)) => a.cmp(b),
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }
}

/// Map `-0.0` to `0.0`, leaving every other value alone.
fn fold_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    fold_zero(a).total_cmp(&fold_zero(b))
}

impl PartialOrd for ScalarValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScalarValue {}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind_rank().hash(state);
        match self {
            Self::Int32(v) => v.hash(state),
            Self::Int64(v) => v.hash(state),
            Self::Float64(v) => fold_zero(*v).to_bits().hash(state),
            Self::Rational(v) => v.hash(state),
            Self::Complex(v) => {
                fold_zero(v.re).to_bits().hash(state);
                fold_zero(v.im).to_bits().hash(state);
            }
            Self::Utf8(v) => v.hash(state),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Rational(v) => write!(f, "{v}"),
            Self::Complex(v) => write!(f, "{v}"),
            Self::Utf8(v) => write!(f, "{v}"),
        }
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Int32(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int64(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float64(value)
    }
}

impl From<Rational64> for ScalarValue {
    fn from(value: Rational64) -> Self {
        ScalarValue::Rational(value)
    }
}

impl From<Complex64> for ScalarValue {
    fn from(value: Complex64) -> Self {
        ScalarValue::Complex(value)
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Utf8(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Utf8(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn float_total_order() {
        let nan = ScalarValue::Float64(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert!(ScalarValue::Float64(1.5) < ScalarValue::Float64(2.0));
        assert!(ScalarValue::Float64(-1.0) < ScalarValue::Float64(-0.0));
    }

    #[test]
    fn signed_zeros_equal_and_hash_alike() {
        let (neg, pos) = (ScalarValue::Float64(-0.0), ScalarValue::Float64(0.0));
        assert_eq!(neg, pos);
        assert_eq!(Ordering::Equal, neg.cmp(&pos));

        let set: hashbrown::HashSet<_> = [neg, pos].into_iter().collect();
        assert_eq!(1, set.len());

        let neg = ScalarValue::Complex(Complex64::new(-0.0, 1.0));
        let pos = ScalarValue::Complex(Complex64::new(0.0, 1.0));
        assert_eq!(neg, pos);
        let set: hashbrown::HashSet<_> = [neg, pos].into_iter().collect();
        assert_eq!(1, set.len());
    }

    #[test]
    fn different_kinds_not_equal() {
        assert_ne!(ScalarValue::Int32(1), ScalarValue::Int64(1));
        assert!(ScalarValue::Int64(100) < ScalarValue::Utf8("a".to_string()));
    }

    #[test]
    fn complex_ordering_is_lexicographic() {
        let set: BTreeSet<ScalarValue> = [
            Complex64::new(1.0, 2.0),
            Complex64::new(0.0, 5.0),
            Complex64::new(1.0, -1.0),
        ]
        .into_iter()
        .map(ScalarValue::from)
        .collect();

        let got: Vec<_> = set.into_iter().collect();
        let expected: Vec<ScalarValue> = [
            Complex64::new(0.0, 5.0),
            Complex64::new(1.0, -1.0),
            Complex64::new(1.0, 2.0),
        ]
        .into_iter()
        .map(ScalarValue::from)
        .collect();
        assert_eq!(expected, got);
    }

    #[test]
    fn add_and_divide() {
        let sum = ScalarValue::Int64(3).try_add(&ScalarValue::Int64(4)).unwrap();
        assert_eq!(ScalarValue::Int64(7), sum);
        assert_eq!(ScalarValue::Float64(3.5), sum.try_div_count(2).unwrap());

        let r = ScalarValue::Rational(Rational64::new(1, 2))
            .try_add(&ScalarValue::Rational(Rational64::new(1, 3)))
            .unwrap();
        assert_eq!(ScalarValue::Rational(Rational64::new(5, 6)), r);
        assert_eq!(
            ScalarValue::Rational(Rational64::new(5, 12)),
            r.try_div_count(2).unwrap()
        );
    }

    #[test]
    fn add_overflow_and_mismatch() {
        assert!(ScalarValue::Int32(i32::MAX)
            .try_add(&ScalarValue::Int32(1))
            .is_err());
        assert_eq!(
            ScalarValue::Int32(3),
            ScalarValue::Int32(1).try_add(&ScalarValue::Int32(2)).unwrap()
        );
        let err = ScalarValue::Utf8("a".to_string())
            .try_add(&ScalarValue::Int32(1))
            .unwrap_err();
        assert!(matches!(err, RelError::TypeMismatch { .. }));
    }
}
