use num::complex::Complex64;
use num::rational::Rational64;
use relstore_error::{internal, RelError, Result};

use crate::datatype::DataType;
use crate::scalar::ScalarValue;
use crate::selection::SelectionVector;

/// Values of a single column stored in one concrete representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Rational(Vec<Rational64>),
    Complex(Vec<Complex64>),
    Utf8(Vec<String>),
}

/// Rust types that back a column variant.
///
/// Lets typed predicates and update functions reach column storage without
/// going through `ScalarValue`.
pub trait PhysicalValue: Clone + Send + Sync + 'static {
    const DATATYPE: DataType;

    fn slice(col: &Column) -> Option<&[Self]>;
    fn slice_mut(col: &mut Column) -> Option<&mut [Self]>;
    fn into_column(values: Vec<Self>) -> Column;
}

macro_rules! impl_physical_value {
    ($ty:ty, $variant:ident) => {
        impl PhysicalValue for $ty {
            const DATATYPE: DataType = DataType::$variant;

            fn slice(col: &Column) -> Option<&[Self]> {
                match col {
                    Column::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn slice_mut(col: &mut Column) -> Option<&mut [Self]> {
                match col {
                    Column::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_column(values: Vec<Self>) -> Column {
                Column::$variant(values)
            }
        }

        impl From<Vec<$ty>> for Column {
            fn from(values: Vec<$ty>) -> Self {
                Column::$variant(values)
            }
        }
    };
}

impl_physical_value!(i32, Int32);
impl_physical_value!(i64, Int64);
impl_physical_value!(f64, Float64);
impl_physical_value!(Rational64, Rational);
impl_physical_value!(Complex64, Complex);
impl_physical_value!(String, Utf8);

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Self {
        Column::Utf8(values.into_iter().map(|s| s.to_string()).collect())
    }
}

fn gather_values<T: Clone>(values: &[T], selection: &SelectionVector) -> Result<Vec<T>> {
    selection
        .iter_locations()
        .map(|idx| {
            values
                .get(idx)
                .cloned()
                .ok_or_else(|| {
                    internal!("row {idx} out of bounds for column of length {}", values.len())
                })
        })
        .collect()
}

fn concat_values<T: Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

fn collect_scalars<T>(
    values: impl IntoIterator<Item = ScalarValue>,
    datatype: DataType,
    extract: impl Fn(ScalarValue) -> Option<T>,
) -> Result<Vec<T>> {
    values
        .into_iter()
        .map(|v| {
            let got = v.datatype();
            extract(v).ok_or_else(|| RelError::type_mismatch(datatype, got))
        })
        .collect()
}

impl Column {
    pub fn new_empty(datatype: DataType) -> Self {
        match datatype {
            DataType::Int32 => Column::Int32(Vec::new()),
            DataType::Int64 => Column::Int64(Vec::new()),
            DataType::Float64 => Column::Float64(Vec::new()),
            DataType::Rational => Column::Rational(Vec::new()),
            DataType::Complex => Column::Complex(Vec::new()),
            DataType::Utf8 => Column::Utf8(Vec::new()),
        }
    }

    /// Build a column of `datatype` from scalars, all of which must be of
    /// that type.
    pub fn try_from_scalars(
        datatype: DataType,
        values: impl IntoIterator<Item = ScalarValue>,
    ) -> Result<Self> {
        Ok(match datatype {
            DataType::Int32 => Column::Int32(collect_scalars(values, datatype, |v| match v {
                ScalarValue::Int32(v) => Some(v),
                _ => None,
            })?),
            DataType::Int64 => Column::Int64(collect_scalars(values, datatype, |v| match v {
                ScalarValue::Int64(v) => Some(v),
                _ => None,
            })?),
            DataType::Float64 => Column::Float64(collect_scalars(values, datatype, |v| match v {
                ScalarValue::Float64(v) => Some(v),
                _ => None,
            })?),
            DataType::Rational => Column::Rational(collect_scalars(values, datatype, |v| match v {
                ScalarValue::Rational(v) => Some(v),
                _ => None,
            })?),
            DataType::Complex => Column::Complex(collect_scalars(values, datatype, |v| match v {
                ScalarValue::Complex(v) => Some(v),
                _ => None,
            })?),
            DataType::Utf8 => Column::Utf8(collect_scalars(values, datatype, |v| match v {
                ScalarValue::Utf8(v) => Some(v),
                _ => None,
            })?),
        })
    }

    pub fn datatype(&self) -> DataType {
        match self {
            Column::Int32(_) => DataType::Int32,
            Column::Int64(_) => DataType::Int64,
            Column::Float64(_) => DataType::Float64,
            Column::Rational(_) => DataType::Rational,
            Column::Complex(_) => DataType::Complex,
            Column::Utf8(_) => DataType::Utf8,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int32(v) => v.len(),
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::Rational(v) => v.len(),
            Column::Complex(v) => v.len(),
            Column::Utf8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the value at `idx`, None if out of bounds.
    pub fn value(&self, idx: usize) -> Option<ScalarValue> {
        Some(match self {
            Column::Int32(v) => ScalarValue::Int32(*v.get(idx)?),
            Column::Int64(v) => ScalarValue::Int64(*v.get(idx)?),
            Column::Float64(v) => ScalarValue::Float64(*v.get(idx)?),
            Column::Rational(v) => ScalarValue::Rational(*v.get(idx)?),
            Column::Complex(v) => ScalarValue::Complex(*v.get(idx)?),
            Column::Utf8(v) => ScalarValue::Utf8(v.get(idx)?.clone()),
        })
    }

    pub fn iter_scalars(&self) -> impl Iterator<Item = ScalarValue> + '_ {
        (0..self.len()).filter_map(|idx| self.value(idx))
    }

    /// Check if the value at `idx` equals the value at `other_idx` in
    /// `other`, with the same semantics as `ScalarValue` equality.
    ///
    /// Columns of different kinds never have equal values.
    pub fn values_eq(&self, idx: usize, other: &Column, other_idx: usize) -> bool {
        match (self, other) {
            (Column::Int32(a), Column::Int32(b)) => a.get(idx) == b.get(other_idx),
            (Column::Int64(a), Column::Int64(b)) => a.get(idx) == b.get(other_idx),
            (Column::Rational(a), Column::Rational(b)) => a.get(idx) == b.get(other_idx),
            (Column::Utf8(a), Column::Utf8(b)) => a.get(idx) == b.get(other_idx),
            // Floats go through scalar equality: signed zeros match, NaN matches NaN.
            _ => match (self.value(idx), other.value(other_idx)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Compare the value at `idx` against a scalar.
    pub fn value_eq_scalar(&self, idx: usize, scalar: &ScalarValue) -> bool {
        match (self, scalar) {
            (Column::Int32(a), ScalarValue::Int32(b)) => a.get(idx) == Some(b),
            (Column::Int64(a), ScalarValue::Int64(b)) => a.get(idx) == Some(b),
            (Column::Rational(a), ScalarValue::Rational(b)) => a.get(idx) == Some(b),
            (Column::Utf8(a), ScalarValue::Utf8(b)) => a.get(idx) == Some(b),
            _ => self.value(idx).as_ref() == Some(scalar),
        }
    }

    /// Positions of all values satisfying `predicate`, ascending.
    pub fn filter_positions<T, F>(&self, predicate: F) -> Result<SelectionVector>
    where
        T: PhysicalValue,
        F: Fn(&T) -> bool,
    {
        let values = T::slice(self).ok_or_else(|| {
            RelError::UnsupportedPredicateType(format!(
                "predicate over {} applied to column of {}",
                T::DATATYPE,
                self.datatype()
            ))
        })?;

        Ok(values
            .iter()
            .enumerate()
            .filter_map(|(idx, v)| if predicate(v) { Some(idx) } else { None })
            .collect())
    }

    /// Create a new column holding the values at the selected positions, in
    /// selection order.
    pub fn gather(&self, selection: &SelectionVector) -> Result<Column> {
        Ok(match self {
            Column::Int32(v) => Column::Int32(gather_values(v, selection)?),
            Column::Int64(v) => Column::Int64(gather_values(v, selection)?),
            Column::Float64(v) => Column::Float64(gather_values(v, selection)?),
            Column::Rational(v) => Column::Rational(gather_values(v, selection)?),
            Column::Complex(v) => Column::Complex(gather_values(v, selection)?),
            Column::Utf8(v) => Column::Utf8(gather_values(v, selection)?),
        })
    }

    /// Concat `other` onto the end of this column.
    pub fn concat(&self, other: &Column) -> Result<Column> {
        Ok(match (self, other) {
            (Column::Int32(a), Column::Int32(b)) => Column::Int32(concat_values(a, b)),
            (Column::Int64(a), Column::Int64(b)) => Column::Int64(concat_values(a, b)),
            (Column::Float64(a), Column::Float64(b)) => Column::Float64(concat_values(a, b)),
            (Column::Rational(a), Column::Rational(b)) => Column::Rational(concat_values(a, b)),
            (Column::Complex(a), Column::Complex(b)) => Column::Complex(concat_values(a, b)),
            (Column::Utf8(a), Column::Utf8(b)) => Column::Utf8(concat_values(a, b)),
            (a, b) => return Err(RelError::type_mismatch(a.datatype(), b.datatype())),
        })
    }
}

/// Growable, untyped buffer for a column that's still being built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagedColumn {
    values: Vec<ScalarValue>,
}

impl StagedColumn {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value.
    ///
    /// If `expected` is provided, the value's kind must match it.
    pub fn append(&mut self, value: ScalarValue, expected: Option<DataType>) -> Result<()> {
        if let Some(expected) = expected {
            if value.datatype() != expected {
                return Err(RelError::type_mismatch(expected, value.datatype()));
            }
        }
        self.values.push(value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Infer the column kind: the declared type if there is one, else the
    /// kind of the first staged value.
    pub fn infer_datatype(&self, declared: Option<DataType>) -> Option<DataType> {
        declared.or_else(|| self.values.first().map(|v| v.datatype()))
    }

    /// Move the staged values into a typed column, leaving this buffer
    /// empty.
    pub fn finish(&mut self, datatype: DataType) -> Result<Column> {
        Column::try_from_scalars(datatype, std::mem::take(&mut self.values))
    }
}
