use std::fmt;
use std::sync::Arc;

use relstore_error::{construction, internal, RelError, Result};

use crate::column::Column;
use crate::datatype::DataType;
use crate::scalar::ScalarValue;

pub type CustomAggregateFn = Arc<dyn Fn(&Column) -> Result<ScalarValue> + Send + Sync>;

/// Function reducing one group's slice of a column to a single value.
#[derive(Clone)]
pub enum AggregateFunction {
    Sum,
    Min,
    Max,
    Mean,
    /// Number of rows in the group. Ignores column values.
    Count,
    Custom {
        name: String,
        return_type: DataType,
        func: CustomAggregateFn,
    },
}

impl AggregateFunction {
    pub fn custom<F>(name: impl Into<String>, return_type: DataType, func: F) -> Self
    where
        F: Fn(&Column) -> Result<ScalarValue> + Send + Sync + 'static,
    {
        AggregateFunction::Custom {
            name: name.into(),
            return_type,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Mean => "mean",
            Self::Count => "count",
            Self::Custom { name, .. } => name,
        }
    }

    /// Whether this function needs an input column.
    pub const fn requires_input(&self) -> bool {
        !matches!(self, Self::Count)
    }

    /// Output type given the input column's type.
    pub fn output_type(&self, input: Option<DataType>) -> Result<DataType> {
        let input = match (self, input) {
            (Self::Count, _) => return Ok(DataType::Int64),
            (Self::Custom { return_type, .. }, _) => return Ok(*return_type),
            (_, Some(input)) => input,
            (_, None) => return Err(construction!("aggregate '{}' requires a column", self.name())),
        };

        match self {
            Self::Min | Self::Max => Ok(input),
            Self::Sum if input.is_numeric() => Ok(input),
            Self::Mean => match input {
                DataType::Int32 | DataType::Int64 | DataType::Float64 => Ok(DataType::Float64),
                DataType::Rational | DataType::Complex => Ok(input),
                DataType::Utf8 => Err(RelError::type_mismatch("numeric", input)),
            },
            _ => Err(RelError::type_mismatch("numeric", input)),
        }
    }

    /// Apply to the values of a single group.
    ///
    /// `group_size` is the number of rows in the group, `values` (when
    /// present) holds that group's values of the input column.
    pub fn apply(&self, values: Option<&Column>, group_size: usize) -> Result<ScalarValue> {
        if let Self::Count = self {
            let count = i64::try_from(group_size).map_err(|_| internal!("group too large"))?;
            return Ok(ScalarValue::Int64(count));
        }

        let values =
            values.ok_or_else(|| construction!("aggregate '{}' requires a column", self.name()))?;

        match self {
            Self::Sum => sum(values),
            Self::Mean => sum(values)?.try_div_count(values.len()),
            Self::Min => values
                .iter_scalars()
                .min()
                .ok_or_else(|| internal!("min over empty group")),
            Self::Max => values
                .iter_scalars()
                .max()
                .ok_or_else(|| internal!("max over empty group")),
            Self::Custom { func, .. } => func(values),
            Self::Count => Err(internal!("count handled above")),
        }
    }
}

fn sum(values: &Column) -> Result<ScalarValue> {
    let mut iter = values.iter_scalars();
    let first = iter.next().ok_or_else(|| internal!("sum over empty group"))?;
    iter.try_fold(first, |acc, v| acc.try_add(&v))
}

impl fmt::Debug for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom {
                name, return_type, ..
            } => f
                .debug_struct("Custom")
                .field("name", name)
                .field("return_type", return_type)
                .finish_non_exhaustive(),
            other => write!(f, "{}", other.name()),
        }
    }
}
