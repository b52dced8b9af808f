use crate::scalar::ScalarValue;

/// Representation of a single row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ScalarRow {
    pub columns: Vec<ScalarValue>,
}

impl ScalarRow {
    /// Create an empty row.
    pub const fn empty() -> Self {
        ScalarRow {
            columns: Vec::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScalarValue> {
        self.columns.iter()
    }

    pub fn get(&self, idx: usize) -> Option<&ScalarValue> {
        self.columns.get(idx)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Concatenate two rows.
    pub fn concat(&self, other: &ScalarRow) -> ScalarRow {
        self.iter().chain(other.iter()).cloned().collect()
    }

    /// Project a row down to the given column positions.
    pub fn project(&self, positions: &[usize]) -> ScalarRow {
        positions
            .iter()
            .filter_map(|&idx| self.columns.get(idx).cloned())
            .collect()
    }
}

impl FromIterator<ScalarValue> for ScalarRow {
    fn from_iter<T: IntoIterator<Item = ScalarValue>>(iter: T) -> Self {
        ScalarRow {
            columns: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<ScalarValue>> for ScalarRow {
    fn from(columns: Vec<ScalarValue>) -> Self {
        ScalarRow { columns }
    }
}

/// Create a row from values convertible into scalars.
///
/// ```
/// use relstore::row;
/// let r = row!["Mon", 5.0];
/// assert_eq!(2, r.len());
/// ```
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::row::ScalarRow::from(vec![$($crate::scalar::ScalarValue::from($value)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_and_project() {
        let a = row!["a", 1_i64];
        let b = row![2.5];
        let c = a.concat(&b);
        assert_eq!(row!["a", 1_i64, 2.5], c);
        assert_eq!(row![2.5, "a"], c.project(&[2, 0]));
    }
}
