use std::cmp::Ordering;
use std::fmt;

use hashbrown::HashSet;
use relstore_error::{construction, RelError, Result};
use tracing::debug;

use super::{emit_pairs, JoinPairs};
use crate::column::{Column, PhysicalValue};
use crate::relation::Relation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl ComparisonOperator {
    pub fn matches(self, ord: Ordering) -> bool {
        match self {
            ComparisonOperator::Eq => ord == Ordering::Equal,
            ComparisonOperator::NotEq => ord != Ordering::Equal,
            ComparisonOperator::Lt => ord == Ordering::Less,
            ComparisonOperator::LtEq => ord != Ordering::Greater,
            ComparisonOperator::Gt => ord == Ordering::Greater,
            ComparisonOperator::GtEq => ord != Ordering::Less,
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::NotEq => write!(f, "!="),
            Self::Lt => write!(f, "<"),
            Self::LtEq => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::GtEq => write!(f, ">="),
        }
    }
}

type PairsFn<'a> = dyn Fn(&Column, &Column) -> Result<JoinPairs> + 'a;

/// A binary comparison between one left column and one right column.
pub struct ThetaCondition<'a> {
    left: String,
    right: String,
    pairs: Box<PairsFn<'a>>,
}

impl<'a> ThetaCondition<'a> {
    /// Condition from a typed comparator. Both columns must hold `T`.
    pub fn new<T, F>(left: impl Into<String>, right: impl Into<String>, comparator: F) -> Self
    where
        T: PhysicalValue,
        F: Fn(&T, &T) -> bool + 'a,
    {
        ThetaCondition {
            left: left.into(),
            right: right.into(),
            pairs: Box::new(move |l: &Column, r: &Column| -> Result<JoinPairs> {
                let (a, b) = (typed_slice::<T>(l)?, typed_slice::<T>(r)?);
                let mut pairs = Vec::new();
                for (i, x) in a.iter().enumerate() {
                    for (j, y) in b.iter().enumerate() {
                        if comparator(x, y) {
                            pairs.push((i, j));
                        }
                    }
                }
                Ok(pairs)
            }),
        }
    }

    /// Condition comparing values with their natural ordering.
    pub fn compare(
        left: impl Into<String>,
        right: impl Into<String>,
        op: ComparisonOperator,
    ) -> Self {
        ThetaCondition {
            left: left.into(),
            right: right.into(),
            pairs: Box::new(move |l: &Column, r: &Column| -> Result<JoinPairs> {
                if l.datatype() != r.datatype() {
                    return Err(RelError::type_mismatch(l.datatype(), r.datatype()));
                }
                let rhs: Vec<_> = r.iter_scalars().collect();
                let mut pairs = Vec::new();
                for (i, x) in l.iter_scalars().enumerate() {
                    for (j, y) in rhs.iter().enumerate() {
                        if op.matches(x.cmp(y)) {
                            pairs.push((i, j));
                        }
                    }
                }
                Ok(pairs)
            }),
        }
    }

    pub fn left(&self) -> &str {
        &self.left
    }

    pub fn right(&self) -> &str {
        &self.right
    }

    fn pairs(&self, left: &Relation, right: &Relation) -> Result<JoinPairs> {
        (self.pairs)(left.column(&self.left)?, right.column(&self.right)?)
    }
}

impl fmt::Debug for ThetaCondition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThetaCondition")
            .field("left", &self.left)
            .field("right", &self.right)
            .finish_non_exhaustive()
    }
}

fn typed_slice<T: PhysicalValue>(col: &Column) -> Result<&[T]> {
    T::slice(col).ok_or_else(|| {
        RelError::UnsupportedPredicateType(format!(
            "comparator over {} applied to column of {}",
            T::DATATYPE,
            col.datatype()
        ))
    })
}

impl Relation {
    /// Join on arbitrary comparisons between left and right columns.
    ///
    /// A pair of rows is emitted only if it satisfies every condition. Output
    /// is ordered by left position, then right position.
    pub fn theta_join(
        &self,
        other: &Relation,
        conditions: &[ThetaCondition<'_>],
    ) -> Result<Relation> {
        let (first, rest) = conditions
            .split_first()
            .ok_or_else(|| construction!("theta join requires at least one condition"))?;

        let mut pairs = first.pairs(self, other)?;
        for condition in rest {
            let matched: HashSet<(usize, usize)> =
                condition.pairs(self, other)?.into_iter().collect();
            pairs.retain(|pair| matched.contains(pair));
        }
        pairs.sort_unstable();

        debug!(
            left = %self.name,
            right = %other.name,
            conditions = conditions.len(),
            rows = pairs.len(),
            "theta join"
        );

        emit_pairs(
            self,
            other,
            &pairs,
            &[],
            format!("theta_join({},{})", self.name, other.name),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::testutil::{weekday_relation, weekend_relation};

    #[test]
    fn single_typed_condition() {
        let week = weekday_relation();
        let weekend = weekend_relation();
        let out = week
            .theta_join(
                &weekend,
                &[ThetaCondition::new("time", "time", |a: &f64, b: &f64| a - b > 5.0)],
            )
            .unwrap();

        let rows: Vec<_> = out.rows_iter().collect();
        assert_eq!(
            vec![
                row!["Tue", 8.15, "Sat", 3.0],
                row!["Thu", 9.45, "Sat", 3.0],
                row!["Thu", 9.45, "Sun", 4.30],
            ],
            rows
        );
        assert_eq!(vec!["day", "time", "day2", "time2"], out.col_names());
    }

    #[test]
    fn conditions_are_conjunctive() {
        let week = weekday_relation();
        let weekend = weekend_relation();

        let out = week
            .theta_join(
                &weekend,
                &[
                    ThetaCondition::compare("time", "time", ComparisonOperator::Gt),
                    ThetaCondition::new("day", "day", |a: &String, b: &String| {
                        a.starts_with('T') && b == "Sun"
                    }),
                ],
            )
            .unwrap();

        let rows: Vec<_> = out.rows_iter().collect();
        assert_eq!(
            vec![
                row!["Tue", 8.15, "Sun", 4.30],
                row!["Thu", 9.45, "Sun", 4.30],
            ],
            rows
        );
    }

    #[test]
    fn compare_lt_eq() {
        let a = Relation::try_from_columns("a", [("v", Column::from(vec![1_i32, 2, 3]))], None)
            .unwrap();
        let out = a
            .theta_join(&a, &[ThetaCondition::compare("v", "v", ComparisonOperator::LtEq)])
            .unwrap();
        assert_eq!(6, out.rows());
        assert_eq!(Some(row![1_i32, 1_i32]), out.row(0));
    }

    #[test]
    fn errors() {
        let week = weekday_relation();
        let err = week.theta_join(&week, &[]).unwrap_err();
        assert!(matches!(err, RelError::Construction(_)));

        let err = week
            .theta_join(&week, &[ThetaCondition::new("day", "day", |a: &i64, b: &i64| a < b)])
            .unwrap_err();
        assert!(matches!(err, RelError::UnsupportedPredicateType(_)));

        let err = week
            .theta_join(&week, &[ThetaCondition::compare("day", "time", ComparisonOperator::Eq)])
            .unwrap_err();
        assert!(matches!(err, RelError::TypeMismatch { .. }));
    }
}
