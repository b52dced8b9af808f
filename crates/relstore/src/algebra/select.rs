use std::fmt;

use relstore_error::Result;
use tracing::debug;

use crate::column::{Column, PhysicalValue};
use crate::relation::Relation;
use crate::selection::SelectionVector;

type FilterFn<'a> = dyn Fn(&Column) -> Result<SelectionVector> + 'a;

/// A typed predicate over a single named column.
///
/// The predicate's value type decides which column kind it can run against.
/// Running it against a column of another kind is an
/// `UnsupportedPredicateType` error.
pub struct Predicate<'a> {
    column: String,
    filter: Box<FilterFn<'a>>,
}

impl<'a> Predicate<'a> {
    pub fn new<T, F>(column: impl Into<String>, predicate: F) -> Self
    where
        T: PhysicalValue,
        F: Fn(&T) -> bool + 'a,
    {
        Predicate {
            column: column.into(),
            filter: Box::new(move |col: &Column| col.filter_positions::<T, _>(&predicate)),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    fn positions(&self, relation: &Relation) -> Result<SelectionVector> {
        let col = relation.column(&self.column)?;
        (self.filter)(col)
    }
}

impl fmt::Debug for Predicate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("column", &self.column)
            .finish_non_exhaustive()
    }
}

impl Relation {
    /// Select rows whose value in `column` satisfies `predicate`.
    ///
    /// Every column is gathered at the matching positions so rows stay
    /// aligned.
    pub fn select<T, F>(&self, column: &str, predicate: F) -> Result<Relation>
    where
        T: PhysicalValue,
        F: Fn(&T) -> bool,
    {
        let selection = self.column(column)?.filter_positions::<T, _>(predicate)?;

        debug!(relation = %self.name, %column, selected = selection.num_rows(), "select");

        self.take(&selection, format!("select({})", self.name))
    }

    /// Select rows satisfying every predicate.
    ///
    /// No predicates selects all rows.
    pub fn select_conjunctive(&self, predicates: &[Predicate<'_>]) -> Result<Relation> {
        let mut selection = SelectionVector::with_range(0..self.rows());
        for predicate in predicates {
            let positions = predicate.positions(self)?;
            selection = selection.intersect(&positions);
        }

        debug!(
            relation = %self.name,
            predicates = predicates.len(),
            selected = selection.num_rows(),
            "select conjunctive"
        );

        self.take(&selection, format!("select({})", self.name))
    }
}

#[cfg(test)]
mod tests {
    use relstore_error::RelError;

    use super::*;
    use crate::row;
    use crate::testutil::weekday_relation;

    #[test]
    fn select_single_row() {
        let rel = weekday_relation();
        let out = rel.select("day", |d: &String| d == "Mon").unwrap();
        assert_eq!(1, out.rows());
        assert_eq!(Some(row!["Mon", 5.0]), out.row(0));
    }

    #[test]
    fn select_keeps_rows_aligned() {
        let rel = weekday_relation();
        let out = rel.select("time", |t: &f64| *t > 7.0).unwrap();
        let rows: Vec<_> = out.rows_iter().collect();
        assert_eq!(
            vec![row!["Tue", 8.15], row!["Thu", 9.45]],
            rows
        );
    }

    #[test]
    fn select_no_matches_is_empty() {
        let rel = weekday_relation();
        let out = rel.select("time", |t: &f64| *t > 100.0).unwrap();
        assert_eq!(0, out.rows());
        assert_eq!(2, out.cols());
    }

    #[test]
    fn select_wrong_predicate_type() {
        let rel = weekday_relation();
        let err = rel.select("day", |_: &i64| true).unwrap_err();
        assert!(matches!(err, RelError::UnsupportedPredicateType(_)));
    }

    #[test]
    fn select_missing_column() {
        let rel = weekday_relation();
        let err = rel.select("month", |_: &String| true).unwrap_err();
        assert!(matches!(err, RelError::MissingColumn(_)));
    }

    #[test]
    fn conjunctive_intersects() {
        let rel = weekday_relation();
        let out = rel
            .select_conjunctive(&[
                Predicate::new("time", |t: &f64| *t > 6.0),
                Predicate::new("day", |d: &String| d.starts_with('T')),
            ])
            .unwrap();
        let rows: Vec<_> = out.rows_iter().collect();
        assert_eq!(vec![row!["Tue", 8.15], row!["Thu", 9.45]], rows);
    }

    #[test]
    fn conjunctive_without_predicates_selects_all() {
        let rel = weekday_relation();
        assert_eq!(5, rel.select_conjunctive(&[]).unwrap().rows());
    }
}
