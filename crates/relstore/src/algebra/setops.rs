use relstore_error::{schema_mismatch, Result};
use tracing::debug;

use crate::relation::Relation;
use crate::selection::SelectionVector;

impl Relation {
    /// Check that `other` has the same number of columns and the same domain.
    pub fn check_compatible(&self, other: &Relation) -> Result<()> {
        if self.cols() != other.cols() {
            return Err(schema_mismatch!(
                "'{}' has {} columns, '{}' has {}",
                self.name,
                self.cols(),
                other.name,
                other.cols()
            ));
        }
        let (ours, theirs) = (self.domain(), other.domain());
        if ours != theirs {
            return Err(schema_mismatch!(
                "'{}' has domain {ours}, '{}' has domain {theirs}",
                self.name,
                other.name
            ));
        }
        Ok(())
    }

    /// All rows of this relation followed by all rows of `other`.
    ///
    /// Row identity isn't preserved, the result has no primary key.
    pub fn union(&self, other: &Relation) -> Result<Relation> {
        self.check_compatible(other)?;

        let columns = self
            .columns
            .iter()
            .zip(&other.columns)
            .map(|(a, b)| a.concat(b))
            .collect::<Result<Vec<_>>>()?;

        debug!(left = %self.name, right = %other.name, rows = self.rows() + other.rows(), "union");

        Relation::try_new(
            format!("union({},{})", self.name, other.name),
            self.schema.clone(),
            columns,
            None,
        )
    }

    /// Rows of this relation with no identical row in `other`.
    ///
    /// Membership is checked with a linear scan over `other`.
    pub fn difference(&self, other: &Relation) -> Result<Relation> {
        self.check_compatible(other)?;

        let selection: SelectionVector = self
            .rows_iter()
            .enumerate()
            .filter_map(|(pos, row)| (!other.scan_contains(&row)).then_some(pos))
            .collect();

        debug!(left = %self.name, right = %other.name, rows = selection.num_rows(), "difference");

        self.take(&selection, format!("difference({},{})", self.name, other.name))
    }

    /// Rows of this relation that also appear in `other`.
    ///
    /// Computed as `self - (self - other)`, every membership test is a scan.
    pub fn intersect(&self, other: &Relation) -> Result<Relation> {
        let missing = self.difference(other)?;
        let out = self.difference(&missing)?;
        Ok(out.with_name(format!("intersect({},{})", self.name, other.name)))
    }

    /// Rows of this relation that also appear in `other`, probing `other`'s
    /// row index.
    ///
    /// When `other` has a primary key each membership test is a key lookup
    /// followed by a tuple comparison. Without one this degrades to a scan.
    pub fn intersect_indexed(&self, other: &Relation) -> Result<Relation> {
        self.check_compatible(other)?;

        let selection: SelectionVector = self
            .rows_iter()
            .enumerate()
            .filter_map(|(pos, row)| other.contains(&row).then_some(pos))
            .collect();

        debug!(
            left = %self.name,
            right = %other.name,
            indexed = other.primary_key.is_some(),
            rows = selection.num_rows(),
            "intersect"
        );

        self.take(&selection, format!("intersect({},{})", self.name, other.name))
    }
}
