use relstore_error::Result;
use tracing::debug;

use crate::relation::Relation;

impl Relation {
    /// Keep only the columns at `positions`, in that order.
    ///
    /// The primary key survives if its column is part of the projection.
    pub fn project(&self, positions: &[usize]) -> Result<Relation> {
        let schema = self.schema.project(positions)?;
        let columns = positions.iter().map(|&idx| self.columns[idx].clone()).collect();
        let primary_key = self
            .primary_key
            .and_then(|pk| positions.iter().position(|&idx| idx == pk));

        debug!(relation = %self.name, ?positions, "project");

        Relation::try_new(format!("project({})", self.name), schema, columns, primary_key)
    }

    /// Keep only the named columns, in the given order.
    pub fn project_names<S: AsRef<str>>(&self, names: &[S]) -> Result<Relation> {
        let positions = self.schema.positions(names)?;
        self.project(&positions)
    }
}

#[cfg(test)]
mod tests {
    use relstore_error::RelError;

    use crate::column::Column;
    use crate::relation::Relation;

    fn relation() -> Relation {
        Relation::try_from_columns(
            "r",
            [
                ("id", Column::from(vec![1_i64, 2, 3])),
                ("name", Column::from(vec!["a", "b", "c"])),
                ("score", Column::from(vec![1.5, 2.5, 3.5])),
            ],
            Some("id"),
        )
        .unwrap()
    }

    #[test]
    fn project_reorders_columns() {
        let rel = relation();
        let out = rel.project(&[2, 0]).unwrap();
        assert_eq!(2, out.cols());
        assert_eq!(3, out.rows());
        assert_eq!(vec!["score", "id"], out.col_names());
        assert_eq!(Some(1), out.primary_key());
    }

    #[test]
    fn project_drops_primary_key() {
        let rel = relation();
        let out = rel.project_names(&["name"]).unwrap();
        assert_eq!(None, out.primary_key());
        assert_eq!(3, out.rows());
    }

    #[test]
    fn project_missing_column() {
        let rel = relation();
        let err = rel.project_names(&["nope"]).unwrap_err();
        assert!(matches!(err, RelError::MissingColumn(_)));
        assert!(rel.project(&[7]).is_err());
    }
}
