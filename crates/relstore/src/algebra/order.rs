use std::cmp::Ordering;

use relstore_error::{internal, Result};
use tracing::debug;

use crate::index::OrderedIndex;
use crate::relation::Relation;
use crate::row::ScalarRow;
use crate::selection::SelectionVector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

impl Relation {
    /// Sort rows on the given columns.
    ///
    /// The sort is stable. Rows keep their identity: each row carries its key
    /// to its new position and the row index is remapped onto the new order.
    pub fn order_by<S: AsRef<str>>(
        &self,
        columns: &[S],
        direction: SortDirection,
    ) -> Result<Relation> {
        let positions = self.schema.positions(columns)?;

        let sort_keys: Vec<ScalarRow> = self
            .rows_iter()
            .map(|row| row.project(&positions))
            .collect();

        let mut perm: Vec<usize> = (0..self.rows()).collect();
        perm.sort_by(|&a, &b| direction.apply(sort_keys[a].cmp(&sort_keys[b])));

        let selection: SelectionVector = perm.iter().copied().collect();
        let columns = self
            .columns
            .iter()
            .map(|c| c.gather(&selection))
            .collect::<Result<Vec<_>>>()?;

        let ordered = perm
            .iter()
            .map(|&pos| {
                self.index
                    .key_at(pos)
                    .cloned()
                    .ok_or_else(|| internal!("no key indexed for row {pos}"))
            })
            .collect::<Result<OrderedIndex>>()?;

        let mut out = Relation {
            name: format!("order({})", self.name),
            schema: self.schema.clone(),
            columns,
            primary_key: self.primary_key,
            foreign_keys: self.foreign_keys.clone(),
            index: Default::default(),
            ordered,
        };
        out.generate_index(true)?;

        debug!(relation = %self.name, columns = ?positions, ?direction, "order by");

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::index::Key;
    use crate::row;
    use crate::scalar::ScalarValue;
    use crate::testutil::weekday_relation;

    #[test]
    fn ascending_by_time() {
        let rel = weekday_relation();
        let out = rel.order_by(&["time"], SortDirection::Ascending).unwrap();
        let days: Vec<_> = out.column("day").unwrap().iter_scalars().collect();
        assert_eq!(
            vec![
                ScalarValue::from("Mon"),
                ScalarValue::from("Wed"),
                ScalarValue::from("Fri"),
                ScalarValue::from("Tue"),
                ScalarValue::from("Thu"),
            ],
            days
        );
    }

    #[test]
    fn descending_is_stable() {
        let rel = Relation::try_from_columns(
            "r",
            [
                ("g", Column::from(vec![1_i32, 2, 1, 2])),
                ("v", Column::from(vec!["a", "b", "c", "d"])),
            ],
            None,
        )
        .unwrap();
        let out = rel.order_by(&["g"], SortDirection::Descending).unwrap();
        let rows: Vec<_> = out.rows_iter().collect();
        assert_eq!(
            vec![
                row![2_i32, "b"],
                row![2_i32, "d"],
                row![1_i32, "a"],
                row![1_i32, "c"],
            ],
            rows
        );
    }

    #[test]
    fn keys_follow_rows() {
        let rel = Relation::try_from_columns(
            "r",
            [
                ("id", Column::from(vec![10_i64, 20, 30])),
                ("v", Column::from(vec![3_i32, 1, 2])),
            ],
            Some("id"),
        )
        .unwrap();
        let out = rel.order_by(&["v"], SortDirection::Ascending).unwrap();

        let key = Key::Value(ScalarValue::from(20_i64));
        assert_eq!(Some(0), out.row_index().position(&key));
        assert_eq!(Some(&row![20_i64, 1_i32]), out.lookup(&key));
        assert_eq!(&key, &out.ordered_index().keys()[0]);
    }

    #[test]
    fn order_by_missing_column() {
        let rel = weekday_relation();
        assert!(rel.order_by(&["month"], SortDirection::Ascending).is_err());
    }
}
