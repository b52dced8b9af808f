use relstore_error::Result;
use tracing::debug;

use super::{emit_pairs, resolve_join_columns, JoinPairs};
use crate::relation::Relation;

/// Compare every left row against every right row on the given columns.
///
/// Pairs come out ordered by left position, then right position. No join
/// columns at all produces the cross product.
pub(crate) fn nested_loop_pairs(
    left: &Relation,
    right: &Relation,
    left_pos: &[usize],
    right_pos: &[usize],
) -> JoinPairs {
    let mut pairs = Vec::new();
    for l in 0..left.rows() {
        for r in 0..right.rows() {
            let matched = left_pos.iter().zip(right_pos).all(|(&lc, &rc)| {
                left.columns[lc].values_eq(l, &right.columns[rc], r)
            });
            if matched {
                pairs.push((l, r));
            }
        }
    }
    pairs
}

impl Relation {
    /// Equi-join on pairwise equality of `left_cols` and `right_cols`.
    ///
    /// Each output row is a left row followed by the matching right row.
    pub fn join<S: AsRef<str>>(
        &self,
        other: &Relation,
        left_cols: &[S],
        right_cols: &[S],
    ) -> Result<Relation> {
        let (left_pos, right_pos) = resolve_join_columns(self, other, left_cols, right_cols)?;
        let pairs = nested_loop_pairs(self, other, &left_pos, &right_pos);

        debug!(
            left = %self.name,
            right = %other.name,
            strategy = "nested_loop",
            rows = pairs.len(),
            "join"
        );

        emit_pairs(self, other, &pairs, &[], format!("join({},{})", self.name, other.name))
    }
}

#[cfg(test)]
mod tests {
    use crate::column::Column;
    use crate::relation::Relation;
    use crate::row;

    fn orders() -> Relation {
        Relation::try_from_columns(
            "orders",
            [
                ("cust", Column::from(vec![1_i64, 2, 1, 4])),
                ("amount", Column::from(vec![10.0, 20.0, 30.0, 40.0])),
            ],
            None,
        )
        .unwrap()
    }

    fn customers() -> Relation {
        Relation::try_from_columns(
            "customers",
            [
                ("id", Column::from(vec![1_i64, 2, 3])),
                ("name", Column::from(vec!["ann", "bob", "cy"])),
            ],
            Some("id"),
        )
        .unwrap()
    }

    #[test]
    fn equi_join_rows() {
        let out = orders().join(&customers(), &["cust"], &["id"]).unwrap();
        let rows: Vec<_> = out.rows_iter().collect();
        assert_eq!(
            vec![
                row![1_i64, 10.0, 1_i64, "ann"],
                row![2_i64, 20.0, 2_i64, "bob"],
                row![1_i64, 30.0, 1_i64, "ann"],
            ],
            rows
        );
        assert_eq!(None, out.primary_key());
    }

    #[test]
    fn no_matches_is_empty() {
        let out = orders().join(&customers(), &["amount"], &["amount"]);
        assert!(out.is_err());

        let empty = customers().select("id", |v: &i64| *v > 10).unwrap();
        let out = orders().join(&empty, &["cust"], &["id"]).unwrap();
        assert_eq!(0, out.rows());
        assert_eq!(4, out.cols());
    }

    #[test]
    fn self_join_disambiguates() {
        let c = customers();
        let out = c.join(&c, &["id"], &["id"]).unwrap();
        assert_eq!(vec!["id", "name", "id2", "name2"], out.col_names());
        assert_eq!(3, out.rows());
    }
}
