use relstore_error::Result;
use tracing::{debug, warn};

use super::{emit_pairs, resolve_join_columns, JoinPairs};
use crate::index::Key;
use crate::relation::Relation;

/// How an index join finds its matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexJoinStrategy {
    /// Both sides are keyed on their join column. Walk the left ordered
    /// index and probe the right row index.
    BothKeyed,
    /// Scan the left side, probing the right row index.
    ProbeRight,
    /// Scan the right side, probing the left row index.
    ProbeLeft,
    /// Neither side is keyed on its join column.
    NestedLoop,
}

impl IndexJoinStrategy {
    pub fn choose(left: &Relation, right: &Relation, left_col: usize, right_col: usize) -> Self {
        let left_keyed = left.primary_key == Some(left_col);
        let right_keyed = right.primary_key == Some(right_col);
        match (left_keyed, right_keyed) {
            (true, true) => IndexJoinStrategy::BothKeyed,
            (false, true) => IndexJoinStrategy::ProbeRight,
            (true, false) => IndexJoinStrategy::ProbeLeft,
            (false, false) => IndexJoinStrategy::NestedLoop,
        }
    }
}

/// Compute index join pairs, given a strategy that's valid for the inputs.
pub(crate) fn index_join_pairs(
    left: &Relation,
    right: &Relation,
    left_col: usize,
    right_col: usize,
    strategy: IndexJoinStrategy,
) -> Result<JoinPairs> {
    let mut pairs = Vec::new();
    match strategy {
        IndexJoinStrategy::BothKeyed => {
            for key in left.ordered.keys() {
                let (Some(l), Some(r)) = (left.index.position(key), right.index.position(key))
                else {
                    continue;
                };
                pairs.push((l, r));
            }
        }
        IndexJoinStrategy::ProbeRight => {
            for (l, value) in left.columns[left_col].iter_scalars().enumerate() {
                if let Some(r) = right.index.position(&Key::Value(value)) {
                    pairs.push((l, r));
                }
            }
        }
        IndexJoinStrategy::ProbeLeft => {
            for (r, value) in right.columns[right_col].iter_scalars().enumerate() {
                if let Some(l) = left.index.position(&Key::Value(value)) {
                    pairs.push((l, r));
                }
            }
            pairs.sort_unstable();
        }
        IndexJoinStrategy::NestedLoop => {
            pairs = super::nested_loop::nested_loop_pairs(left, right, &[left_col], &[right_col]);
        }
    }
    Ok(pairs)
}

impl Relation {
    /// Equi-join on a single column pair using the row index of whichever
    /// side is keyed on its join column.
    ///
    /// Falls back to a nested loop join when neither side is.
    pub fn index_join(
        &self,
        other: &Relation,
        left_col: &str,
        right_col: &str,
    ) -> Result<Relation> {
        let (left_pos, right_pos) = resolve_join_columns(self, other, &[left_col], &[right_col])?;
        let (lc, rc) = (left_pos[0], right_pos[0]);

        let strategy = IndexJoinStrategy::choose(self, other, lc, rc);
        if strategy == IndexJoinStrategy::NestedLoop {
            warn!(
                left = %self.name,
                right = %other.name,
                %left_col,
                %right_col,
                "no primary key on join columns, falling back to nested loop join"
            );
        }

        let pairs = index_join_pairs(self, other, lc, rc, strategy)?;

        debug!(
            left = %self.name,
            right = %other.name,
            ?strategy,
            rows = pairs.len(),
            "index join"
        );

        emit_pairs(
            self,
            other,
            &pairs,
            &[],
            format!("index_join({},{})", self.name, other.name),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::testutil::assert_same_rows;

    fn orders() -> Relation {
        Relation::try_from_columns(
            "orders",
            [
                ("order", Column::from(vec![100_i32, 101, 102, 103])),
                ("cust", Column::from(vec![1_i64, 2, 1, 4])),
            ],
            Some("order"),
        )
        .unwrap()
    }

    fn customers() -> Relation {
        Relation::try_from_columns(
            "customers",
            [
                ("id", Column::from(vec![3_i64, 2, 1])),
                ("name", Column::from(vec!["cy", "bob", "ann"])),
            ],
            Some("id"),
        )
        .unwrap()
    }

    #[test]
    fn strategy_selection() {
        let (o, c) = (orders(), customers());
        assert_eq!(IndexJoinStrategy::ProbeRight, IndexJoinStrategy::choose(&o, &c, 1, 0));
        assert_eq!(IndexJoinStrategy::ProbeLeft, IndexJoinStrategy::choose(&c, &o, 0, 1));
        assert_eq!(IndexJoinStrategy::BothKeyed, IndexJoinStrategy::choose(&c, &c, 0, 0));
        assert_eq!(IndexJoinStrategy::NestedLoop, IndexJoinStrategy::choose(&o, &c, 1, 1));
    }

    #[test]
    fn probe_right_matches_nested_loop() {
        let (o, c) = (orders(), customers());
        let indexed = o.index_join(&c, "cust", "id").unwrap();
        let nested = o.join(&c, &["cust"], &["id"]).unwrap();
        assert_eq!(3, indexed.rows());
        assert_same_rows(&nested, &indexed);
        // Probing the right side keeps left order.
        assert_eq!(nested.columns(), indexed.columns());
    }

    #[test]
    fn probe_left_matches_nested_loop() {
        let (o, c) = (orders(), customers());
        let indexed = c.index_join(&o, "id", "cust").unwrap();
        let nested = c.join(&o, &["id"], &["cust"]).unwrap();
        assert_eq!(nested.columns(), indexed.columns());
    }

    #[test]
    fn both_keyed_matches_nested_loop() {
        let c = customers();
        let other = Relation::try_from_columns(
            "ages",
            [
                ("id", Column::from(vec![1_i64, 3])),
                ("age", Column::from(vec![31_i32, 40])),
            ],
            Some("id"),
        )
        .unwrap();
        let indexed = c.index_join(&other, "id", "id").unwrap();
        let nested = c.join(&other, &["id"], &["id"]).unwrap();
        assert_eq!(2, indexed.rows());
        assert_same_rows(&nested, &indexed);
    }

    #[test]
    fn unkeyed_falls_back() {
        let (o, c) = (orders(), customers());
        let out = o.index_join(&c, "order", "name");
        assert!(out.is_err());

        let v = o.project_names(&["cust"]).unwrap();
        let indexed = v.index_join(&v, "cust", "cust").unwrap();
        let nested = v.join(&v, &["cust"], &["cust"]).unwrap();
        assert_eq!(6, indexed.rows());
        assert_same_rows(&nested, &indexed);
    }
}
