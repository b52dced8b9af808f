//! Join implementations and utilities.
//!
//! Every join first computes the matching `(left_pos, right_pos)` pairs, then
//! gathers both sides at those positions to build the output relation.

pub mod index_join;
pub mod natural;
pub mod nested_loop;
pub mod partitioned;
pub mod theta;

use relstore_error::{construction, RelError, Result};

use crate::relation::Relation;
use crate::schema::Schema;
use crate::selection::SelectionVector;

/// Matching row positions, left then right.
pub type JoinPairs = Vec<(usize, usize)>;

/// Resolve the equi-join columns of both sides to positions.
///
/// Both lists must be the same length and each pair of columns must hold the
/// same kind of values.
pub(crate) fn resolve_join_columns<S: AsRef<str>>(
    left: &Relation,
    right: &Relation,
    left_cols: &[S],
    right_cols: &[S],
) -> Result<(Vec<usize>, Vec<usize>)> {
    if left_cols.len() != right_cols.len() {
        return Err(construction!(
            "join has {} left columns but {} right columns",
            left_cols.len(),
            right_cols.len()
        ));
    }

    let left_pos = left.schema.positions(left_cols)?;
    let right_pos = right.schema.positions(right_cols)?;
    check_join_types(left, right, &left_pos, &right_pos)?;

    Ok((left_pos, right_pos))
}

pub(crate) fn check_join_types(
    left: &Relation,
    right: &Relation,
    left_pos: &[usize],
    right_pos: &[usize],
) -> Result<()> {
    for (&l, &r) in left_pos.iter().zip(right_pos) {
        let (ours, theirs) = (left.columns[l].datatype(), right.columns[r].datatype());
        if ours != theirs {
            return Err(RelError::type_mismatch(ours, theirs));
        }
    }
    Ok(())
}

/// Build the joined relation for the given pairs.
///
/// Output columns are all left columns followed by the right columns not in
/// `drop_right`. Colliding right names are disambiguated. The result has no
/// primary key.
pub(crate) fn emit_pairs(
    left: &Relation,
    right: &Relation,
    pairs: &[(usize, usize)],
    drop_right: &[usize],
    name: String,
) -> Result<Relation> {
    let left_sel: SelectionVector = pairs.iter().map(|&(l, _)| l).collect();
    let right_sel: SelectionVector = pairs.iter().map(|&(_, r)| r).collect();

    let kept: Vec<usize> = (0..right.cols())
        .filter(|idx| !drop_right.contains(idx))
        .collect();

    let mut columns = Vec::with_capacity(left.cols() + kept.len());
    for col in &left.columns {
        columns.push(col.gather(&left_sel)?);
    }
    for &idx in &kept {
        columns.push(right.columns[idx].gather(&right_sel)?);
    }

    let schema = Schema::merge_disambiguated(&left.schema, &right.schema.project(&kept)?);

    Relation::try_new(name, schema, columns, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::row;

    #[test]
    fn emit_disambiguates_and_drops() {
        let left = Relation::try_from_columns(
            "l",
            [
                ("k", Column::from(vec![1_i32, 2])),
                ("v", Column::from(vec!["a", "b"])),
            ],
            None,
        )
        .unwrap();
        let right = Relation::try_from_columns(
            "r",
            [
                ("k", Column::from(vec![2_i32])),
                ("v", Column::from(vec!["x"])),
            ],
            None,
        )
        .unwrap();

        let out = emit_pairs(&left, &right, &[(1, 0)], &[], "j".to_string()).unwrap();
        assert_eq!(vec!["k", "v", "k2", "v2"], out.col_names());
        assert_eq!(Some(row![2_i32, "b", 2_i32, "x"]), out.row(0));

        let out = emit_pairs(&left, &right, &[(1, 0)], &[0], "j".to_string()).unwrap();
        assert_eq!(vec!["k", "v", "v2"], out.col_names());
    }

    #[test]
    fn resolve_checks_counts_and_types() {
        let left =
            Relation::try_from_columns("l", [("k", Column::from(vec![1_i32]))], None).unwrap();
        let right =
            Relation::try_from_columns("r", [("k", Column::from(vec![1_i64]))], None).unwrap();

        let err = resolve_join_columns(&left, &right, &["k"], &[]).unwrap_err();
        assert!(matches!(err, RelError::Construction(_)));

        let err = resolve_join_columns(&left, &right, &["k"], &["k"]).unwrap_err();
        assert!(matches!(err, RelError::TypeMismatch { .. }));
    }
}
