//! Test utilities.
//!
//! Note this isn't behind a `#[cfg(test)]` flag since integration tests use
//! it too.
//!
//! Should not be used outside of tests.

use crate::column::Column;
use crate::relation::Relation;
use crate::row::ScalarRow;

/// Asserts that two relations hold the same columns with the same values, row
/// by row. Relation names and indexes aren't compared.
pub fn assert_relations_eq(a: &Relation, b: &Relation) {
    assert_eq!(a.col_names(), b.col_names(), "column names differ");
    assert_eq!(a.domain(), b.domain(), "domains differ");
    assert_eq!(a.rows(), b.rows(), "num rows differ");

    for (idx, (a_row, b_row)) in a.rows_iter().zip(b.rows_iter()).enumerate() {
        assert_eq!(a_row, b_row, "row {idx} differs");
    }
}

/// Asserts that two relations hold the same multiset of rows, ignoring order.
pub fn assert_same_rows(a: &Relation, b: &Relation) {
    assert_eq!(a.domain(), b.domain(), "domains differ");

    let mut a_rows: Vec<ScalarRow> = a.rows_iter().collect();
    let mut b_rows: Vec<ScalarRow> = b.rows_iter().collect();
    a_rows.sort();
    b_rows.sort();

    assert_eq!(a_rows, b_rows);
}

/// Start times for each weekday.
pub fn weekday_relation() -> Relation {
    Relation::try_from_columns(
        "weekday",
        [
            ("day", Column::from(vec!["Mon", "Tue", "Wed", "Thu", "Fri"])),
            ("time", Column::from(vec![5.00, 8.15, 6.30, 9.45, 7.00])),
        ],
        None,
    )
    .unwrap()
}

/// Start times for the weekend, same schema as [`weekday_relation`].
pub fn weekend_relation() -> Relation {
    Relation::try_from_columns(
        "weekend",
        [
            ("day", Column::from(vec!["Sat", "Sun"])),
            ("time", Column::from(vec![3.00, 4.30])),
        ],
        None,
    )
    .unwrap()
}
