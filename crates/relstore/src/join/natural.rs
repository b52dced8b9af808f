use relstore_error::Result;
use tracing::debug;

use super::nested_loop::nested_loop_pairs;
use super::{check_join_types, emit_pairs};
use crate::relation::Relation;

impl Relation {
    /// Join on equality of every column name the two relations share.
    ///
    /// The right side's copies of the shared columns are dropped from the
    /// output. Relations without shared names produce the cross product.
    pub fn natural_join(&self, other: &Relation) -> Result<Relation> {
        let mut left_pos = Vec::new();
        let mut right_pos = Vec::new();
        for (idx, name) in self.schema.names().enumerate() {
            if let Ok(pos) = other.schema.position(name) {
                left_pos.push(idx);
                right_pos.push(pos);
            }
        }
        check_join_types(self, other, &left_pos, &right_pos)?;

        let pairs = nested_loop_pairs(self, other, &left_pos, &right_pos);

        debug!(
            left = %self.name,
            right = %other.name,
            shared = left_pos.len(),
            rows = pairs.len(),
            "natural join"
        );

        emit_pairs(
            self,
            other,
            &pairs,
            &right_pos,
            format!("natural_join({},{})", self.name, other.name),
        )
    }
}
