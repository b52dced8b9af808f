use std::collections::BTreeMap;

use relstore_error::{construction, internal, Result};
use tracing::debug;

use crate::index::Key;
use crate::relation::Relation;
use crate::scalar::ScalarValue;

impl Relation {
    /// Group rows on the given columns.
    ///
    /// Rows aren't moved. The ordered index is rewritten so that rows sharing
    /// the same values are contiguous, groups sorted by their composite value
    /// and members kept in position order. Group end offsets are recorded for
    /// use by [`Relation::epi`].
    pub fn group_by<S: AsRef<str>>(&mut self, columns: &[S]) -> Result<()> {
        if columns.is_empty() {
            return Err(construction!("group by requires at least one column"));
        }
        let positions = self.schema.positions(columns)?;

        let mut groups: Vec<Vec<usize>> = if self.rows() == 0 {
            Vec::new()
        } else {
            vec![(0..self.rows()).collect()]
        };

        // Refine every group on each subsequent column.
        for &col in &positions {
            let column = &self.columns[col];
            let mut refined = Vec::with_capacity(groups.len());
            for group in groups {
                let mut by_value: BTreeMap<ScalarValue, Vec<usize>> = BTreeMap::new();
                for pos in group {
                    let value = column
                        .value(pos)
                        .ok_or_else(|| internal!("missing value at row {pos}"))?;
                    by_value.entry(value).or_default().push(pos);
                }
                refined.extend(by_value.into_values());
            }
            groups = refined;
        }

        let keyed = groups
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .map(|pos| {
                        self.index
                            .key_at(pos)
                            .cloned()
                            .ok_or_else(|| internal!("no key indexed for row {pos}"))
                    })
                    .collect::<Result<Vec<Key>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        self.ordered.set_groups(keyed);

        debug!(
            relation = %self.name,
            columns = ?positions,
            groups = self.ordered.group_ends().len(),
            "group by"
        );

        Ok(())
    }
}
