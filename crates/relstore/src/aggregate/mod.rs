//! Grouping and aggregate projection.

pub mod functions;
pub mod group_by;

use relstore_error::{internal, RelError, Result};
use tracing::debug;

use crate::builder::RelationBuilder;
use crate::relation::Relation;
use crate::row::ScalarRow;
use crate::selection::SelectionVector;
use functions::AggregateFunction;

/// An aggregate to compute per group, with the name of its output column.
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub function: AggregateFunction,
    pub name: String,
    /// Input column, unused by `Count`.
    pub column: Option<String>,
}

impl Aggregate {
    pub fn new(
        function: AggregateFunction,
        name: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Aggregate {
            function,
            name: name.into(),
            column: Some(column.into()),
        }
    }

    pub fn count(name: impl Into<String>) -> Self {
        Aggregate {
            function: AggregateFunction::Count,
            name: name.into(),
            column: None,
        }
    }
}

impl Relation {
    /// One row per group holding the projected columns followed by each
    /// aggregate.
    ///
    /// Projected columns must be constant within every group, otherwise this
    /// errors with `NonConstantGroup`. A relation that hasn't been grouped is
    /// treated as a single group.
    pub fn epi<S: AsRef<str>>(&self, aggregates: &[Aggregate], project: &[S]) -> Result<Relation> {
        self.aggregate_groups(aggregates, project, true)
    }

    /// Like [`Relation::epi`], but projected values are taken from the first
    /// member of each group without checking the rest agree.
    pub fn epi_any<S: AsRef<str>>(
        &self,
        aggregates: &[Aggregate],
        project: &[S],
    ) -> Result<Relation> {
        self.aggregate_groups(aggregates, project, false)
    }

    fn aggregate_groups<S: AsRef<str>>(
        &self,
        aggregates: &[Aggregate],
        project: &[S],
        check_constant: bool,
    ) -> Result<Relation> {
        let project_pos = self.schema.positions(project)?;

        let mut inputs = Vec::with_capacity(aggregates.len());
        let mut names: Vec<String> = project.iter().map(|s| s.as_ref().to_string()).collect();
        let mut datatypes: Vec<_> = project_pos
            .iter()
            .map(|&pos| self.columns[pos].datatype())
            .collect();

        for agg in aggregates {
            let input = match (&agg.column, agg.function.requires_input()) {
                (Some(col), true) => Some(self.schema.position(col)?),
                _ => None,
            };
            let input_type = input.map(|pos| self.columns[pos].datatype());
            datatypes.push(agg.function.output_type(input_type)?);
            names.push(agg.name.clone());
            inputs.push(input);
        }

        let mut builder = RelationBuilder::try_new(format!("epi({})", self.name), names)?
            .with_datatypes(datatypes)?;

        let keys = self.ordered.keys();
        let ranges = self.ordered.group_ranges();
        for (group, range) in ranges.iter().enumerate() {
            let members: SelectionVector = keys[range.clone()]
                .iter()
                .map(|key| {
                    self.index
                        .position(key)
                        .ok_or_else(|| internal!("key {key:?} not in row index"))
                })
                .collect::<Result<_>>()?;
            let first = members
                .get(0)
                .ok_or_else(|| internal!("group {group} is empty"))?;

            let mut row = ScalarRow::empty();
            for &pos in &project_pos {
                let column = &self.columns[pos];
                if check_constant {
                    let constant = members
                        .iter_locations()
                        .all(|member| column.values_eq(first, column, member));
                    if !constant {
                        return Err(RelError::NonConstantGroup {
                            column: self.schema.fields[pos].name.clone(),
                            group,
                        });
                    }
                }
                let value = column
                    .value(first)
                    .ok_or_else(|| internal!("missing value at row {first}"))?;
                row.columns.push(value);
            }

            for (agg, input) in aggregates.iter().zip(&inputs) {
                let values = input
                    .map(|pos| self.columns[pos].gather(&members))
                    .transpose()?;
                row.columns
                    .push(agg.function.apply(values.as_ref(), range.len())?);
            }

            builder.add_ni(row)?;
        }

        debug!(
            relation = %self.name,
            groups = ranges.len(),
            aggregates = aggregates.len(),
            checked = check_constant,
            "aggregate projection"
        );

        builder.materialize()
    }
}
