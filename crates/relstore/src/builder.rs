use relstore_error::{construction, RelError, Result};
use tracing::trace;

use crate::column::StagedColumn;
use crate::datatype::{parse_domain, DataType};
use crate::index::{Key, OrderedIndex, RowIndex};
use crate::relation::Relation;
use crate::row::ScalarRow;
use crate::schema::{Field, Schema};

/// Builds a relation one row at a time.
///
/// Rows are staged in untyped per-column buffers. `materialize` consumes the
/// builder, infers or validates each column's type and produces the final
/// typed relation.
#[derive(Debug, Clone)]
pub struct RelationBuilder {
    name: String,
    names: Vec<String>,
    /// Declared column types, if known up front.
    datatypes: Option<Vec<DataType>>,
    primary_key: Option<usize>,
    staged: Vec<StagedColumn>,
    index: RowIndex,
    ordered: OrderedIndex,
    num_rows: usize,
    /// Set once a row has been added without updating the index.
    index_incomplete: bool,
}

impl RelationBuilder {
    pub fn try_new<S: Into<String>>(
        name: impl Into<String>,
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        for (idx, name) in names.iter().enumerate() {
            if names[..idx].contains(name) {
                return Err(construction!("duplicate column name '{name}'"));
            }
        }

        Ok(RelationBuilder {
            name: name.into(),
            staged: names.iter().map(|_| StagedColumn::new()).collect(),
            names,
            datatypes: None,
            primary_key: None,
            index: RowIndex::new(),
            ordered: OrderedIndex::new(),
            num_rows: 0,
            index_incomplete: false,
        })
    }

    /// Declare column types using a domain string, e.g. "SD".
    pub fn with_domain(self, domain: &str) -> Result<Self> {
        let datatypes = parse_domain(domain)?;
        self.with_datatypes(datatypes)
    }

    pub fn with_datatypes(mut self, datatypes: impl IntoIterator<Item = DataType>) -> Result<Self> {
        let datatypes: Vec<_> = datatypes.into_iter().collect();
        if datatypes.len() != self.names.len() {
            return Err(construction!(
                "domain has {} types for {} columns",
                datatypes.len(),
                self.names.len()
            ));
        }
        self.datatypes = Some(datatypes);
        Ok(self)
    }

    pub fn with_primary_key(self, column: &str) -> Result<Self> {
        let pos = self
            .names
            .iter()
            .position(|n| n == column)
            .ok_or_else(|| RelError::missing_column(column))?;
        self.with_primary_key_position(pos)
    }

    pub fn with_primary_key_position(mut self, pos: usize) -> Result<Self> {
        if pos >= self.names.len() {
            return Err(construction!(
                "primary key position {pos} out of range for {} columns",
                self.names.len()
            ));
        }
        if self.num_rows > 0 {
            return Err(construction!("primary key must be set before adding rows"));
        }
        self.primary_key = Some(pos);
        Ok(self)
    }

    /// Number of staged rows.
    pub fn rows(&self) -> usize {
        self.num_rows
    }

    pub fn cols(&self) -> usize {
        self.names.len()
    }

    fn check_width(&self, row: &ScalarRow) -> Result<()> {
        if row.len() != self.names.len() {
            return Err(construction!(
                "tuple has {} values, relation '{}' has {} columns",
                row.len(),
                self.name,
                self.names.len()
            ));
        }
        if let Some(datatypes) = &self.datatypes {
            for (value, datatype) in row.iter().zip(datatypes) {
                if value.datatype() != *datatype {
                    return Err(RelError::type_mismatch(datatype, value.datatype()));
                }
            }
        }
        Ok(())
    }

    fn stage(&mut self, row: ScalarRow) -> Result<()> {
        for (idx, value) in row.columns.into_iter().enumerate() {
            let expected = self.datatypes.as_ref().map(|types| types[idx]);
            self.staged[idx].append(value, expected)?;
        }
        self.num_rows += 1;
        Ok(())
    }

    /// Stage a row and index it.
    ///
    /// The key is the primary key value if one is designated, otherwise the
    /// row's position.
    pub fn add(&mut self, row: ScalarRow) -> Result<()> {
        self.check_width(&row)?;

        let pos = self.num_rows;
        let key = match self.primary_key {
            Some(pk) => Key::Value(row.columns[pk].clone()),
            None => Key::Position(pos),
        };
        self.index.insert(key.clone(), pos, row.clone())?;
        self.ordered.push(key);

        self.stage(row)
    }

    /// Stage a row without touching the index.
    ///
    /// The index is built in full during `materialize`.
    pub fn add_ni(&mut self, row: ScalarRow) -> Result<()> {
        self.check_width(&row)?;
        self.index_incomplete = true;
        self.stage(row)
    }

    /// Finalize staged rows into typed columns.
    ///
    /// Columns without a declared type take the type of their first staged
    /// value, falling back to Utf8 when there are no rows.
    pub fn materialize(mut self) -> Result<Relation> {
        let mut fields = Vec::with_capacity(self.names.len());
        let mut columns = Vec::with_capacity(self.names.len());

        for (idx, name) in self.names.iter().enumerate() {
            let declared = self.datatypes.as_ref().map(|types| types[idx]);
            let staged = &mut self.staged[idx];
            let datatype = staged.infer_datatype(declared).unwrap_or(DataType::Utf8);
            columns.push(staged.finish(datatype)?);
            fields.push(Field::new(name.clone(), datatype));
        }

        let schema = Schema::try_new(fields)?;

        trace!(
            relation = %self.name,
            rows = self.num_rows,
            reindex = self.index_incomplete,
            "materializing relation"
        );

        if self.index_incomplete {
            Relation::try_new(self.name, schema, columns, self.primary_key)
        } else {
            Ok(Relation::from_parts(
                self.name,
                schema,
                columns,
                self.primary_key,
                self.index,
                self.ordered,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::row;
    use crate::scalar::ScalarValue;

    #[test]
    fn add_then_materialize_matches_columns() {
        let mut builder = RelationBuilder::try_new("times", ["day", "time"]).unwrap();
        builder.add(row!["Mon", 5.0]).unwrap();
        builder.add(row!["Tue", 8.15]).unwrap();
        let built = builder.materialize().unwrap();

        let direct = Relation::try_from_columns(
            "times",
            [
                ("day", Column::from(vec!["Mon", "Tue"])),
                ("time", Column::from(vec![5.0, 8.15])),
            ],
            None,
        )
        .unwrap();

        assert_eq!(direct, built);
    }

    #[test]
    fn wrong_width_rejected() {
        let mut builder = RelationBuilder::try_new("r", ["a", "b"]).unwrap();
        let err = builder.add(row![1_i32]).unwrap_err();
        assert!(matches!(err, RelError::Construction(_)));
        assert_eq!(0, builder.rows());
    }

    #[test]
    fn declared_domain_validates_values() {
        let mut builder = RelationBuilder::try_new("r", ["a", "b"])
            .unwrap()
            .with_domain("SD")
            .unwrap();
        let err = builder.add(row!["x", 1_i32]).unwrap_err();
        assert!(matches!(err, RelError::TypeMismatch { .. }));
    }

    #[test]
    fn inconsistent_kinds_fail_materialize() {
        let mut builder = RelationBuilder::try_new("r", ["a"]).unwrap();
        builder.add(row![1_i64]).unwrap();
        builder.add(row!["two"]).unwrap();
        assert!(builder.materialize().is_err());
    }

    #[test]
    fn duplicate_primary_key() {
        let mut builder = RelationBuilder::try_new("r", ["id", "v"])
            .unwrap()
            .with_primary_key("id")
            .unwrap();
        builder.add(row![1_i64, "a"]).unwrap();
        let err = builder.add(row![1_i64, "b"]).unwrap_err();
        assert!(matches!(err, RelError::DuplicateKey(_)));
        assert_eq!(1, builder.rows());
    }

    #[test]
    fn add_updates_index_incrementally() {
        let mut builder = RelationBuilder::try_new("r", ["id", "v"])
            .unwrap()
            .with_primary_key("id")
            .unwrap();
        builder.add(row![7_i64, "a"]).unwrap();
        builder.add(row![3_i64, "b"]).unwrap();
        let rel = builder.materialize().unwrap();

        let key = Key::Value(ScalarValue::from(3_i64));
        assert_eq!(Some(1), rel.row_index().position(&key));
        assert_eq!(Some(&row![3_i64, "b"]), rel.lookup(&key));
    }

    #[test]
    fn add_ni_indexes_on_materialize() {
        let mut builder = RelationBuilder::try_new("r", ["a"]).unwrap();
        builder.add_ni(row!["x"]).unwrap();
        builder.add_ni(row!["y"]).unwrap();
        let rel = builder.materialize().unwrap();

        assert_eq!(2, rel.row_index().len());
        assert_eq!(Some(&row!["y"]), rel.lookup(&Key::Position(1)));
    }

    #[test]
    fn empty_builder_uses_domain() {
        let builder = RelationBuilder::try_new("r", ["a", "b"])
            .unwrap()
            .with_domain("LQ")
            .unwrap();
        let rel = builder.materialize().unwrap();
        assert_eq!(0, rel.rows());
        assert_eq!("LQ", rel.domain());
    }

    #[test]
    fn restaging_is_idempotent() {
        let mut builder = RelationBuilder::try_new("r", ["a", "b"]).unwrap();
        builder.add(row![1_i32, "x"]).unwrap();
        builder.add(row![2_i32, "y"]).unwrap();
        let first = builder.materialize().unwrap();
        let second = first.to_builder().unwrap().materialize().unwrap();
        assert_eq!(first, second);
    }
}
