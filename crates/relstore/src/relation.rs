use relstore_error::{construction, internal, RelError, Result};
use tracing::debug;

use crate::builder::RelationBuilder;
use crate::column::{Column, PhysicalValue};
use crate::datatype::DataType;
use crate::index::{Key, OrderedIndex, RowIndex};
use crate::row::ScalarRow;
use crate::scalar::ScalarValue;
use crate::schema::{Field, Schema};
use crate::selection::SelectionVector;

/// Reference from a column of one relation to the primary key of another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    /// Referencing column in this relation.
    pub column: usize,
    /// Name of the referenced relation.
    pub target: String,
    /// Primary key column of the referenced relation.
    pub target_column: usize,
}

/// A named table of typed columns with a maintained row index.
///
/// Relations are always fully materialized. Use [`RelationBuilder`] to build
/// one row at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub(crate) name: String,
    pub(crate) schema: Schema,
    pub(crate) columns: Vec<Column>,
    pub(crate) primary_key: Option<usize>,
    pub(crate) foreign_keys: Vec<ForeignKey>,
    pub(crate) index: RowIndex,
    pub(crate) ordered: OrderedIndex,
}

impl Relation {
    /// Create a relation from a schema and typed columns.
    ///
    /// All columns must have the same length and match the schema's types.
    /// When a primary key is given its values must be unique.
    pub fn try_new(
        name: impl Into<String>,
        schema: Schema,
        columns: Vec<Column>,
        primary_key: Option<usize>,
    ) -> Result<Self> {
        let name = name.into();
        if schema.num_fields() != columns.len() {
            return Err(construction!(
                "relation '{name}' has {} column names but {} columns",
                schema.num_fields(),
                columns.len()
            ));
        }

        let num_rows = columns.first().map(|c| c.len()).unwrap_or(0);
        for (idx, (field, col)) in schema.fields.iter().zip(&columns).enumerate() {
            if field.datatype != col.datatype() {
                return Err(RelError::type_mismatch(field.datatype, col.datatype()));
            }
            if col.len() != num_rows {
                return Err(construction!(
                    "expected column length to be {num_rows}, got {}. Column idx: {idx}",
                    col.len()
                ));
            }
        }

        if let Some(pk) = primary_key {
            if pk >= columns.len() {
                return Err(construction!(
                    "primary key position {pk} out of range for {} columns",
                    columns.len()
                ));
            }
        }

        let mut relation = Relation {
            name,
            schema,
            columns,
            primary_key,
            foreign_keys: Vec::new(),
            index: RowIndex::new(),
            ordered: OrderedIndex::new(),
        };
        relation.generate_index(false)?;

        Ok(relation)
    }

    /// Create a relation from named columns, inferring the schema.
    pub fn try_from_columns<S: Into<String>>(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = (S, Column)>,
        primary_key: Option<&str>,
    ) -> Result<Self> {
        let (fields, columns): (Vec<_>, Vec<_>) = columns
            .into_iter()
            .map(|(name, col)| (Field::new(name, col.datatype()), col))
            .unzip();
        let schema = Schema::try_new(fields)?;
        let primary_key = primary_key.map(|pk| schema.position(pk)).transpose()?;

        Self::try_new(name, schema, columns, primary_key)
    }

    /// Create a relation with zero rows.
    pub fn new_empty(name: impl Into<String>, schema: Schema) -> Result<Self> {
        let columns = schema.datatypes().map(Column::new_empty).collect();
        Self::try_new(name, schema, columns, None)
    }

    /// Assemble a relation from parts whose index has already been built.
    pub(crate) fn from_parts(
        name: String,
        schema: Schema,
        columns: Vec<Column>,
        primary_key: Option<usize>,
        index: RowIndex,
        ordered: OrderedIndex,
    ) -> Self {
        Relation {
            name,
            schema,
            columns,
            primary_key,
            foreign_keys: Vec::new(),
            index,
            ordered,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the same relation under a different name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Copy of this relation under a new name.
    pub fn rename(&self, name: impl Into<String>) -> Self {
        self.clone().with_name(name)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    pub fn col_names(&self) -> Vec<&str> {
        self.schema.names().collect()
    }

    pub fn domain(&self) -> String {
        self.schema.domain()
    }

    pub fn datatypes(&self) -> Vec<DataType> {
        self.schema.datatypes().collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        let idx = self.schema.position(name)?;
        Ok(&self.columns[idx])
    }

    pub fn column_at(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn primary_key(&self) -> Option<usize> {
        self.primary_key
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    pub fn row_index(&self) -> &RowIndex {
        &self.index
    }

    pub fn ordered_index(&self) -> &OrderedIndex {
        &self.ordered
    }

    /// Build the row at position `idx`.
    pub fn row(&self, idx: usize) -> Option<ScalarRow> {
        if idx >= self.rows() {
            return None;
        }
        self.columns.iter().map(|c| c.value(idx)).collect()
    }

    /// Iterate over all rows in position order.
    pub fn rows_iter(&self) -> impl Iterator<Item = ScalarRow> + '_ {
        (0..self.rows()).filter_map(|idx| self.row(idx))
    }

    /// Look up a row by key through the row index.
    pub fn lookup(&self, key: &Key) -> Option<&ScalarRow> {
        self.index.get(key)
    }

    /// Key for the row currently at `pos`.
    pub(crate) fn key_for_position(&self, pos: usize) -> Result<Key> {
        match self.primary_key {
            Some(pk) => self.columns[pk]
                .value(pos)
                .map(Key::Value)
                .ok_or_else(|| internal!("row {pos} missing from primary key column")),
            None => Ok(Key::Position(pos)),
        }
    }

    /// (Re)build the row index and ordered index.
    ///
    /// With `reset == false` everything is rebuilt from scratch in position
    /// order and any grouping is dropped. With `reset == true` the existing
    /// ordered index is kept and mapped onto current row positions, the key
    /// at ordered offset `i` identifying the row at position `i`.
    pub fn generate_index(&mut self, reset: bool) -> Result<()> {
        let num_rows = self.rows();
        let mut index = RowIndex::with_capacity(num_rows);

        if reset {
            if self.ordered.len() != num_rows {
                return Err(internal!(
                    "ordered index has {} keys for {num_rows} rows",
                    self.ordered.len()
                ));
            }
            for (pos, key) in self.ordered.keys().iter().enumerate() {
                if self.primary_key.is_some() && &self.key_for_position(pos)? != key {
                    return Err(internal!("key {key:?} does not match row {pos}"));
                }
                let row = self.row(pos).ok_or_else(|| internal!("missing row {pos}"))?;
                index.insert(key.clone(), pos, row)?;
            }
        } else {
            let mut ordered = OrderedIndex::new();
            for pos in 0..num_rows {
                let key = self.key_for_position(pos)?;
                let row = self.row(pos).ok_or_else(|| internal!("missing row {pos}"))?;
                index.insert(key.clone(), pos, row)?;
                ordered.push(key);
            }
            self.ordered = ordered;
        }

        self.index = index;
        Ok(())
    }

    /// Rebuild indexed rows in place, keeping every key at its position.
    fn refresh_index_rows(&mut self) -> Result<()> {
        let mut index = RowIndex::with_capacity(self.rows());
        for pos in 0..self.rows() {
            let key = self
                .index
                .key_at(pos)
                .cloned()
                .ok_or_else(|| internal!("no key indexed for row {pos}"))?;
            let row = self.row(pos).ok_or_else(|| internal!("missing row {pos}"))?;
            index.insert(key, pos, row)?;
        }
        self.index = index;
        Ok(())
    }

    /// Create a new relation holding the selected rows of every column.
    ///
    /// The primary key designation is kept, so the selection must not repeat
    /// rows of a keyed relation.
    pub(crate) fn take(&self, selection: &SelectionVector, name: String) -> Result<Relation> {
        let columns = self
            .columns
            .iter()
            .map(|c| c.gather(selection))
            .collect::<Result<Vec<_>>>()?;

        Relation::try_new(name, self.schema.clone(), columns, self.primary_key)
    }

    /// Check if an identical row exists in this relation.
    ///
    /// Keyed relations probe the row index by the row's key value and then
    /// compare the full tuple. Otherwise this scans every row.
    pub fn contains(&self, row: &ScalarRow) -> bool {
        if row.len() != self.cols() {
            return false;
        }
        match self.primary_key {
            Some(pk) => {
                let key = Key::Value(row.columns[pk].clone());
                self.index.get(&key) == Some(row)
            }
            None => self.scan_contains(row),
        }
    }

    /// Linear scan for an identical row.
    pub fn scan_contains(&self, row: &ScalarRow) -> bool {
        if row.len() != self.cols() {
            return false;
        }
        (0..self.rows()).any(|pos| {
            self.columns
                .iter()
                .zip(row.iter())
                .all(|(col, value)| col.value_eq_scalar(pos, value))
        })
    }

    /// Replace values equal to `match_value` in `column` with `func(value)`.
    ///
    /// Returns the number of updated rows. Updating the primary key column
    /// rebuilds the index from scratch, otherwise the current ordering (and
    /// grouping) is kept.
    ///
    /// On error the relation is left unchanged.
    pub fn update<T, F>(&mut self, column: &str, func: F, match_value: &T) -> Result<usize>
    where
        T: PhysicalValue + PartialEq,
        F: Fn(&T) -> T,
    {
        let idx = self.schema.position(column)?;
        let mut col = self.columns[idx].clone();
        let got = col.datatype();
        let values =
            T::slice_mut(&mut col).ok_or_else(|| RelError::type_mismatch(T::DATATYPE, got))?;

        let mut updated = 0;
        for value in values.iter_mut() {
            if value == match_value {
                let new_value = func(value);
                *value = new_value;
                updated += 1;
            }
        }

        if updated > 0 {
            // Indexes are only replaced once rebuilt, so restoring the old
            // column is enough to undo a failed update.
            let previous = std::mem::replace(&mut self.columns[idx], col);
            let rebuilt = if self.primary_key == Some(idx) {
                self.generate_index(false)
            } else {
                self.refresh_index_rows()
            };
            if let Err(e) = rebuilt {
                self.columns[idx] = previous;
                return Err(e);
            }
        }

        debug!(relation = %self.name, %column, updated, "updated column values");

        Ok(updated)
    }

    /// Register a foreign key from `column` to `target_column` in `target`.
    ///
    /// The target column must be the target's primary key and hold the same
    /// kind of values.
    pub fn add_foreign_key(
        &mut self,
        column: &str,
        target: &Relation,
        target_column: &str,
    ) -> Result<()> {
        let col_idx = self.schema.position(column)?;
        let target_idx = target.schema.position(target_column)?;

        if target.primary_key != Some(target_idx) {
            return Err(construction!(
                "'{target_column}' is not the primary key of '{}'",
                target.name
            ));
        }
        let ours = self.columns[col_idx].datatype();
        let theirs = target.columns[target_idx].datatype();
        if ours != theirs {
            return Err(RelError::type_mismatch(theirs, ours));
        }

        self.foreign_keys.push(ForeignKey {
            column: col_idx,
            target: target.name.clone(),
            target_column: target_idx,
        });

        Ok(())
    }

    /// Verify referential integrity of a registered foreign key.
    ///
    /// Returns false if any referencing value has no matching key in
    /// `target`.
    pub fn check_foreign_key(&self, fk_idx: usize, target: &Relation) -> Result<bool> {
        let fk = self
            .foreign_keys
            .get(fk_idx)
            .ok_or_else(|| construction!("no foreign key at index {fk_idx}"))?;
        if fk.target != target.name {
            return Err(construction!(
                "foreign key references '{}', got '{}'",
                fk.target,
                target.name
            ));
        }

        let col = &self.columns[fk.column];
        Ok(col
            .iter_scalars()
            .all(|v| target.index.contains_key(&Key::Value(v))))
    }

    /// First `n` rows in position order.
    pub fn limit(&self, n: usize) -> Result<Relation> {
        let sel = SelectionVector::with_range(0..n.min(self.rows()));
        self.take(&sel, format!("limit({})", self.name))
    }

    /// Stage this relation's rows into a fresh builder.
    pub fn to_builder(&self) -> Result<RelationBuilder> {
        let names: Vec<_> = self.schema.names().map(|s| s.to_string()).collect();
        let mut builder =
            RelationBuilder::try_new(self.name.clone(), names)?.with_datatypes(self.datatypes())?;
        if let Some(pk) = self.primary_key {
            builder = builder.with_primary_key_position(pk)?;
        }
        for row in self.rows_iter() {
            builder.add(row)?;
        }
        Ok(builder)
    }

    /// Get a single value.
    pub fn value(&self, row: usize, column: usize) -> Option<ScalarValue> {
        self.columns.get(column)?.value(row)
    }
}
