use relstore_error::{construction, RelError, Result};

use crate::datatype::{domain_string, DataType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub datatype: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, datatype: DataType) -> Self {
        Field {
            name: name.into(),
            datatype,
        }
    }
}

/// Ordered, uniquely named columns of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub const fn empty() -> Self {
        Schema { fields: Vec::new() }
    }

    /// Create a schema, erroring on duplicate column names.
    pub fn try_new(fields: impl IntoIterator<Item = Field>) -> Result<Self> {
        let fields: Vec<_> = fields.into_iter().collect();
        for (idx, field) in fields.iter().enumerate() {
            if fields[..idx].iter().any(|f| f.name == field.name) {
                return Err(construction!("duplicate column name '{}'", field.name));
            }
        }
        Ok(Schema { fields })
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn datatypes(&self) -> impl Iterator<Item = DataType> + '_ {
        self.fields.iter().map(|f| f.datatype)
    }

    /// Domain string for this schema, one character per column.
    pub fn domain(&self) -> String {
        domain_string(self.fields.iter().map(|f| &f.datatype))
    }

    pub fn position(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| RelError::missing_column(name))
    }

    pub fn positions<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<usize>> {
        names.iter().map(|n| self.position(n.as_ref())).collect()
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn project(&self, positions: &[usize]) -> Result<Schema> {
        let fields = positions
            .iter()
            .map(|&idx| {
                self.fields
                    .get(idx)
                    .cloned()
                    .ok_or_else(|| RelError::missing_column(format!("#{idx}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Schema::try_new(fields)
    }

    /// Merge two schemas for a join output.
    ///
    /// Left names come first. A right name colliding with a name already in
    /// the output gets "2" appended until it is unique.
    pub fn merge_disambiguated(left: &Schema, right: &Schema) -> Schema {
        let mut fields = left.fields.clone();
        for field in &right.fields {
            let mut name = field.name.clone();
            while fields.iter().any(|f| f.name == name) {
                name.push('2');
            }
            fields.push(Field::new(name, field.datatype));
        }
        Schema { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_rejected() {
        let err = Schema::try_new([
            Field::new("a", DataType::Int32),
            Field::new("a", DataType::Utf8),
        ])
        .unwrap_err();
        assert!(matches!(err, RelError::Construction(_)));
    }

    #[test]
    fn merge_renames_collisions() {
        let left = Schema::try_new([
            Field::new("id", DataType::Int64),
            Field::new("id2", DataType::Utf8),
        ])
        .unwrap();
        let right = Schema::try_new([
            Field::new("id", DataType::Int64),
            Field::new("name", DataType::Utf8),
        ])
        .unwrap();

        let merged = Schema::merge_disambiguated(&left, &right);
        let names: Vec<_> = merged.names().collect();
        assert_eq!(vec!["id", "id2", "id22", "name"], names);
        assert_eq!("LSLS", merged.domain());
    }

    #[test]
    fn missing_position() {
        let schema = Schema::try_new([Field::new("a", DataType::Int32)]).unwrap();
        assert!(matches!(
            schema.position("b").unwrap_err(),
            RelError::MissingColumn(_)
        ));
    }
}
