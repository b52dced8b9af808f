use std::fmt;

use relstore_error::{RelError, Result};

/// Concrete kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    Int32,
    Int64,
    Float64,
    /// 64-bit numerator/denominator rational.
    Rational,
    Complex,
    Utf8,
}

impl DataType {
    /// Character representing this type in a domain string.
    pub const fn domain_char(&self) -> char {
        match self {
            DataType::Int32 => 'I',
            DataType::Int64 => 'L',
            DataType::Float64 => 'D',
            DataType::Rational => 'Q',
            DataType::Complex => 'C',
            DataType::Utf8 => 'S',
        }
    }

    pub fn from_domain_char(c: char) -> Result<Self> {
        Ok(match c {
            'I' => DataType::Int32,
            'L' => DataType::Int64,
            'D' => DataType::Float64,
            'Q' => DataType::Rational,
            'C' => DataType::Complex,
            'S' => DataType::Utf8,
            other => {
                return Err(RelError::UnsupportedPredicateType(format!(
                    "no column type for domain character '{other}'"
                )))
            }
        })
    }

    pub const fn is_numeric(&self) -> bool {
        !matches!(self, DataType::Utf8)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int32 => write!(f, "Int32"),
            Self::Int64 => write!(f, "Int64"),
            Self::Float64 => write!(f, "Float64"),
            Self::Rational => write!(f, "Rational"),
            Self::Complex => write!(f, "Complex"),
            Self::Utf8 => write!(f, "Utf8"),
        }
    }
}

/// Parse a domain string (e.g. "SD") into per-column types.
pub fn parse_domain(domain: &str) -> Result<Vec<DataType>> {
    domain.chars().map(DataType::from_domain_char).collect()
}

/// Render types as a domain string.
pub fn domain_string<'a>(types: impl IntoIterator<Item = &'a DataType>) -> String {
    types.into_iter().map(|t| t.domain_char()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_roundtrip() {
        let types = parse_domain("ILDQCS").unwrap();
        assert_eq!(
            vec![
                DataType::Int32,
                DataType::Int64,
                DataType::Float64,
                DataType::Rational,
                DataType::Complex,
                DataType::Utf8
            ],
            types
        );
        assert_eq!("ILDQCS", domain_string(&types));
    }

    #[test]
    fn unknown_domain_char() {
        let err = parse_domain("SX").unwrap_err();
        assert!(matches!(err, RelError::UnsupportedPredicateType(_)));
    }
}
