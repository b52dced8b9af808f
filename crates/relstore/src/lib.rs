//! In-memory columnar relations and a relational algebra over them.
//!
//! A [`Relation`] stores each column in a single typed [`Column`] and keeps
//! a row index keyed on the primary key (or on row position when there is
//! none). Operators never mutate their inputs, with the exception of
//! [`Relation::update`] and [`Relation::group_by`].
pub mod aggregate;
pub mod algebra;
pub mod builder;
pub mod column;
pub mod config;
pub mod datatype;
pub mod index;
pub mod join;
pub mod relation;
pub mod row;
pub mod scalar;
pub mod schema;
pub mod selection;

pub mod testutil;

pub use aggregate::functions::AggregateFunction;
pub use aggregate::Aggregate;
pub use algebra::order::SortDirection;
pub use algebra::select::Predicate;
pub use builder::RelationBuilder;
pub use column::{Column, PhysicalValue};
pub use config::ExecutionConfig;
pub use datatype::DataType;
pub use index::{Key, OrderedIndex, RowIndex};
pub use join::index_join::IndexJoinStrategy;
pub use join::partitioned::JoinScheduler;
pub use join::theta::{ComparisonOperator, ThetaCondition};
pub use relation::{ForeignKey, Relation};
pub use row::ScalarRow;
pub use scalar::ScalarValue;
pub use schema::{Field, Schema};

pub use relstore_error::{RelError, Result};
