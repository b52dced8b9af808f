//! Single-relation operators and set operators.
//!
//! Every operator produces a new relation and leaves its inputs untouched.

pub mod order;
pub mod project;
pub mod select;
pub mod setops;
