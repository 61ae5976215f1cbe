//! Query language for selecting notecards by field values.
//!
//! A query is parsed into a [`Node`] tree and evaluated against a map of
//! [`FieldIndex`](crate::cache::FieldIndex) values to produce the matching
//! primary labels.

pub mod ast;
pub mod cast;
pub mod eval;
pub mod parser;
pub mod temporal;
pub mod value;

pub use ast::{ArithOp, CompareOp, Node, TimeUnit, Timedelta};
pub use eval::{evaluate, evaluate_binary, FieldIndices};
pub use parser::{parse_query, parse_query_at};
pub use temporal::Operand;
pub use value::{Value, ValueKind};
