//! Evaluation of a parsed query against field indices.

use crate::cache::field_index::FieldIndex;
use crate::error::{RemyError, Result};
use crate::query::ast::{CompareOp, Node};
use crate::query::temporal::{self, Operand};
use crate::query::value::Value;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Field indices keyed by uppercased field name.
pub type FieldIndices<'a> = HashMap<String, &'a FieldIndex>;

/// Compute the primary labels of every notecard matching `node`.
///
/// Fields missing from `indices` match nothing.
pub fn evaluate(node: &Node, indices: &FieldIndices<'_>) -> Result<BTreeSet<String>> {
    let labels = evaluate_node(node, indices)?;
    debug!(query = %node, matches = labels.len(), "evaluated query");
    Ok(labels)
}

fn evaluate_node(node: &Node, indices: &FieldIndices<'_>) -> Result<BTreeSet<String>> {
    match node {
        Node::Compare { op, left, right } => evaluate_compare(*op, left, right, indices),
        Node::And { left, right } => {
            let left = evaluate_node(left, indices)?;
            let right = evaluate_node(right, indices)?;
            Ok(left.intersection(&right).cloned().collect())
        }
        Node::Or { left, right } => {
            let mut left = evaluate_node(left, indices)?;
            left.extend(evaluate_node(right, indices)?);
            Ok(left)
        }
        Node::Not { .. } => Err(RemyError::UnsupportedOperator("NOT".to_string())),
        Node::In { .. } => Err(RemyError::UnsupportedOperator("IN".to_string())),
        Node::Literal { .. }
        | Node::Identifier { .. }
        | Node::DateTimeLiteral { .. }
        | Node::DateLiteral { .. }
        | Node::TimedeltaLiteral { .. }
        | Node::BinaryOp { .. } => Err(RemyError::NotAPredicate(node.to_string())),
    }
}

fn evaluate_compare(
    op: CompareOp,
    left: &Node,
    right: &Node,
    indices: &FieldIndices<'_>,
) -> Result<BTreeSet<String>> {
    let Node::Identifier { name } = left else {
        return Err(RemyError::InvalidComparison(format!(
            "left side must be a field name, got {}",
            left
        )));
    };
    let value = match evaluate_binary(right)? {
        Operand::Value(value) => value,
        Operand::Timedelta(_) => {
            return Err(RemyError::InvalidComparison(
                "Comparing timedeltas is not supported".to_string(),
            ));
        }
    };
    if op == CompareOp::Ne {
        return Err(RemyError::UnsupportedOperator("!=".to_string()));
    }

    let Some(index) = indices.get(&name.to_uppercase()) else {
        return Ok(BTreeSet::new());
    };

    // One-sided ranges stay within the value's own kind
    let same_kind = |v: &Value| v.kind() == value.kind();
    let labels = match op {
        CompareOp::Eq => collect(index.find(Some(&value), Some(&value), None), |_| true),
        CompareOp::Le => collect(index.find(None, Some(&value), None), same_kind),
        CompareOp::Ge => collect(index.find_from(&value, None), same_kind),
        CompareOp::Lt => collect(index.find(None, Some(&value), None), |v| {
            same_kind(v) && *v != value
        }),
        CompareOp::Gt => collect(index.find_from(&value, None), |v| {
            same_kind(v) && *v != value
        }),
        CompareOp::Ne => BTreeSet::new(),
    };
    Ok(labels)
}

fn collect(entries: &[(Value, String)], keep: impl Fn(&Value) -> bool) -> BTreeSet<String> {
    entries
        .iter()
        .filter(|(value, _)| keep(value))
        .map(|(_, label)| label.clone())
        .collect()
}

/// Reduce the right-hand side of a comparison to a value or a timedelta.
pub fn evaluate_binary(node: &Node) -> Result<Operand> {
    match node {
        Node::Literal { value } => Ok(Operand::Value(value.clone())),
        Node::DateLiteral { value } => Ok(Operand::Value(Value::Date(*value))),
        Node::DateTimeLiteral { value } => Ok(Operand::Value(Value::Timestamp(*value))),
        Node::TimedeltaLiteral { value } => Ok(Operand::Timedelta(*value)),
        Node::BinaryOp { op, left, right } => {
            temporal::apply(*op, evaluate_binary(left)?, evaluate_binary(right)?)
        }
        Node::Identifier { name } => Err(RemyError::InvalidComparison(format!(
            "cannot compare against field '{}'",
            name
        ))),
        other => Err(RemyError::InvalidComparison(format!(
            "{} is not a value",
            other
        ))),
    }
}
