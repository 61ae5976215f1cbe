//! AST for parsed query expressions.

use crate::error::{RemyError, Result};
use crate::query::value::Value;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Operators
// ============================================================================

/// Comparison operator in a `field op value` predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompareOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

impl FromStr for CompareOp {
    type Err = RemyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "=" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::Ne),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Le),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Ge),
            other => Err(RemyError::UnsupportedOperator(other.to_string())),
        }
    }
}

/// Arithmetic operator between temporal operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArithOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
}

impl ArithOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
        }
    }
}

// ============================================================================
// Timedelta
// ============================================================================

/// Unit of a timedelta. Names are always stored plural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl TimeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
            TimeUnit::Weeks => "weeks",
            TimeUnit::Months => "months",
            TimeUnit::Years => "years",
        }
    }

    /// Whether the unit is shorter than a day.
    pub fn is_sub_day(self) -> bool {
        matches!(self, TimeUnit::Seconds | TimeUnit::Minutes | TimeUnit::Hours)
    }
}

impl FromStr for TimeUnit {
    type Err = RemyError;

    /// Accepts singular or plural unit names, in any case.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        let singular = lower.strip_suffix('s').unwrap_or(&lower);
        match singular {
            "second" => Ok(TimeUnit::Seconds),
            "minute" => Ok(TimeUnit::Minutes),
            "hour" => Ok(TimeUnit::Hours),
            "day" => Ok(TimeUnit::Days),
            "week" => Ok(TimeUnit::Weeks),
            "month" => Ok(TimeUnit::Months),
            "year" => Ok(TimeUnit::Years),
            _ => Err(RemyError::InvalidUnit(s.to_string())),
        }
    }
}

/// A signed magnitude in a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timedelta {
    pub magnitude: i64,
    pub unit: TimeUnit,
}

impl Timedelta {
    /// Build a timedelta from a unit name such as `"day"` or `"Hours"`.
    pub fn new(magnitude: i64, unit: &str) -> Result<Self> {
        Ok(Self {
            magnitude,
            unit: unit.parse()?,
        })
    }

    pub fn from_unit(magnitude: i64, unit: TimeUnit) -> Self {
        Self { magnitude, unit }
    }

    pub fn seconds(magnitude: i64) -> Self {
        Self::from_unit(magnitude, TimeUnit::Seconds)
    }

    pub fn negate(self) -> Self {
        Self {
            magnitude: -self.magnitude,
            unit: self.unit,
        }
    }
}

impl fmt::Display for Timedelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit.as_str())
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// A node of a parsed query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// String, number, boolean or null literal.
    Literal { value: Value },
    /// Field reference, case preserved. Dotted paths are allowed.
    Identifier { name: String },
    Compare {
        op: CompareOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    And { left: Box<Node>, right: Box<Node> },
    Or { left: Box<Node>, right: Box<Node> },
    Not { operand: Box<Node> },
    In { left: Box<Node>, values: Vec<Node> },
    DateTimeLiteral { value: NaiveDateTime },
    DateLiteral { value: NaiveDate },
    TimedeltaLiteral { value: Timedelta },
    BinaryOp {
        op: ArithOp,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn literal(value: impl Into<Value>) -> Self {
        Node::Literal {
            value: value.into(),
        }
    }

    pub fn null() -> Self {
        Node::Literal { value: Value::Null }
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Node::Identifier { name: name.into() }
    }

    pub fn compare(op: CompareOp, left: Node, right: Node) -> Self {
        Node::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Node, right: Node) -> Self {
        Node::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Node, right: Node) -> Self {
        Node::Or {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: Node) -> Self {
        Node::Not {
            operand: Box::new(operand),
        }
    }

    pub fn in_list(left: Node, values: Vec<Node>) -> Self {
        Node::In {
            left: Box::new(left),
            values,
        }
    }

    pub fn datetime(value: NaiveDateTime) -> Self {
        Node::DateTimeLiteral { value }
    }

    pub fn date(value: NaiveDate) -> Self {
        Node::DateLiteral { value }
    }

    pub fn timedelta(value: Timedelta) -> Self {
        Node::TimedeltaLiteral { value }
    }

    pub fn binary(op: ArithOp, left: Node, right: Node) -> Self {
        Node::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Uppercased names of every identifier referenced in the tree.
    pub fn field_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_field_names(&mut names);
        names
    }

    fn collect_field_names(&self, names: &mut BTreeSet<String>) {
        match self {
            Node::Identifier { name } => {
                names.insert(name.to_uppercase());
            }
            Node::Compare { left, right, .. }
            | Node::And { left, right }
            | Node::Or { left, right }
            | Node::BinaryOp { left, right, .. } => {
                left.collect_field_names(names);
                right.collect_field_names(names);
            }
            Node::Not { operand } => operand.collect_field_names(names),
            Node::In { left, values } => {
                left.collect_field_names(names);
                for value in values {
                    value.collect_field_names(names);
                }
            }
            Node::Literal { .. }
            | Node::DateTimeLiteral { .. }
            | Node::DateLiteral { .. }
            | Node::TimedeltaLiteral { .. } => {}
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal {
                value: Value::String(s),
            } => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Node::Literal { value } => write!(f, "{}", value),
            Node::Identifier { name } => f.write_str(name),
            Node::Compare { op, left, right } => {
                write!(f, "{} {} {}", left, op.as_str(), right)
            }
            Node::And { left, right } => write!(f, "({} AND {})", left, right),
            Node::Or { left, right } => write!(f, "({} OR {})", left, right),
            Node::Not { operand } => write!(f, "NOT {}", operand),
            Node::In { left, values } => {
                let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{} IN [{}]", left, items.join(", "))
            }
            Node::DateTimeLiteral { value } => {
                write!(f, "'{}'::timestamp", value.format("%Y-%m-%d %H:%M:%S%.f"))
            }
            Node::DateLiteral { value } => write!(f, "'{}'::date", value.format("%Y-%m-%d")),
            Node::TimedeltaLiteral { value } => write!(f, "'{}'::timedelta", value),
            Node::BinaryOp { op, left, right } => {
                write!(f, "{} {} {}", left, op.as_str(), right)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_names_normalize_to_plural() {
        assert_eq!(Timedelta::new(1, "day").unwrap().unit, TimeUnit::Days);
        assert_eq!(Timedelta::new(2, "HOURS").unwrap().unit, TimeUnit::Hours);
        assert_eq!(Timedelta::new(3, "Week").unwrap().unit.as_str(), "weeks");
    }

    #[test]
    fn test_invalid_unit() {
        match Timedelta::new(1, "fortnight") {
            Err(RemyError::InvalidUnit(unit)) => assert_eq!(unit, "fortnight"),
            other => panic!("Expected InvalidUnit, got {:?}", other),
        }
        assert!(Timedelta::new(1, "s").is_err());
    }

    #[test]
    fn test_structural_equality() {
        let a = Node::compare(CompareOp::Eq, Node::identifier("tag"), Node::literal("inbox"));
        let b = Node::compare(CompareOp::Eq, Node::identifier("tag"), Node::literal("inbox"));
        assert_eq!(a, b);
        let c = Node::compare(CompareOp::Eq, Node::identifier("TAG"), Node::literal("inbox"));
        assert_ne!(a, c);
    }

    #[test]
    fn test_field_names_uppercased_and_deduplicated() {
        let query = Node::or(
            Node::and(
                Node::compare(CompareOp::Eq, Node::identifier("tag"), Node::literal("a")),
                Node::compare(CompareOp::Gt, Node::identifier("Priority"), Node::literal(2i64)),
            ),
            Node::not(Node::compare(
                CompareOp::Eq,
                Node::identifier("TAG"),
                Node::literal("b"),
            )),
        );
        let names: Vec<String> = query.field_names().into_iter().collect();
        assert_eq!(names, vec!["PRIORITY".to_string(), "TAG".to_string()]);
    }

    #[test]
    fn test_display_round_trips_shape() {
        let query = Node::and(
            Node::compare(CompareOp::Le, Node::identifier("due"), Node::literal("it's")),
            Node::in_list(Node::identifier("tag"), vec![Node::literal(1i64), Node::null()]),
        );
        assert_eq!(query.to_string(), "(due <= 'it\\'s' AND tag IN [1, null])");
    }

    #[test]
    fn test_compare_op_from_str() {
        assert_eq!(">=".parse::<CompareOp>().unwrap(), CompareOp::Ge);
        assert!("<>".parse::<CompareOp>().is_err());
    }
}
