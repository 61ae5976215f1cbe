//! Typed field values and their total ordering.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Value domains, in sort order.
///
/// The rank is the leading sort key of every index entry, so a field holding
/// mixed kinds still sorts without comparing across domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ValueKind {
    String = 0,
    Number = 1,
    Boolean = 2,
    Null = 3,
    Date = 4,
    Timestamp = 5,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Null => "null",
            ValueKind::Date => "date",
            ValueKind::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A scalar parsed from field text or from a query literal.
///
/// Timestamps are naive and always in UTC.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::Integer(_) | Value::Float(_) => ValueKind::Number,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Null => ValueKind::Null,
            Value::Date(_) => ValueKind::Date,
            Value::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Value::Date(_) | Value::Timestamp(_))
    }

    fn cmp_same_kind(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => cmp_floats(*a, *b),
            (Value::Integer(a), Value::Float(b)) => cmp_int_float(*a, *b),
            (Value::Float(a), Value::Integer(b)) => cmp_int_float(*b, *a).reverse(),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// `-0.0 == 0.0`; NaN falls back to the IEEE total order, so a positive NaN
/// sorts above every number and a negative NaN below.
fn cmp_floats(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
}

/// Exact comparison of an integer with a float, with no rounding of either.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() {
        return if f.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if f.is_infinite() {
        return if f > 0.0 {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }
    let whole = f.trunc();
    // Saturating cast; every finite f64 beyond the i128 range is beyond i64 too
    (i as i128).cmp(&(whole as i128)).then_with(|| {
        let fraction = f - whole;
        if fraction > 0.0 {
            Ordering::Less
        } else if fraction < 0.0 {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind()
            .cmp(&other.kind())
            .then_with(|| self.cmp_same_kind(other))
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => {
                write!(f, "{:.1}", x)
            }
            Value::Float(x) => write!(f, "{}", x),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => f.write_str("null"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Null => serializer.serialize_unit(),
            Value::Date(_) | Value::Timestamp(_) => serializer.collect_str(self),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(t: NaiveDateTime) -> Self {
        Value::Timestamp(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_kind_rank_order() {
        let mut values = vec![
            Value::Timestamp(date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap()),
            Value::Date(date(2024, 1, 1)),
            Value::Null,
            Value::Boolean(false),
            Value::Integer(5),
            Value::from("zzz"),
        ];
        values.sort();
        let kinds: Vec<ValueKind> = values.iter().map(Value::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ValueKind::String,
                ValueKind::Number,
                ValueKind::Boolean,
                ValueKind::Null,
                ValueKind::Date,
                ValueKind::Timestamp,
            ]
        );
    }

    #[test]
    fn test_mixed_numbers_compare_numerically() {
        assert_eq!(Value::Integer(1), Value::Float(1.0));
        assert!(Value::Integer(2) < Value::Float(2.5));
        assert!(Value::Float(-0.5) < Value::Integer(0));
    }

    #[test]
    fn test_large_integers_and_floats_order_exactly() {
        let big = 1i64 << 53;
        let a = Value::Integer(big);
        let b = Value::Float(big as f64);
        let c = Value::Integer(big + 1);
        assert_eq!(a, b);
        assert!(b < c);
        assert!(a < c);
        assert_eq!(c.cmp(&b), Ordering::Greater);
        assert!(Value::Float(9.3e18) > Value::Integer(i64::MAX));
        assert!(Value::Float(-9.3e18) < Value::Integer(i64::MIN));
        assert!(Value::Float(-2.5) < Value::Integer(-2));
        assert!(Value::Float(-1.5) > Value::Integer(-2));
    }

    #[test]
    fn test_float_edge_values() {
        assert_eq!(Value::Float(-0.0), Value::Float(0.0));
        assert_eq!(Value::Float(-0.0), Value::Integer(0));
        assert!(Value::Float(f64::INFINITY) > Value::Integer(i64::MAX));
        assert!(Value::Float(f64::NEG_INFINITY) < Value::Integer(i64::MIN));
        assert!(Value::Float(f64::NAN) > Value::Integer(i64::MAX));
        assert!(Value::Float(f64::NAN) > Value::Float(f64::INFINITY));
    }

    #[test]
    fn test_string_never_equals_number() {
        assert_ne!(Value::from("3"), Value::Integer(3));
        assert!(Value::from("999") < Value::Integer(0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Float(19.99).to_string(), "19.99");
        assert_eq!(Value::Date(date(2024, 2, 29)).to_string(), "2024-02-29");
        let ts = date(2024, 1, 1).and_hms_opt(3, 0, 0).unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2024-01-01T03:00:00");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&vec![
            Value::from("a"),
            Value::Integer(3),
            Value::Boolean(true),
            Value::Null,
            Value::Date(date(2024, 6, 15)),
        ])
        .unwrap();
        assert_eq!(json, r#"["a",3,true,null,"2024-06-15"]"#);
    }
}
