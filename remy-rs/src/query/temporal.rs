//! Calendar-aware arithmetic between dates, timestamps and timedeltas.

use crate::error::{RemyError, Result};
use crate::query::ast::{ArithOp, TimeUnit, Timedelta};
use crate::query::value::Value;
use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

/// Result of reducing an arithmetic subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    Timedelta(Timedelta),
}

impl Operand {
    fn describe(&self) -> String {
        match self {
            Operand::Value(v) => v.kind().to_string(),
            Operand::Timedelta(_) => "timedelta".to_string(),
        }
    }
}

/// Add a timedelta to a date or timestamp.
///
/// Sub-day units promote a date to a timestamp at midnight. Months and years
/// cap an overflowing day to the end of the target month.
pub fn add(value: &Value, delta: Timedelta) -> Result<Value> {
    match value {
        Value::Date(date) if delta.unit.is_sub_day() => {
            shift_timestamp(date.and_time(NaiveTime::MIN), delta).map(Value::Timestamp)
        }
        Value::Date(date) => shift_date(*date, delta).map(Value::Date),
        Value::Timestamp(ts) => shift_timestamp(*ts, delta).map(Value::Timestamp),
        other => Err(RemyError::InvalidOperands(format!(
            "addition: {} + timedelta",
            other.kind()
        ))),
    }
}

/// Subtract a timedelta from a date or timestamp.
pub fn subtract(value: &Value, delta: Timedelta) -> Result<Value> {
    if !value.is_temporal() {
        return Err(RemyError::InvalidOperands(format!(
            "subtraction: {} - timedelta",
            value.kind()
        )));
    }
    let negated = delta
        .magnitude
        .checked_neg()
        .map(|magnitude| Timedelta::from_unit(magnitude, delta.unit))
        .ok_or_else(|| overflow(value, delta))?;
    add(value, negated)
}

/// Apply `left op right`. Addition is commutative; subtraction needs the
/// temporal value on the left.
pub fn apply(op: ArithOp, left: Operand, right: Operand) -> Result<Operand> {
    match (op, left, right) {
        (ArithOp::Add, Operand::Value(v), Operand::Timedelta(d))
        | (ArithOp::Add, Operand::Timedelta(d), Operand::Value(v))
            if v.is_temporal() =>
        {
            add(&v, d).map(Operand::Value)
        }
        (ArithOp::Sub, Operand::Value(v), Operand::Timedelta(d)) if v.is_temporal() => {
            subtract(&v, d).map(Operand::Value)
        }
        (op, left, right) => {
            let name = match op {
                ArithOp::Add => "addition",
                ArithOp::Sub => "subtraction",
            };
            Err(RemyError::InvalidOperands(format!(
                "{}: {} {} {}",
                name,
                left.describe(),
                op.as_str(),
                right.describe()
            )))
        }
    }
}

fn shift_date(date: NaiveDate, delta: Timedelta) -> Result<NaiveDate> {
    let shifted = match delta.unit {
        TimeUnit::Months | TimeUnit::Years => {
            let months = month_count(delta).ok_or_else(|| overflow(&Value::Date(date), delta))?;
            shift_months(months, |m| date.checked_add_months(m), |m| {
                date.checked_sub_months(m)
            })
        }
        _ => fixed_offset(delta).and_then(|offset| date.checked_add_signed(offset)),
    };
    shifted.ok_or_else(|| overflow(&Value::Date(date), delta))
}

fn shift_timestamp(ts: NaiveDateTime, delta: Timedelta) -> Result<NaiveDateTime> {
    let shifted = match delta.unit {
        TimeUnit::Months | TimeUnit::Years => {
            let months = month_count(delta).ok_or_else(|| overflow(&Value::Timestamp(ts), delta))?;
            shift_months(months, |m| ts.checked_add_months(m), |m| {
                ts.checked_sub_months(m)
            })
        }
        _ => fixed_offset(delta).and_then(|offset| ts.checked_add_signed(offset)),
    };
    shifted.ok_or_else(|| overflow(&Value::Timestamp(ts), delta))
}

fn month_count(delta: Timedelta) -> Option<i64> {
    match delta.unit {
        TimeUnit::Years => delta.magnitude.checked_mul(12),
        _ => Some(delta.magnitude),
    }
}

fn shift_months<T>(
    months: i64,
    forward: impl FnOnce(Months) -> Option<T>,
    backward: impl FnOnce(Months) -> Option<T>,
) -> Option<T> {
    let count = u32::try_from(months.unsigned_abs()).ok()?;
    if months >= 0 {
        forward(Months::new(count))
    } else {
        backward(Months::new(count))
    }
}

fn fixed_offset(delta: Timedelta) -> Option<TimeDelta> {
    let n = delta.magnitude;
    match delta.unit {
        TimeUnit::Seconds => TimeDelta::try_seconds(n),
        TimeUnit::Minutes => TimeDelta::try_minutes(n),
        TimeUnit::Hours => TimeDelta::try_hours(n),
        TimeUnit::Days => TimeDelta::try_days(n),
        TimeUnit::Weeks => TimeDelta::try_weeks(n),
        TimeUnit::Months | TimeUnit::Years => None,
    }
}

fn overflow(value: &Value, delta: Timedelta) -> RemyError {
    RemyError::TemporalOverflow(format!("{} + {}", value, delta))
}
