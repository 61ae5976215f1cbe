//! Interpretation of `'...'::date`, `'...'::timestamp` and `'...'::timedelta`
//! literals, including arithmetic embedded in the quoted text.

use crate::query::ast::{ArithOp, Node, Timedelta};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// `HH:MM`, `HH:MM:SS`, `:MM`, `:MM:SS` or `::SS`.
static COLON_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(\d+)?:(\d+)(?::(\d+))?|::(\d+))$").unwrap());

/// `<integer><optional space><unit>`.
static UNIT_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]?\d+)\s*([a-zA-Z]+)$").unwrap());

/// Target type of a `::` cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    Date,
    Timestamp,
    Timedelta,
}

impl CastKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "date" => Some(CastKind::Date),
            "timestamp" => Some(CastKind::Timestamp),
            "timedelta" => Some(CastKind::Timedelta),
            _ => None,
        }
    }
}

/// Interpret `text` as a literal of the given kind.
///
/// When the whole text is not a plain literal, a leading complete temporal
/// term followed by `+`/`-` and a timedelta becomes a `BinaryOp`. `today` is
/// always a date and `now` always a timestamp on the left of such an
/// expression.
pub fn cast(kind: CastKind, text: &str, now: DateTime<Utc>) -> Result<Node, String> {
    let plain = match kind {
        CastKind::Date => parse_date(text, now).map(Node::date),
        CastKind::Timestamp => parse_timestamp(text, now).map(Node::datetime),
        CastKind::Timedelta => return parse_timedelta(text).map(Node::timedelta),
    };
    if plain.is_ok() {
        return plain;
    }

    let mut candidates = Vec::new();
    for (i, ch) in text.char_indices() {
        let op = match ch {
            '+' => ArithOp::Add,
            '-' => ArithOp::Sub,
            _ => continue,
        };
        let left = text[..i].trim();
        let right = text[i + 1..].trim();
        let Some(left_node) = temporal_term(kind, left, now) else {
            continue;
        };
        if let Ok(delta) = parse_timedelta(right) {
            candidates.push(Node::binary(op, left_node, Node::timedelta(delta)));
        }
    }

    match candidates.len() {
        0 => plain,
        1 => Ok(candidates.remove(0)),
        _ => Err(format!("Ambiguous operator placement in '{}'", text)),
    }
}

/// The left-hand side of embedded arithmetic.
fn temporal_term(kind: CastKind, text: &str, now: DateTime<Utc>) -> Option<Node> {
    match text.to_lowercase().as_str() {
        "today" => return Some(Node::date(now.date_naive())),
        "now" => return Some(Node::datetime(now.naive_utc())),
        _ => {}
    }
    match kind {
        CastKind::Date => parse_iso_date(text).map(Node::date),
        CastKind::Timestamp => parse_iso_timestamp(text).map(Node::datetime),
        CastKind::Timedelta => None,
    }
}

/// Parse a calendar date, or the keyword `today`.
pub fn parse_date(text: &str, now: DateTime<Utc>) -> Result<NaiveDate, String> {
    let trimmed = text.trim();
    match trimmed.to_lowercase().as_str() {
        "today" | "now" => return Ok(now.date_naive()),
        _ => {}
    }
    parse_iso_date(trimmed).ok_or_else(|| format!("Invalid date format: '{}'", text))
}

/// Parse a date-time, or the keyword `now`.
pub fn parse_timestamp(text: &str, now: DateTime<Utc>) -> Result<NaiveDateTime, String> {
    let trimmed = text.trim();
    match trimmed.to_lowercase().as_str() {
        "now" => return Ok(now.naive_utc()),
        "today" => return Ok(now.date_naive().and_time(NaiveTime::MIN)),
        _ => {}
    }
    parse_iso_timestamp(trimmed).ok_or_else(|| format!("Invalid timestamp format: '{}'", text))
}

/// Strict `YYYY-MM-DD`.
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// ISO 8601 date-time with a space or `T` separator.
///
/// Offsets are converted to UTC and dropped. A date on its own is midnight.
pub fn parse_iso_timestamp(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut normalized = trimmed.replacen(' ', "T", 1);
    if let Some(stripped) = normalized
        .strip_suffix('Z')
        .or_else(|| normalized.strip_suffix('z'))
    {
        normalized = format!("{}+00:00", stripped);
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(dt.naive_utc());
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Some(dt);
        }
    }
    parse_iso_date(&normalized).map(|d| d.and_time(NaiveTime::MIN))
}

/// Parse a colon time format (pure seconds) or `<n> <unit>`.
pub fn parse_timedelta(text: &str) -> Result<Timedelta, String> {
    let trimmed = text.trim();

    if let Some(caps) = COLON_FORMAT.captures(trimmed) {
        let part = |i: usize| -> Result<i64, String> {
            caps.get(i)
                .map(|m| m.as_str().parse::<i64>())
                .transpose()
                .map(|n| n.unwrap_or(0))
                .map_err(|e| format!("Invalid timedelta '{}': {}", text, e))
        };
        let seconds = if caps.get(4).is_some() {
            part(4)?
        } else {
            let hours = part(1)?;
            let minutes = part(2)?;
            let secs = part(3)?;
            hours
                .checked_mul(3600)
                .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
                .and_then(|hm| hm.checked_add(secs))
                .ok_or_else(|| format!("Invalid timedelta '{}': out of range", text))?
        };
        return Ok(Timedelta::seconds(seconds));
    }

    if let Some(caps) = UNIT_FORMAT.captures(trimmed) {
        let magnitude: i64 = caps[1]
            .parse()
            .map_err(|e| format!("Invalid timedelta '{}': {}", text, e))?;
        return Timedelta::new(magnitude, &caps[2]).map_err(|e| e.to_string());
    }

    Err(format!("Invalid timedelta format: '{}'", text))
}
