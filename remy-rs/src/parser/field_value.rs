//! Turning raw field text into typed index values.

use crate::query::cast::{parse_iso_date, parse_iso_timestamp};
use crate::query::value::Value;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Anything that can turn the text of a field into zero or more values.
pub trait FieldParser {
    fn parse_field(&self, text: &str) -> Vec<Value>;
}

impl<F> FieldParser for F
where
    F: Fn(&str) -> Vec<Value>,
{
    fn parse_field(&self, text: &str) -> Vec<Value> {
        self(text)
    }
}

/// Built-in field parsers, selectable by name in `.remy.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueParser {
    /// Trimmed text.
    String,
    /// Comma-separated, trimmed and lowercased.
    Tags,
    /// Integer, or float when the text has a fraction or exponent.
    Number,
    /// `true/false`, `yes/no`, `1/0`.
    Boolean,
    /// `YYYY-MM-DD`.
    Date,
    /// ISO date-time from the first comma-separated part, converted to UTC.
    Timestamp,
}

impl FieldParser for ValueParser {
    fn parse_field(&self, text: &str) -> Vec<Value> {
        let trimmed = text.trim();
        let parsed = match self {
            ValueParser::String => Some(Value::String(trimmed.to_string())),
            ValueParser::Tags => {
                return trimmed
                    .split(',')
                    .map(|tag| tag.trim().to_lowercase())
                    .filter(|tag| !tag.is_empty())
                    .map(Value::String)
                    .collect();
            }
            ValueParser::Number => parse_number(trimmed),
            ValueParser::Boolean => match trimmed.to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(Value::Boolean(true)),
                "false" | "no" | "0" => Some(Value::Boolean(false)),
                _ => None,
            },
            ValueParser::Date => parse_iso_date(trimmed).map(Value::Date),
            ValueParser::Timestamp => {
                let first = trimmed.split(',').next().unwrap_or_default();
                parse_iso_timestamp(first).map(Value::Timestamp)
            }
        };

        match parsed {
            Some(value) => vec![value],
            None => {
                warn!(parser = ?self, text = trimmed, "skipping unparseable field value");
                Vec::new()
            }
        }
    }
}

fn parse_number(text: &str) -> Option<Value> {
    if text.contains(['.', 'e', 'E']) {
        text.parse::<f64>().ok().map(Value::Float)
    } else {
        text.parse::<i64>().ok().map(Value::Integer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_string_parser_trims() {
        assert_eq!(
            ValueParser::String.parse_field("  inbox \n"),
            vec![Value::from("inbox")]
        );
    }

    #[test]
    fn test_tags_parser() {
        assert_eq!(
            ValueParser::Tags.parse_field(" Work, Urgent ,,home"),
            vec![Value::from("work"), Value::from("urgent"), Value::from("home")]
        );
    }

    #[test]
    fn test_number_parser() {
        assert_eq!(ValueParser::Number.parse_field(" 3"), vec![Value::Integer(3)]);
        assert_eq!(ValueParser::Number.parse_field("2.5"), vec![Value::Float(2.5)]);
        assert!(ValueParser::Number.parse_field("high").is_empty());
    }

    #[test]
    fn test_boolean_parser() {
        assert_eq!(ValueParser::Boolean.parse_field("Yes"), vec![Value::Boolean(true)]);
        assert_eq!(ValueParser::Boolean.parse_field("0"), vec![Value::Boolean(false)]);
        assert!(ValueParser::Boolean.parse_field("maybe").is_empty());
    }

    #[test]
    fn test_timestamp_parser_uses_first_part() {
        let values = ValueParser::Timestamp.parse_field("2024-06-15 10:00:00+05:00, later");
        let expected = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(5, 0, 0)
            .unwrap();
        assert_eq!(values, vec![Value::Timestamp(expected)]);
    }

    #[test]
    fn test_closure_parser() {
        let upper = |text: &str| vec![Value::String(text.trim().to_uppercase())];
        assert_eq!(upper.parse_field(" a "), vec![Value::from("A")]);
    }

    #[test]
    fn test_parser_names_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            parser: ValueParser,
        }
        let w: Wrapper = toml::from_str("parser = \"timestamp\"").unwrap();
        assert_eq!(w.parser, ValueParser::Timestamp);
    }
}
