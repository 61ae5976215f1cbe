//! Index command implementations.

use crate::cache::NotecardCache;
use crate::cli::args::{IndexDumpArgs, IndexListArgs};
use crate::cli::output::Output;
use crate::error::{RemyError, Result};
use crate::query::value::Value;
use std::collections::HashSet;

/// Which columns of an index dump to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Columns {
    Both,
    Labels,
    Values,
}

impl Columns {
    fn from_args(args: &IndexDumpArgs) -> Self {
        if args.labels {
            Columns::Labels
        } else if args.values {
            Columns::Values
        } else {
            Columns::Both
        }
    }
}

pub fn list(cache: &NotecardCache, args: &IndexListArgs) -> Result<()> {
    let names = cache.field_names();
    let output = Output::new(args.format, args.pretty_print);
    if output.is_json() {
        output.print_json(&names)?;
    } else {
        for name in &names {
            println!("{}", name);
        }
    }
    Ok(())
}

pub fn dump(cache: &mut NotecardCache, args: &IndexDumpArgs) -> Result<()> {
    let delimiter = parse_delimiter(&args.delimiter)?;
    let columns = Columns::from_args(args);
    let index = cache.field_index(&args.field)?;

    let mut seen = HashSet::new();
    let rows: Vec<(&str, &Value)> = index
        .iter()
        .filter(|(value, label)| {
            let key = match columns {
                Columns::Both => (Some(label.as_str()), Some(value.to_string())),
                Columns::Labels => (Some(label.as_str()), None),
                Columns::Values => (None, Some(value.to_string())),
            };
            !args.unique || seen.insert(key)
        })
        .map(|(value, label)| (label.as_str(), value))
        .collect();

    let output = Output::new(args.format, args.pretty_print);
    if output.is_json() {
        let json = rows
            .iter()
            .map(|&(label, value)| -> Result<serde_json::Value> {
                Ok(match columns {
                    Columns::Both => serde_json::json!([label, value]),
                    Columns::Labels => serde_json::Value::from(label),
                    Columns::Values => serde_json::to_value(value)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        return output.print_json(&json);
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for (label, value) in rows {
        match columns {
            Columns::Both => writer.write_record([label, value.to_string().as_str()])?,
            Columns::Labels => writer.write_record([label])?,
            Columns::Values => writer.write_record([value.to_string()])?,
        }
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| RemyError::Io(e.into_error()))?;
    output.print_raw(&String::from_utf8_lossy(&bytes));
    Ok(())
}

/// Resolve a delimiter name or a single ASCII character to its byte.
pub fn parse_delimiter(name: &str) -> Result<u8> {
    match name.to_lowercase().as_str() {
        "comma" => return Ok(b','),
        "tab" => return Ok(b'\t'),
        "pipe" => return Ok(b'|'),
        _ => {}
    }
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(RemyError::Other(format!(
            "Unknown delimiter '{}': use comma, tab, pipe, or a single character",
            name
        ))),
    }
}
