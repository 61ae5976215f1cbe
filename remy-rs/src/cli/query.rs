//! Query command implementation.

use crate::cache::NotecardCache;
use crate::cli::args::QueryArgs;
use crate::cli::output::Output;
use crate::error::{RemyError, Result};
use crate::query::parser::parse_query;
use crate::query::value::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

pub fn run(cache: &mut NotecardCache, args: &QueryArgs) -> Result<()> {
    let labels: Vec<String> = if args.all {
        cache.primary_labels().into_iter().map(String::from).collect()
    } else {
        let expression = args.expression().ok_or_else(|| {
            RemyError::Other("Must provide a query expression, --where, or --all".to_string())
        })?;
        let node = parse_query(expression)?;
        cache.query(&node)?.into_iter().collect()
    };

    let keys = sort_keys(cache, args.order_by.as_deref());
    let labels = order_labels(labels, &keys, args.reverse, args.limit);
    debug!(matched = labels.len(), "query finished");

    let texts: Vec<String> = labels
        .iter()
        .filter_map(|label| cache.find_card_by_label(label))
        .map(|card| card.to_text())
        .collect();

    let output = Output::new(args.format, args.pretty_print);
    if output.is_json() {
        output.print_json(&texts)?;
    } else {
        for text in &texts {
            output.print_raw(text);
        }
    }
    Ok(())
}

/// Smallest value of the ordering field per primary label.
///
/// Empty when ordering by label, or when the field is not configured.
fn sort_keys(cache: &mut NotecardCache, order_by: Option<&str>) -> HashMap<String, Value> {
    let Some(field) = order_by.filter(|f| !f.eq_ignore_ascii_case("id")) else {
        return HashMap::new();
    };
    match cache.field_index(field) {
        Ok(index) => index
            .inverse()
            .iter()
            .filter_map(|(label, values)| values.first().map(|v| (label.clone(), v.clone())))
            .collect(),
        Err(_) => {
            debug!(field, "unknown order field, sorting by label");
            HashMap::new()
        }
    }
}

/// Sort by key with missing keys last and ties broken by label, then
/// reverse and truncate.
fn order_labels(
    mut labels: Vec<String>,
    keys: &HashMap<String, Value>,
    reverse: bool,
    limit: Option<usize>,
) -> Vec<String> {
    labels.sort_by(|a, b| compare_optional_values(keys.get(a), keys.get(b)).then_with(|| a.cmp(b)));
    if reverse {
        labels.reverse();
    }
    if let Some(limit) = limit {
        labels.truncate(limit);
    }
    labels
}

fn compare_optional_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn priorities() -> HashMap<String, Value> {
        HashMap::from([
            ("task1".to_string(), Value::Integer(3)),
            ("task2".to_string(), Value::Integer(1)),
            ("task4".to_string(), Value::Integer(3)),
        ])
    }

    #[test]
    fn test_order_by_label_without_keys() {
        let ordered = order_labels(labels(&["b", "c", "a"]), &HashMap::new(), false, None);
        assert_eq!(ordered, labels(&["a", "b", "c"]));
    }

    #[test]
    fn test_missing_keys_sort_last() {
        let ordered = order_labels(
            labels(&["task5", "task4", "task1", "task2"]),
            &priorities(),
            false,
            None,
        );
        assert_eq!(ordered, labels(&["task2", "task1", "task4", "task5"]));
    }

    #[test]
    fn test_reverse_then_limit() {
        let ordered = order_labels(
            labels(&["task5", "task4", "task1", "task2"]),
            &priorities(),
            true,
            Some(2),
        );
        assert_eq!(ordered, labels(&["task5", "task4"]));
    }
}
