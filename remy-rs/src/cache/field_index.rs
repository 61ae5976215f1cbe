//! Sorted per-field index of `(value, label)` entries.

use crate::notecard::Notecard;
use crate::parser::field_value::FieldParser;
use crate::query::value::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// How far a range query backs up from its lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snap {
    /// Start one entry before the first entry `>= low`.
    Soft,
    /// Start at the first entry sharing the value of the entry before the
    /// first entry `>= low`.
    Hard,
}

/// Index of one field across every notecard, sorted by value then label.
///
/// Built once and never mutated. Entries are unique, but a label appears
/// once per distinct value the field yields for it.
#[derive(Debug, Clone)]
pub struct FieldIndex {
    name: String,
    entries: Vec<(Value, String)>,
    inverse: BTreeMap<String, Vec<Value>>,
}

impl FieldIndex {
    /// Scan `cards` for fields named `name` (case-insensitive) and index the
    /// values `parser` yields under each card's primary label.
    pub fn build<'a>(
        name: &str,
        parser: &dyn FieldParser,
        cards: impl IntoIterator<Item = &'a Notecard>,
    ) -> Self {
        let upper = name.to_uppercase();
        let mut entries = Vec::new();
        for card in cards {
            for (label, text) in card.fields() {
                if label.to_uppercase() != upper {
                    continue;
                }
                for value in parser.parse_field(&text) {
                    entries.push((value, card.primary_label().to_string()));
                }
            }
        }
        let index = Self::from_entries(&upper, entries);
        debug!(field = %index.name, entries = index.len(), "built field index");
        index
    }

    /// Build an index from already parsed entries.
    pub fn from_entries(name: &str, entries: impl IntoIterator<Item = (Value, String)>) -> Self {
        let mut entries: Vec<(Value, String)> = entries.into_iter().collect();
        entries.sort();
        entries.dedup();

        let mut inverse: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for (value, label) in &entries {
            inverse.entry(label.clone()).or_default().push(value.clone());
        }

        Self {
            name: name.to_uppercase(),
            entries,
            inverse,
        }
    }

    /// Uppercased field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &(Value, String)> {
        self.entries.iter()
    }

    /// Label to its values for this field, in value order.
    pub fn inverse(&self) -> &BTreeMap<String, Vec<Value>> {
        &self.inverse
    }

    /// Values of one label, empty if it has none.
    pub fn values_for(&self, label: &str) -> &[Value] {
        self.inverse.get(label).map(Vec::as_slice).unwrap_or_default()
    }

    /// Entries in `[low, high]`, ascending.
    ///
    /// With only `low`, this is an exact match. With neither bound it is the
    /// whole index. `None` is "no bound", distinct from `Some(&Value::Null)`.
    pub fn find(
        &self,
        low: Option<&Value>,
        high: Option<&Value>,
        snap: Option<Snap>,
    ) -> &[(Value, String)] {
        let high = high.or(low);
        let start = self.start(low, snap);
        let end = match high {
            Some(high) => self.entries.partition_point(|(v, _)| v <= high),
            None => self.entries.len(),
        };
        if end <= start {
            return &[];
        }
        &self.entries[start..end]
    }

    /// Entries `>= low` with no upper bound, ascending.
    pub fn find_from(&self, low: &Value, snap: Option<Snap>) -> &[(Value, String)] {
        let start = self.start(Some(low), snap);
        &self.entries[start..]
    }

    fn start(&self, low: Option<&Value>, snap: Option<Snap>) -> usize {
        let Some(low) = low else {
            return 0;
        };
        let start = self.entries.partition_point(|(v, _)| v < low);
        if start == 0 {
            return start;
        }
        match snap {
            None => start,
            Some(Snap::Soft) => start - 1,
            Some(Snap::Hard) => {
                let previous = &self.entries[start - 1].0;
                self.entries.partition_point(|(v, _)| v < previous)
            }
        }
    }
}
