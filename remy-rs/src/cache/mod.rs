//! Notecard collections and their field indices.
//!
//! A `NotecardCache` owns the scanned notecards of one location plus the
//! field indices built from them. Indices are built on first use and live
//! until `invalidate`, `invalidate_field` or `reload` drops them.

pub mod field_index;

pub use field_index::{FieldIndex, Snap};

use crate::config::CacheConfig;
use crate::error::{RemyError, Result};
use crate::notecard::Notecard;
use crate::parser::field_value::FieldParser;
use crate::parser::notecard::scan_path;
use crate::query::ast::Node;
use crate::query::eval::{self, FieldIndices};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Scanned notecards of one location.
pub struct NotecardCache {
    root: PathBuf,
    config: CacheConfig,
    cards: Vec<Notecard>,
    /// Every label, primary or not, to its card's position in `cards`.
    by_label: HashMap<String, usize>,
    parsers: HashMap<String, Box<dyn FieldParser>>,
    indices: HashMap<String, FieldIndex>,
}

impl NotecardCache {
    /// Scan `root` using the `.remy.toml` found there.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = CacheConfig::load(&root)?;
        Self::with_config(root, config)
    }

    /// Scan `root` with an explicit configuration.
    pub fn with_config(root: impl Into<PathBuf>, config: CacheConfig) -> Result<Self> {
        let root = root.into();
        let cards = scan_path(&root)?;
        let cache = Self::from_cards(root, config, cards)?;
        info!(root = %cache.root.display(), cards = cache.len(), "opened notecard cache");
        Ok(cache)
    }

    /// Build a cache from cards already in memory.
    ///
    /// Fails if any label is used twice.
    pub fn from_cards(
        root: impl Into<PathBuf>,
        config: CacheConfig,
        cards: Vec<Notecard>,
    ) -> Result<Self> {
        let by_label = label_map(&cards)?;
        let parsers = config
            .fields
            .iter()
            .map(|(name, parser)| (name.clone(), Box::new(*parser) as Box<dyn FieldParser>))
            .collect();
        Ok(Self {
            root: root.into(),
            config,
            cards,
            by_label,
            parsers,
            indices: HashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Cards in scan order.
    pub fn cards(&self) -> &[Notecard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn primary_labels(&self) -> BTreeSet<&str> {
        self.cards.iter().map(Notecard::primary_label).collect()
    }

    /// Card carrying `label` as any of its labels.
    pub fn find_card_by_label(&self, label: &str) -> Option<&Notecard> {
        self.by_label.get(label).map(|&i| &self.cards[i])
    }

    pub fn to_primary_label(&self, label: &str) -> Option<&str> {
        self.find_card_by_label(label).map(Notecard::primary_label)
    }

    /// Reference URLs by primary label, for cards that have any.
    pub fn references(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for card in &self.cards {
            for url in card.references() {
                out.entry(card.primary_label().to_string())
                    .or_default()
                    .insert(url);
            }
        }
        out
    }

    /// Names of every field with a parser, sorted.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.parsers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Install or replace the parser for a field, dropping its index.
    pub fn set_parser(&mut self, name: &str, parser: impl FieldParser + 'static) {
        let upper = name.to_uppercase();
        self.indices.remove(&upper);
        self.parsers.insert(upper, Box::new(parser));
    }

    /// Index for one field, built on first use.
    pub fn field_index(&mut self, name: &str) -> Result<&FieldIndex> {
        let upper = name.to_uppercase();
        self.ensure_index(&upper)
            .ok_or(RemyError::UnknownField(upper))
    }

    /// Indices for several fields. Names without a parser are skipped.
    pub fn field_indices<I, S>(&mut self, names: I) -> FieldIndices<'_>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut wanted = Vec::new();
        for name in names {
            let upper = name.as_ref().to_uppercase();
            if self.ensure_index(&upper).is_some() {
                wanted.push(upper);
            }
        }
        let indices = &self.indices;
        wanted
            .into_iter()
            .filter_map(|name| indices.get(&name).map(|index| (name, index)))
            .collect()
    }

    /// Evaluate a parsed query against this cache.
    pub fn query(&mut self, node: &Node) -> Result<BTreeSet<String>> {
        let indices = self.field_indices(node.field_names());
        eval::evaluate(node, &indices)
    }

    /// Drop every built index.
    pub fn invalidate(&mut self) {
        debug!(count = self.indices.len(), "dropping field indices");
        self.indices.clear();
    }

    pub fn invalidate_field(&mut self, name: &str) {
        self.indices.remove(&name.to_uppercase());
    }

    /// Rescan the source and drop every index. Parsers are kept.
    pub fn reload(&mut self) -> Result<()> {
        let cards = scan_path(&self.root)?;
        self.by_label = label_map(&cards)?;
        self.cards = cards;
        self.invalidate();
        info!(root = %self.root.display(), cards = self.cards.len(), "reloaded notecard cache");
        Ok(())
    }

    fn ensure_index(&mut self, upper: &str) -> Option<&FieldIndex> {
        if !self.indices.contains_key(upper) {
            let parser = self.parsers.get(upper)?;
            let index = FieldIndex::build(upper, parser.as_ref(), &self.cards);
            self.indices.insert(upper.to_string(), index);
        }
        self.indices.get(upper)
    }
}

fn label_map(cards: &[Notecard]) -> Result<HashMap<String, usize>> {
    let mut by_label = HashMap::new();
    for (i, card) in cards.iter().enumerate() {
        for label in &card.labels {
            if by_label.insert(label.clone(), i).is_some() {
                return Err(RemyError::DuplicateLabel {
                    label: label.clone(),
                    path: card.source.clone(),
                    line: card.line,
                });
            }
        }
    }
    Ok(by_label)
}
