//! Remy - a library for querying archives of labeled notecards.
//!
//! # Overview
//!
//! A notecard archive is a directory of text files. Each `NOTECARD label ...`
//! line starts a card; `:FIELD: value` lines inside a card are typed metadata.
//! Remy provides:
//! - Scanning of notecard files into [`Notecard`] records
//! - Per-field sorted indices with range queries
//! - A small filter language with boolean composition and calendar-aware
//!   date arithmetic
//!
//! # Example
//!
//! ```no_run
//! use remy::{parse_query, NotecardCache};
//!
//! let mut cache = NotecardCache::open("/path/to/notes").unwrap();
//! let query = parse_query("tag = 'inbox' AND due <= 'today + 1 week'::date").unwrap();
//! for label in cache.query(&query).unwrap() {
//!     println!("{}", label);
//! }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod notecard;
pub mod parser;
pub mod query;

// Re-export main types at crate root
pub use cache::{FieldIndex, NotecardCache, Snap};
pub use config::{CacheConfig, UserConfig};
pub use error::{RemyError, Result};
pub use notecard::Notecard;
pub use parser::{FieldParser, ValueParser};
pub use query::{evaluate, parse_query, parse_query_at, Node, Value};
