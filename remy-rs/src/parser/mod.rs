//! Parsers for notecard files and field content.

pub mod content;
pub mod field_value;
pub mod notecard;

pub use content::{parse_content, parse_fields, parse_references, ContentNode};
pub use field_value::{FieldParser, ValueParser};
pub use notecard::{parse_notecards, scan_file, scan_path};
