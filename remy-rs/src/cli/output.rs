//! Output formatting for CLI commands.

use crate::cli::args::OutputFormat;
use crate::error::Result;
use serde::Serialize;

/// Helper for formatting and printing output.
pub struct Output {
    format: OutputFormat,
    pretty: bool,
}

impl Output {
    pub fn new(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Serialize a value as JSON, indented when `--pretty-print` is set.
    pub fn render_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(text)
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", self.render_json(value)?);
        Ok(())
    }

    /// Print raw text as is, adding a final newline only if missing.
    pub fn print_raw(&self, text: &str) {
        if text.is_empty() || text.ends_with('\n') {
            print!("{}", text);
        } else {
            println!("{}", text);
        }
    }
}
