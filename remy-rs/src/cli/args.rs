//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "remy")]
#[command(author, version, about = "A CLI for notecard archives", long_about = None)]
pub struct Cli {
    /// Notecard cache location, a path or file:// URL
    #[arg(long, global = true, env = "REMY_CACHE")]
    pub cache: Option<String>,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (can be repeated)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Notecard or delimited text
    #[default]
    Raw,
    /// JSON array
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Query and filter notecards
    Query(QueryArgs),

    /// Manage and inspect notecard field indices
    #[command(subcommand)]
    Index(IndexCommands),
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Query expression, e.g. "tag = 'inbox' AND priority >= 2"
    pub expression: Option<String>,

    /// Query expression (used when no positional expression is given)
    #[arg(long = "where", value_name = "EXPR")]
    pub where_clause: Option<String>,

    /// Return every notecard, ignoring any expression
    #[arg(long)]
    pub all: bool,

    /// Output format
    #[arg(long, value_enum, ignore_case = true, default_value_t = OutputFormat::Raw)]
    pub format: OutputFormat,

    /// Indent JSON output
    #[arg(long)]
    pub pretty_print: bool,

    /// Sort by primary label ("id") or by a field's smallest value
    #[arg(long, value_name = "FIELD")]
    pub order_by: Option<String>,

    /// Reverse the sort order
    #[arg(long)]
    pub reverse: bool,

    /// Maximum number of notecards to print
    #[arg(short, long)]
    pub limit: Option<usize>,
}

impl QueryArgs {
    /// The expression to evaluate, if any.
    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref().or(self.where_clause.as_deref())
    }
}

#[derive(Subcommand, Debug)]
pub enum IndexCommands {
    /// List configured field names
    List(IndexListArgs),

    /// Print the entries of one field index
    Dump(IndexDumpArgs),
}

#[derive(Args, Debug)]
pub struct IndexListArgs {
    /// Output format
    #[arg(long, value_enum, ignore_case = true, default_value_t = OutputFormat::Raw)]
    pub format: OutputFormat,

    /// Indent JSON output
    #[arg(long)]
    pub pretty_print: bool,
}

#[derive(Args, Debug)]
pub struct IndexDumpArgs {
    /// Field name (case-insensitive)
    pub field: String,

    /// Print labels only
    #[arg(long, conflicts_with = "values")]
    pub labels: bool,

    /// Print values only
    #[arg(long)]
    pub values: bool,

    /// Drop repeated rows
    #[arg(long)]
    pub unique: bool,

    /// Column delimiter: comma, tab, pipe, or a single character
    #[arg(short, long, default_value = "comma")]
    pub delimiter: String,

    /// Output format
    #[arg(long, value_enum, ignore_case = true, default_value_t = OutputFormat::Raw)]
    pub format: OutputFormat,

    /// Indent JSON output
    #[arg(long)]
    pub pretty_print: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_args() {
        let cli = Cli::try_parse_from([
            "remy", "--cache", "/notes", "query", "tag = 'x'", "--format", "JSON", "-l", "2",
        ])
        .unwrap();
        assert_eq!(cli.cache.as_deref(), Some("/notes"));
        match cli.command {
            Commands::Query(args) => {
                assert_eq!(args.expression(), Some("tag = 'x'"));
                assert_eq!(args.format, OutputFormat::Json);
                assert_eq!(args.limit, Some(2));
            }
            other => panic!("Expected Query, got {:?}", other),
        }
    }

    #[test]
    fn test_where_flag() {
        let cli = Cli::try_parse_from(["remy", "query", "--where", "a = 1"]).unwrap();
        match cli.command {
            Commands::Query(args) => assert_eq!(args.expression(), Some("a = 1")),
            other => panic!("Expected Query, got {:?}", other),
        }
    }

    #[test]
    fn test_dump_labels_conflicts_with_values() {
        let result = Cli::try_parse_from(["remy", "index", "dump", "TAG", "--labels", "--values"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_level() {
        let cli = Cli::try_parse_from(["remy", "-vv", "index", "list"]).unwrap();
        assert_eq!(cli.log_level(), "debug");
        let cli = Cli::try_parse_from(["remy", "-q", "index", "list"]).unwrap();
        assert_eq!(cli.log_level(), "error");
    }
}
