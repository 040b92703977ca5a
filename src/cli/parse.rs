//! CLI parse: clap types for Scriptorium. No behavior; definitions only.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Scriptorium CLI - Federated search over a text corpus store
#[derive(Parser)]
#[command(name = "scriptorium")]
#[command(about = "Query federation and entity resolution over a text corpus document store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search lemmata, texts or sentences
    Search {
        #[command(subcommand)]
        command: SearchCommands,
    },
    /// Fetch one document by type tag and id
    Get {
        /// Type tag (lemma, text, ths, ...)
        type_tag: String,
        /// Document id
        id: String,
        /// Also fetch every object the document references
        #[arg(long)]
        related: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Texts attesting a lemma, nested by dating period
    Attestations {
        /// Lemma id
        lemma_id: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Paging and output flags shared by every search
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Zero-based page number
    #[arg(long, default_value = "0")]
    pub page: usize,
    /// Page size (defaults to federation.default_page_size)
    #[arg(long)]
    pub size: Option<usize>,
    /// Sort as `field_asc` or `field_desc`
    #[arg(long)]
    pub sort: Option<String>,
    /// Fetch every object the hits reference
    #[arg(long)]
    pub related: bool,
    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Subcommand)]
pub enum SearchCommands {
    /// Search the lemma dictionary
    Lemma {
        /// Name prefix or words
        #[arg(long)]
        name: Option<String>,
        /// Translation words
        #[arg(long)]
        translation: Option<String>,
        /// Translation languages (repeatable); all when omitted
        #[arg(long = "lang")]
        languages: Vec<String>,
        /// Lemma type
        #[arg(long = "type")]
        doc_type: Option<String>,
        #[arg(long)]
        subtype: Option<String>,
        /// Passport filter `field=value[,value...]` (repeatable)
        #[arg(long)]
        passport: Vec<String>,
        #[command(flatten)]
        args: SearchArgs,
    },
    /// Search texts
    Text {
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        doc_type: Option<String>,
        #[arg(long)]
        subtype: Option<String>,
        #[arg(long)]
        passport: Vec<String>,
        /// Only texts with a sentence attesting this lemma id
        #[arg(long)]
        containing_lemma: Option<String>,
        #[command(flatten)]
        args: SearchArgs,
    },
    /// Search sentences
    Sentence {
        /// Only sentences with a token of this lemma id
        #[arg(long)]
        lemma: Option<String>,
        /// Only sentences of texts of this type
        #[arg(long)]
        text_type: Option<String>,
        /// Only sentences of texts with a sentence attesting this lemma id
        #[arg(long)]
        text_containing_lemma: Option<String>,
        #[command(flatten)]
        args: SearchArgs,
    },
    /// Run a search command read from a JSON file
    File {
        path: PathBuf,
        #[command(flatten)]
        args: SearchArgs,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Validate the effective configuration
    Validate,
}
