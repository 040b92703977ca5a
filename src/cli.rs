//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to the corpus service.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands, SearchArgs, SearchCommands};
pub use presentation::{
    format_attestations_text, format_config_text, format_document_text, format_envelope_text,
    format_search_text, to_json,
};
pub use route::RunContext;
