//! CLI command-name contract for logging.

use crate::cli::parse::{Commands, ConfigCommands, SearchCommands};

/// Command name string for log spans (e.g. "search.lemma", "config.show").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Search { command } => format!("search.{}", search_command_name(command)),
        Commands::Get { .. } => "get".to_string(),
        Commands::Attestations { .. } => "attestations".to_string(),
        Commands::Config { command } => format!("config.{}", config_command_name(command)),
    }
}

pub fn search_command_name(command: &SearchCommands) -> &'static str {
    match command {
        SearchCommands::Lemma { .. } => "lemma",
        SearchCommands::Text { .. } => "text",
        SearchCommands::Sentence { .. } => "sentence",
        SearchCommands::File { .. } => "file",
    }
}

pub fn config_command_name(command: &ConfigCommands) -> &'static str {
    match command {
        ConfigCommands::Show { .. } => "show",
        ConfigCommands::Validate => "validate",
    }
}
