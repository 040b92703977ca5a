//! CLI route: single route table and run context. Dispatches to the corpus service and presentation.

use crate::cli::command_name;
use crate::cli::parse::{Commands, ConfigCommands, SearchArgs, SearchCommands};
use crate::cli::presentation::{
    format_attestations_text, format_config_text, format_envelope_text, format_search_text,
    to_json,
};
use crate::config::{ConfigLoader, EngineConfig};
use crate::error::{EngineError, StoreError};
use crate::federation::CancellationFlag;
use crate::query::Page;
use crate::search::{
    LemmaSearch, PassportFilter, SearchCommand, SentenceSearch, TextSearch, TranslationSpec,
};
use crate::service::{CorpusService, SearchOptions};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{info, info_span, warn};

/// Runtime context for CLI execution: effective config, corpus service and async runtime.
pub struct RunContext {
    service: CorpusService,
    config: EngineConfig,
    runtime: Runtime,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, EngineError> {
        let config = match config_path {
            Some(ref cfg_path) => ConfigLoader::load_from_file(cfg_path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        validate_config(&config)?;
        let runtime = build_runtime()?;
        let service = CorpusService::open(&config)?;
        Ok(Self {
            service,
            config,
            runtime,
        })
    }

    /// Run context over an already opened service
    pub fn with_service(service: CorpusService, config: EngineConfig) -> Result<Self, EngineError> {
        Ok(Self {
            service,
            config,
            runtime: build_runtime()?,
        })
    }

    pub fn service(&self) -> &CorpusService {
        &self.service
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, EngineError> {
        let name = command_name(command);
        let _span = info_span!("command", name = %name).entered();
        let started = Instant::now();
        let result = self.execute_inner(command);
        info!(
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, EngineError> {
        match command {
            Commands::Search { command } => self.handle_search(command),
            Commands::Get {
                type_tag,
                id,
                related,
                format,
            } => self.handle_get(type_tag, id, *related, format),
            Commands::Attestations { lemma_id, format } => {
                let attestations = self.run_cancellable(|cancel| {
                    self.service.lemma_attestations(lemma_id, Some(cancel))
                })?;
                if format == "json" {
                    to_json(&attestations)
                } else {
                    Ok(format_attestations_text(&attestations))
                }
            }
            Commands::Config { command } => match command {
                ConfigCommands::Show { format } => {
                    if format == "json" {
                        to_json(&self.config)
                    } else {
                        format_config_text(&self.config)
                    }
                }
                ConfigCommands::Validate => {
                    validate_config(&self.config)?;
                    Ok("Configuration is valid".to_string())
                }
            },
        }
    }

    fn handle_search(&self, command: &SearchCommands) -> Result<String, EngineError> {
        let (search, args) = build_search_command(command)?;
        let page = Page::of(
            args.page,
            args.size.unwrap_or(self.config.federation.default_page_size),
        );
        let options = SearchOptions {
            hydrate_related: args.related,
        };
        let outcome = self.run_cancellable(|cancel| {
            self.service.search(&search, page, options, Some(cancel))
        })?;
        if args.format == "json" {
            to_json(&outcome)
        } else {
            Ok(format_search_text(&outcome))
        }
    }

    fn handle_get(
        &self,
        type_tag: &str,
        id: &str,
        related: bool,
        format: &str,
    ) -> Result<String, EngineError> {
        let envelope = if related {
            self.runtime
                .block_on(self.service.get_with_related(type_tag, id))?
        } else {
            self.runtime
                .block_on(self.service.get_document(type_tag, id))?
                .map(|document| crate::service::DocumentEnvelope {
                    document,
                    related: Default::default(),
                })
        };
        match envelope {
            Some(envelope) if format == "json" => to_json(&envelope),
            Some(envelope) => Ok(format_envelope_text(&envelope)),
            None => Err(EngineError::InvalidCommand(format!(
                "no {} document with id '{}'",
                type_tag, id
            ))),
        }
    }

    /// Block on `make(flag)`; Ctrl-C sets the flag so in-flight queries are abandoned
    fn run_cancellable<F, T>(&self, make: impl FnOnce(CancellationFlag) -> F) -> T
    where
        F: Future<Output = T>,
    {
        let flag = CancellationFlag::new();
        let watcher = flag.clone();
        self.runtime.block_on(async move {
            let interrupt = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling query resolution");
                    watcher.cancel();
                }
            });
            let output = make(flag).await;
            interrupt.abort();
            output
        })
    }
}

fn build_runtime() -> Result<Runtime, EngineError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| EngineError::Store(StoreError::IoError(e)))
}

fn validate_config(config: &EngineConfig) -> Result<(), EngineError> {
    config.validate().map_err(|errors| {
        EngineError::ConfigError(
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    })
}

/// Translate CLI flags into a search command plus the shared paging/output flags
pub(crate) fn build_search_command(
    command: &SearchCommands,
) -> Result<(SearchCommand, &SearchArgs), EngineError> {
    let search = match command {
        SearchCommands::Lemma {
            name,
            translation,
            languages,
            doc_type,
            subtype,
            passport,
            args,
        } => SearchCommand::Lemma(LemmaSearch {
            name: name.clone(),
            translation: translation.as_ref().map(|text| TranslationSpec {
                text: text.clone(),
                languages: languages.clone(),
            }),
            doc_type: doc_type.clone(),
            subtype: subtype.clone(),
            passport: parse_passport_filters(passport)?,
            sort: args.sort.clone(),
        }),
        SearchCommands::Text {
            name,
            doc_type,
            subtype,
            passport,
            containing_lemma,
            args,
        } => SearchCommand::Text(TextSearch {
            name: name.clone(),
            doc_type: doc_type.clone(),
            subtype: subtype.clone(),
            passport: parse_passport_filters(passport)?,
            containing_lemma: containing_lemma.clone(),
            sort: args.sort.clone(),
        }),
        SearchCommands::Sentence {
            lemma,
            text_type,
            text_containing_lemma,
            args,
        } => {
            let text = (text_type.is_some() || text_containing_lemma.is_some()).then(|| TextSearch {
                doc_type: text_type.clone(),
                containing_lemma: text_containing_lemma.clone(),
                ..TextSearch::default()
            });
            SearchCommand::Sentence(SentenceSearch {
                lemma: lemma.clone(),
                text,
                sort: args.sort.clone(),
            })
        }
        SearchCommands::File { path, args } => {
            let mut search = read_search_file(path)?;
            if let Some(sort) = &args.sort {
                override_sort(&mut search, sort);
            }
            search
        }
    };
    let args = match command {
        SearchCommands::Lemma { args, .. }
        | SearchCommands::Text { args, .. }
        | SearchCommands::Sentence { args, .. }
        | SearchCommands::File { args, .. } => args,
    };
    Ok((search, args))
}

fn read_search_file(path: &Path) -> Result<SearchCommand, EngineError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        EngineError::InvalidCommand(format!("cannot read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        EngineError::InvalidCommand(format!("{} is not a search command: {}", path.display(), e))
    })
}

fn override_sort(search: &mut SearchCommand, sort: &str) {
    let slot = match search {
        SearchCommand::Lemma(s) => &mut s.sort,
        SearchCommand::Text(s) => &mut s.sort,
        SearchCommand::Sentence(s) => &mut s.sort,
    };
    *slot = Some(sort.to_string());
}

/// `field=value[,value...]`
pub(crate) fn parse_passport_filters(raw: &[String]) -> Result<Vec<PassportFilter>, EngineError> {
    raw.iter()
        .map(|entry| {
            let (field, values) = entry.split_once('=').ok_or_else(|| {
                EngineError::InvalidCommand(format!(
                    "passport filter '{}' must look like field=value[,value...]",
                    entry
                ))
            })?;
            let values: Vec<&str> = values
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .collect();
            if field.trim().is_empty() || values.is_empty() {
                return Err(EngineError::InvalidCommand(format!(
                    "passport filter '{}' needs a field and at least one value",
                    entry
                )));
            }
            Ok(PassportFilter::new(field.trim(), values))
        })
        .collect()
}
