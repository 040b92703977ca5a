//! Layered configuration and the CLI run context built from it

use super::test_utils::{load_corpus, memory_config, service_over, RecordingStore};
use clap::Parser;
use scriptorium::cli::{Cli, RunContext};
use scriptorium::config::{ConfigLoader, StoreBackend};
use scriptorium::service::CorpusService;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Serializes tests that touch process environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    fn set(vars: &[(&'static str, &str)]) -> Self {
        let saved = vars
            .iter()
            .map(|(key, value)| {
                let previous = std::env::var(key).ok();
                std::env::set_var(key, value);
                (*key, previous)
            })
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..) {
            match previous {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn write(path: &std::path::Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[test]
fn test_layer_precedence_global_workspace_env() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let home = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    write(
        &home.path().join(".config/scriptorium/config.toml"),
        "[federation]\ndefault_page_size = 10\nfacet_size = 7\n\n[store]\nbackend = \"http\"\n",
    );
    write(
        &workspace.path().join("config/config.toml"),
        "[federation]\ndefault_page_size = 25\n",
    );
    write(
        &workspace.path().join("config/staging.toml"),
        "[store]\nbackend = \"memory\"\n",
    );

    let _env = EnvGuard::set(&[
        ("HOME", home.path().to_str().unwrap()),
        ("SCRIPTORIUM_ENV", "staging"),
        ("SCRIPTORIUM__FEDERATION__MAX_CONCURRENT_QUERIES", "3"),
    ]);

    let config = ConfigLoader::load(workspace.path()).unwrap();
    assert_eq!(config.federation.facet_size, 7, "global file");
    assert_eq!(config.federation.default_page_size, 25, "workspace file");
    assert_eq!(config.store.backend, StoreBackend::Memory, "environment file");
    assert_eq!(config.federation.max_concurrent_queries, 3, "environment variable");
    assert_eq!(config.federation.id_aggregation_size, 100_000, "default");
}

#[test]
fn test_run_context_rejects_invalid_config() {
    let workspace = TempDir::new().unwrap();
    let path = workspace.path().join("bad.toml");
    write(
        &path,
        "[store]\nbackend = \"memory\"\n\n[federation]\nmax_concurrent_queries = 0\n",
    );
    let err = RunContext::new(workspace.path().to_path_buf(), Some(path))
        .err()
        .expect("invalid config");
    assert!(err.to_string().contains("max_concurrent_queries"));
}

#[test]
fn test_run_context_over_memory_backend_reports_config() {
    let workspace = TempDir::new().unwrap();
    let path = workspace.path().join("memory.toml");
    write(&path, "[store]\nbackend = \"memory\"\n");

    let context = RunContext::new(workspace.path().to_path_buf(), Some(path)).unwrap();
    let cli = Cli::try_parse_from(["scriptorium", "config", "validate"]).unwrap();
    assert_eq!(context.execute(&cli.command).unwrap(), "Configuration is valid");

    let cli = Cli::try_parse_from(["scriptorium", "config", "show", "--format", "json"]).unwrap();
    let shown: serde_json::Value = serde_json::from_str(&context.execute(&cli.command).unwrap()).unwrap();
    assert_eq!(shown["store"]["backend"], "memory");
}

fn corpus_context() -> RunContext {
    let store = Arc::new(RecordingStore::new());
    load_corpus(store.memory());
    let config = memory_config();
    let service: CorpusService = service_over(store, &config);
    RunContext::with_service(service, config).unwrap()
}

#[test]
fn test_cli_search_renders_json_page() {
    let context = corpus_context();
    let cli = Cli::try_parse_from([
        "scriptorium",
        "search",
        "text",
        "--containing-lemma",
        "L1",
        "--format",
        "json",
    ])
    .unwrap();
    let output: serde_json::Value =
        serde_json::from_str(&context.execute(&cli.command).unwrap()).unwrap();
    assert_eq!(output["results"]["page"]["total_elements"], 2);
    assert_eq!(output["results"]["items"][0]["id"], "T1");
}

#[test]
fn test_cli_attestations_text_output() {
    let context = corpus_context();
    let cli = Cli::try_parse_from(["scriptorium", "attestations", "L1"]).unwrap();
    let output = context.execute(&cli.command).unwrap();
    assert!(output.contains("Middle Kingdom [-2055..-1650]: 0 (2 total)"));
    assert!(output.contains("  Dyn. 12 [-1976..-1794]: 1 (1 total)"));
}

#[test]
fn test_cli_get_unknown_document_fails() {
    let context = corpus_context();
    let cli = Cli::try_parse_from(["scriptorium", "get", "lemma", "L999"]).unwrap();
    let err = context.execute(&cli.command).unwrap_err();
    assert!(scriptorium::cli::map_error(&err).contains("L999"));
}
