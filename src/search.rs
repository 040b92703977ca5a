//! Search commands and their mapping into federated query graphs.

pub mod command;
pub mod mapping;

pub use command::{
    LemmaSearch, PassportFilter, SearchCommand, SentenceSearch, TextSearch, TranslationSpec,
};
pub use mapping::{to_graph, MappingSettings};
