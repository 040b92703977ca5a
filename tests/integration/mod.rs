//! Integration tests for the Scriptorium query federation engine

mod attestation_tree;
mod config_loading;
mod document_related;
mod federation_join;
mod search_paging;
mod test_utils;
