//! Document presentation.

use super::search::format_related;
use super::shared::or_dash;
use crate::document::Document;
use crate::service::DocumentEnvelope;
use owo_colors::OwoColorize;

pub fn format_document_text(document: &Document) -> String {
    let mut lines = vec![
        format!("{} {}", document.kind.bold(), document.id.bold()),
        format!("  Name:    {}", or_dash(document.name.as_deref())),
        format!("  Type:    {}", or_dash(document.doc_type.as_deref())),
        format!("  Subtype: {}", or_dash(document.subtype.as_deref())),
    ];
    if let Some(relations) = &document.relations {
        for predicate in relations.predicates() {
            let targets: Vec<&str> = relations.get(predicate).iter().map(|r| r.id()).collect();
            lines.push(format!("  {} -> {}", predicate, targets.join(", ")));
        }
    }
    for (i, path) in document.paths.iter().enumerate() {
        let segments: Vec<&str> = path.segments().iter().map(|r| r.id()).collect();
        lines.push(format!("  Path {}: {}", i + 1, segments.join(" / ")));
    }
    lines.join("\n")
}

pub fn format_envelope_text(envelope: &DocumentEnvelope) -> String {
    let mut out = format_document_text(&envelope.document);
    if !envelope.related.is_empty() {
        out.push_str(&format!("\n\n{}\n", "Related".bold().underline()));
        out.push_str(&format_related(&envelope.related));
    }
    out.trim_end().to_string()
}
