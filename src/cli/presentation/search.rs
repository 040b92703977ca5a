//! Search presentation: hit table, paging line, facets and related objects.

use super::shared::or_dash;
use crate::document::Document;
use crate::service::{RelatedObjects, SearchOutcome};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;

pub fn format_search_text(outcome: &SearchOutcome) -> String {
    let results = &outcome.results;
    let page = &results.page;
    let mut out = format!(
        "{} (page {} of {}, {} hits)\n",
        "Results".bold().underline(),
        page.number + 1,
        page.total_pages,
        page.total_elements
    );

    if results.items.is_empty() {
        out.push_str("No matches.\n");
    } else {
        out.push_str(&document_table(&results.items).to_string());
        out.push('\n');
    }

    for (name, buckets) in &results.facets {
        let values: Vec<String> = buckets
            .iter()
            .map(|(key, count)| format!("{} ({})", key, count))
            .collect();
        out.push_str(&format!("\n{}: {}", name.bold(), values.join(", ")));
    }

    if !outcome.related.is_empty() {
        out.push_str(&format!("\n\n{}\n", "Related".bold().underline()));
        out.push_str(&format_related(&outcome.related));
    }
    out.trim_end().to_string()
}

pub(super) fn document_table(documents: &[Document]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Name", "Type", "Subtype"]);
    for document in documents {
        table.add_row(vec![
            document.id.as_str(),
            or_dash(document.name.as_deref()),
            or_dash(document.doc_type.as_deref()),
            or_dash(document.subtype.as_deref()),
        ]);
    }
    table
}

pub(super) fn format_related(related: &RelatedObjects) -> String {
    let mut out = String::new();
    for (type_tag, documents) in &related.objects {
        let names: Vec<String> = documents
            .iter()
            .map(|d| match d.name.as_deref() {
                Some(name) => format!("{} ({})", d.id, name),
                None => d.id.clone(),
            })
            .collect();
        out.push_str(&format!("  {}: {}\n", type_tag, names.join(", ")));
    }
    for failure in &related.failures {
        out.push_str(&format!(
            "  {} {} [{}]: {}\n",
            "unresolved".red(),
            failure.type_tag,
            failure.ids.join(", "),
            failure.message
        ));
    }
    out
}
