//! Attestation presentation: indented period tree with counts.

use crate::attestation::NestedAttestation;
use crate::service::LemmaAttestations;
use owo_colors::OwoColorize;

pub fn format_attestations_text(attestations: &LemmaAttestations) -> String {
    let mut out = format!(
        "{} {}: {} texts\n",
        "Attestations of".bold(),
        attestations.lemma_id.bold(),
        attestations.text_count
    );
    match &attestations.tree {
        Some(tree) => write_node(&mut out, tree, 0),
        None => out.push_str("No dated attestations.\n"),
    }
    for failure in &attestations.failures {
        out.push_str(&format!(
            "{} {} [{}]: {}\n",
            "unresolved".red(),
            failure.type_tag,
            failure.ids.join(", "),
            failure.message
        ));
    }
    out.trim_end().to_string()
}

fn write_node(out: &mut String, node: &NestedAttestation, depth: usize) {
    let indent = "  ".repeat(depth);
    match &node.period {
        Some(period) => {
            let label = period.reference.name().unwrap_or(period.reference.id());
            let span = match (period.begin, period.end) {
                (Some(begin), Some(end)) => format!(" [{}..{}]", begin, end),
                (Some(begin), None) => format!(" [{}..]", begin),
                (None, Some(end)) => format!(" [..{}]", end),
                (None, None) => String::new(),
            };
            out.push_str(&format!(
                "{}{}{}: {} ({} total)\n",
                indent, label, span, node.count, node.total
            ));
        }
        None => out.push_str(&format!("{}{} total\n", indent, node.total)),
    }
    for child in &node.children {
        write_node(out, child, depth + 1);
    }
}
