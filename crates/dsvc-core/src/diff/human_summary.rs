//! Human-readable summary renderer for item diffs.

use crate::diff::model::ItemDiff;

/// One side of a comparison as shown to a reader.
#[derive(Debug, Clone, Copy)]
pub struct SideLabel<'a> {
    /// Reference as the caller gave it (`draft`, a tag, or a hash)
    pub label: &'a str,
    /// Resolved version hash, `None` for the draft
    pub version_hash: Option<&'a str>,
}

/// Render a Markdown/text summary of an [`ItemDiff`] between two references.
///
/// Informational only; the structured diff is the source of truth.
pub fn render_comparison_summary(from: SideLabel<'_>, to: SideLabel<'_>, diff: &ItemDiff) -> String {
    let mut out = String::new();
    let stats = diff.statistics();

    out.push_str("## Dataset Comparison\n\n");
    out.push_str(&format!(
        "| | Reference | Version |\n\
         |---|---|---|\n\
         | From | `{}` | `{}` |\n\
         | To | `{}` | `{}` |\n\n",
        from.label,
        side_hash(&from),
        to.label,
        side_hash(&to),
    ));

    out.push_str(&format!(
        "**Added**: {}  \n**Modified**: {}  \n**Deleted**: {}  \n**Unchanged**: {}\n\n",
        stats.items_added, stats.items_modified, stats.items_deleted, stats.items_unchanged
    ));

    if diff.is_empty() {
        out.push_str("_No item changes detected._\n");
        return out;
    }

    push_section(&mut out, "Added Items", &diff.added);
    push_section(&mut out, "Modified Items", &diff.modified);
    push_section(&mut out, "Deleted Items", &diff.deleted);

    out
}

fn push_section(out: &mut String, title: &str, keys: &[String]) {
    if keys.is_empty() {
        return;
    }
    out.push_str(&format!("### {} ({})\n\n", title, keys.len()));
    for key in keys {
        out.push_str(&format!("- `{}`\n", key));
    }
    out.push('\n');
}

fn side_hash(side: &SideLabel<'_>) -> String {
    side.version_hash
        .map(short)
        .unwrap_or_else(|| "draft".to_string())
}

/// First 12 characters of a hash
fn short(hash: &str) -> String {
    hash.chars().take(12).collect()
}
