//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the encoding/inference code stays clean and testable
//! - output changes are localized

use crate::artifacts::EncodingArtifacts;
use crate::domain::BatchOutcome;
use crate::report::BatchSummary;

/// Describe a loaded artifact bundle (`price inspect`).
pub fn format_bundle_summary(artifacts: &EncodingArtifacts) -> String {
    let manifest = artifacts.manifest();
    let layout = artifacts.layout();
    let encoders = artifacts.encoders();
    let forest = artifacts.forest();
    let scaler = artifacts.scaler();

    let mut out = String::new();

    out.push_str("=== price - artifact bundle ===\n");
    match artifacts.source() {
        Some(path) => out.push_str(&format!("Bundle: {}\n", path.display())),
        None => out.push_str("Bundle: (in memory)\n"),
    }
    out.push_str(&format!("Format version: {}\n", manifest.format_version));
    out.push_str(&format!("Brand encoding: {}\n", manifest.brand_encoding.display_name()));
    out.push_str(&format!("Target transform: {:?}\n", manifest.target_transform));

    out.push_str("\nFeatures:\n");
    out.push_str(&format!("- columns: {}\n", layout.len()));
    let slots = layout.slots();
    let names = &manifest.slots;
    for (label, name, position) in [
        ("engine_capacity", &names.engine_capacity, slots.engine_capacity),
        ("mileage", &names.mileage, slots.mileage),
        ("age", &names.age, slots.age),
        ("spare_key", &names.spare_key, slots.spare_key),
        ("model", &names.model, slots.model),
        ("brand", &names.brand, slots.brand),
    ] {
        let resolved = match position {
            Some(i) => format!("`{name}` at {i}"),
            None => "not used".to_string(),
        };
        out.push_str(&format!("- {label:<16} {resolved}\n"));
    }
    for (field, n) in layout.indicator_counts() {
        out.push_str(&format!("- {:<16} {n} indicator column(s)\n", format!("{}_*", field.prefix())));
    }

    out.push_str("\nEncoders:\n");
    out.push_str(&format!("- model target means: {}\n", encoders.model.len()));
    match &encoders.brand {
        Some(brand) => out.push_str(&format!("- brand target means: {}\n", brand.len())),
        None => out.push_str("- brand target means: none\n"),
    }
    out.push_str(&format!("- global mean: {:.2}\n", artifacts.global_mean()));
    out.push_str(&format!(
        "- scaler: {} over [{}]\n",
        scaler.spec().kind_name(),
        scaler.columns().join(", ")
    ));

    out.push_str("\nModel:\n");
    out.push_str(&format!("- trees: {}\n", forest.n_trees()));
    out.push_str(&format!("- nodes: {}\n", forest.n_nodes()));
    out.push_str(&format!("- base score: {}\n", forest.base_score()));

    out
}

/// Format the batch counts, price range and the most common failures.
pub fn format_batch_summary(summary: &BatchSummary) -> String {
    let mut out = String::new();

    out.push_str("=== price - batch ===\n");
    out.push_str(&format!(
        "Rows: read={} | ok={} | failed={} | unreadable={}\n",
        summary.rows_read, summary.succeeded, summary.failed, summary.unreadable
    ));

    if let (Some(min), Some(median), Some(max)) = (summary.price_min, summary.price_median, summary.price_max) {
        out.push_str(&format!("Price: min={min:.2} | median={median:.2} | max={max:.2}\n"));
    }

    if !summary.failure_reasons.is_empty() {
        out.push_str("\nFailures:\n");
        for (reason, n) in summary.failure_reasons.iter().take(5) {
            out.push_str(&format!("{n:>6}  {}\n", truncate(reason, 72)));
        }
    }

    out
}

/// Per-row table of the first `limit` outcomes.
pub fn format_outcomes_table(outcomes: &[BatchOutcome], limit: usize) -> String {
    let mut out = String::new();
    out.push_str(format!("{:<6} {:<12} {:<24} {:>12} {:<40}", "line", "id", "listing", "price", "error").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<6} {:-<12} {:-<24} {:-<12} {:-<40}", "", "", "", "", "").trim_end());
    out.push('\n');

    for o in outcomes.iter().take(limit) {
        let listing = format!(
            "{} {}",
            text(o.request.brand.as_ref()),
            text(o.request.model.as_ref())
        );
        out.push_str(
            format!(
                "{:<6} {:<12} {:<24} {:>12} {:<40}",
                o.line,
                truncate(o.id.as_deref().unwrap_or(""), 12),
                truncate(listing.trim(), 24),
                o.response.price.map(|p| format!("{p:.2}")).unwrap_or_default(),
                truncate(o.response.error.as_deref().unwrap_or(""), 40),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    if outcomes.len() > limit {
        out.push_str(&format!("... {} more row(s)\n", outcomes.len() - limit));
    }

    out
}

fn text(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
