//! Document statistics and health overview.
//!
//! Provides a quick summary of what's stored: per-source edition sizes,
//! dates, and degraded-record flags. Used by `flyerdeck status` to give
//! confidence that syncs are rotating editions as expected.

use anyhow::Result;

use crate::config::Config;
use crate::store;

/// Run the status command: read the document and print a summary.
pub fn run_status(config: &Config) -> Result<()> {
    let document = store::load_document(&config.store.document);
    let base = config.store.base_dir();

    let document_size = std::fs::metadata(&config.store.document)
        .map(|m| m.len())
        .unwrap_or(0);
    let image_count = std::fs::read_dir(&config.store.images_dir)
        .map(|entries| entries.filter_map(|e| e.ok()).count())
        .unwrap_or(0);

    println!("flyerdeck — Store Status");
    println!("========================");
    println!();
    println!("  Document:    {}", config.store.document.display());
    println!("  Size:        {}", format_bytes(document_size));
    println!("  Images dir:  {}", config.store.images_dir.display());
    println!("  Image files: {}", image_count);
    println!();

    if document.records.is_empty() {
        println!("  No source records yet. Run `flyerdeck sync all` first.");
        println!();
        return Ok(());
    }

    println!(
        "  {:<16} {:>8} {:<12} {:>6}   {}",
        "SOURCE", "CURRENT", "DATE", "PAST", "STATE"
    );
    println!("  {}", "-".repeat(60));

    for record in &document.records {
        let date = record
            .flyers
            .current
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let missing = record.missing_current_files(&base);
        let state = if record.flyers.current.is_empty() {
            "empty".to_string()
        } else if missing > 0 {
            format!("degraded ({} missing)", missing)
        } else {
            "ok".to_string()
        };

        println!(
            "  {:<16} {:>8} {:<12} {:>6}   {}",
            record.name,
            record.flyers.current.images.len(),
            date,
            record.flyers.past.images.len(),
            state
        );
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
