//! Single-record detail view.
//!
//! `flyerdeck show <source>` prints one source's full record: every
//! current and past path with its on-disk presence, so a degraded record
//! can be diagnosed file by file.

use anyhow::{bail, Result};
use std::path::Path;

use crate::config::Config;
use crate::models::Edition;
use crate::naming;
use crate::store;

pub fn run_show(config: &Config, source: &str) -> Result<()> {
    let document = store::load_document(&config.store.document);
    let Some(record) = document.record(source) else {
        bail!("No record for source '{}'", source);
    };

    let base = config.store.base_dir();

    println!("Source: {}", record.name);
    print_edition("current", &record.flyers.current, &base);
    print_edition("past", &record.flyers.past, &base);

    Ok(())
}

fn print_edition(label: &str, edition: &Edition, base: &Path) {
    let date = edition
        .date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!();
    println!(
        "  {} ({} pages, date {})",
        label,
        edition.images.len(),
        date
    );
    for recorded in &edition.images {
        let present = naming::resolve_record_path(base, recorded).exists();
        let marker = if present { "ok" } else { "MISSING" };
        println!("    {:<40} {}", recorded, marker);
    }
}
