//! Source listing and health overview.
//!
//! `flyerdeck sources` shows every configured source, which acquisition
//! strategy it uses, and the state of its persisted record, so a bad
//! config or a degraded record is visible before a sync runs.

use anyhow::Result;

use crate::config::{AcquireSpec, Config};
use crate::store;

pub fn list_sources(config: &Config) -> Result<()> {
    let document = store::load_document(&config.store.document);
    let base = config.store.base_dir();

    println!("{:<16} {:<24} {}", "SOURCE", "ACQUIRE", "RECORD");
    for source in &config.sources {
        let acquire = match &source.acquire {
            AcquireSpec::Template { pages, .. } => format!("template ({} pages)", pages),
            AcquireSpec::List { urls } => format!("list ({} urls)", urls.len()),
        };

        let record = match document.record(&source.name) {
            None => "NEW".to_string(),
            Some(record) if record.flyers.current.is_empty() => "EMPTY".to_string(),
            Some(record) => {
                let missing = record.missing_current_files(&base);
                if missing > 0 {
                    format!("DEGRADED ({} file(s) missing)", missing)
                } else {
                    "OK".to_string()
                }
            }
        };

        println!("{:<16} {:<24} {}", source.name, acquire, record);
    }

    Ok(())
}
