//! Whole-document persistence.
//!
//! The document is one JSON file holding an ordered array of source
//! records. It is read once at run start and overwritten once at run end;
//! there is no incremental persistence. A missing or malformed file
//! degrades to an empty document with a warning instead of failing the
//! run, so a lost document heals itself on the next successful sync.

use anyhow::{Context, Result};
use std::path::Path;

use crate::models::Document;

/// Load the document, tolerating absence and corruption.
pub fn load_document(path: &Path) -> Document {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            eprintln!(
                "warning: document {} not found, starting from an empty document",
                path.display()
            );
            return Document::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(document) => document,
        Err(err) => {
            eprintln!(
                "warning: document {} is malformed ({}), starting from an empty document",
                path.display(),
                err
            );
            Document::default()
        }
    }
}

/// Write the full document as one atomic overwrite.
///
/// Serializes to a sibling temp file first and renames it over the
/// destination, so the document on disk is never partially written.
pub fn save_document(path: &Path, document: &Document) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let json = serde_json::to_string_pretty(document)?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json.as_bytes())
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}

/// Create the images directory and an empty document if absent.
///
/// Idempotent: an existing document is left exactly as it is.
pub fn init_store(document_path: &Path, images_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(images_dir)
        .with_context(|| format!("Failed to create {}", images_dir.display()))?;

    if !document_path.exists() {
        save_document(document_path, &Document::default())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Edition, SourceRecord};
    use tempfile::TempDir;

    #[test]
    fn test_missing_document_is_empty() {
        let tmp = TempDir::new().unwrap();
        let document = load_document(&tmp.path().join("data.json"));
        assert!(document.records.is_empty());
    }

    #[test]
    fn test_malformed_document_is_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.json");
        std::fs::write(&path, "{not json").unwrap();
        let document = load_document(&path);
        assert!(document.records.is_empty());
    }

    #[test]
    fn test_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.json");

        let mut document = Document::default();
        let record = document.record_or_insert("emart");
        record.flyers.current = Edition {
            images: vec!["./images/emart_new_01.jpg".to_string()],
            date: Some(chrono::NaiveDate::from_ymd_opt(2026, 8, 5).unwrap()),
        };

        save_document(&path, &document).unwrap();
        let loaded = load_document(&path);
        assert_eq!(loaded, document);
    }

    #[test]
    fn test_save_replaces_whole_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.json");

        let mut first = Document::default();
        first.record_or_insert("emart");
        first.record_or_insert("homeplus");
        save_document(&path, &first).unwrap();

        let second = Document {
            records: vec![SourceRecord::empty("lotte")],
        };
        save_document(&path, &second).unwrap();

        let loaded = load_document(&path);
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].name, "lotte");
        // No temp file left behind
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_init_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let document_path = tmp.path().join("data.json");
        let images_dir = tmp.path().join("images");

        init_store(&document_path, &images_dir).unwrap();
        assert!(images_dir.is_dir());
        assert!(document_path.exists());

        // A populated document survives a second init.
        let mut document = Document::default();
        document.record_or_insert("emart");
        save_document(&document_path, &document).unwrap();
        init_store(&document_path, &images_dir).unwrap();
        assert_eq!(load_document(&document_path), document);
    }

    #[test]
    fn test_legacy_document_shape_parses() {
        // The shape produced by earlier iterations of the tool: array of
        // records with flyers.current/past and string dates.
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.json");
        std::fs::write(
            &path,
            r#"[
  {
    "name": "emart",
    "flyers": {
      "current": { "images": ["./images/emart_new_01.jpg"], "date": "2026-07-29" },
      "past": { "images": [] }
    }
  }
]"#,
        )
        .unwrap();

        let document = load_document(&path);
        assert_eq!(document.records.len(), 1);
        let record = document.record("emart").unwrap();
        assert_eq!(record.flyers.current.images.len(), 1);
        assert_eq!(
            record.flyers.current.date,
            Some(chrono::NaiveDate::from_ymd_opt(2026, 7, 29).unwrap())
        );
        assert!(record.flyers.past.is_empty());
    }
}
