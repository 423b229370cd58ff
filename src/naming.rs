//! Centralized filename contract for the image store.
//!
//! Every file in the images directory follows the same pattern: a source
//! prefix, a lifecycle marker, and a zero-padded ordinal:
//!
//! - `emart_cand_03.jpg` — staging name for a downloaded candidate
//! - `emart_new_03.jpg`  — page 3 of the current edition
//! - `emart_past_03.jpg` — page 3 of the archived edition
//!
//! The markers are the contract surface between the validator, the
//! archive/promote step, and the paths recorded in the document. Archiving
//! is a pure marker rewrite (`_new_` → `_past_`), so past paths are always
//! derivable from current paths without touching the record.

use std::path::{Path, PathBuf};

const CAND_MARKER: &str = "_cand_";
const NEW_MARKER: &str = "_new_";
const PAST_MARKER: &str = "_past_";

/// Derive a filename prefix from a source name.
///
/// Lowercases and maps anything outside `[a-z0-9_-]` to `_`, so distinct
/// sources never collide inside the single flat images directory.
pub fn source_prefix(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Staging path for a candidate download, ordinal-encoded.
pub fn candidate_path(images_dir: &Path, prefix: &str, ordinal: u32, ext: &str) -> PathBuf {
    images_dir.join(format!("{}{}{:02}.{}", prefix, CAND_MARKER, ordinal, ext))
}

/// Canonical path for a page of the current edition.
pub fn current_path(images_dir: &Path, prefix: &str, ordinal: u32, ext: &str) -> PathBuf {
    images_dir.join(format!("{}{}{:02}.{}", prefix, NEW_MARKER, ordinal, ext))
}

/// Rewrite a current-edition filename into its past-edition counterpart.
///
/// Returns `None` when the filename does not carry the `_new_` marker,
/// which means it was never produced by promotion and must not be touched.
pub fn past_path_for(current: &Path) -> Option<PathBuf> {
    let name = current.file_name()?.to_str()?;
    Some(current.with_file_name(swap_last_marker(name)?))
}

/// Rewrite a recorded current-edition path string into its past-edition
/// counterpart. Same contract as [`past_path_for`], for document paths.
pub fn past_record_for(recorded: &str) -> Option<String> {
    swap_last_marker(recorded)
}

/// Replace the last `_new_` occurrence with `_past_`. The lifecycle
/// marker always sits after the prefix, so the last occurrence is the
/// marker even when a source name itself contains `_new_`.
fn swap_last_marker(name: &str) -> Option<String> {
    let idx = name.rfind(NEW_MARKER)?;
    Some(format!(
        "{}{}{}",
        &name[..idx],
        PAST_MARKER,
        &name[idx + NEW_MARKER.len()..]
    ))
}

/// Express an images-dir path the way the document records it: relative,
/// `./`-prefixed, forward slashes.
pub fn record_path(images_dir_name: &str, file_name: &str) -> String {
    format!("./{}/{}", images_dir_name, file_name)
}

/// Resolve a recorded `./images/...` path against the store's base
/// directory (the images directory's parent).
pub fn resolve_record_path(base: &Path, recorded: &str) -> PathBuf {
    let trimmed = recorded.strip_prefix("./").unwrap_or(recorded);
    base.join(trimmed)
}
