//! Archive/promote state machine.
//!
//! Given a `Changed` verdict, rotates a source's editions: the outgoing
//! current files are renamed into the past namespace and the staged
//! candidate files are renamed into the current namespace, then the
//! record is updated to match. Every rename is independent, deterministic,
//! and overwrites its destination, so a retried promotion converges on the
//! same end state instead of producing duplicates.
//!
//! Archive safety rule: the `past` slot in the record is only rewritten
//! when every outgoing current file was confirmed present up front. A
//! record with missing current files (degraded) keeps its previous `past`
//! untouched, so an incomplete rename can never clobber archived data.
//! Promotion itself always proceeds regardless.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{Edition, SourceRecord, ValidatedAsset};
use crate::naming;

/// Per-source promotion lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionState {
    /// No changed verdict this run; nothing moved.
    Stable,
    /// Renames in flight.
    Promoting,
    /// The candidate edition is now current.
    Promoted,
    /// A promote rename failed; the record kept its prior state.
    PromotionFailed,
}

/// A candidate asset could not be renamed into the current namespace.
#[derive(Debug, Error)]
#[error("could not promote {}: {source}", path.display())]
pub struct PromotionError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// What a successful promotion did.
#[derive(Debug)]
pub struct PromotionOutcome {
    /// The updated record value; persistence stays with the caller.
    pub record: SourceRecord,
    pub state: PromotionState,
    /// Whether the `past` slot in the record was rewritten.
    pub archived: bool,
    pub warning: Option<String>,
}

/// Rotate editions for one source: old current into `past`, candidate
/// into `current`.
///
/// `base` is the directory recorded paths resolve against; `images_dir`
/// is where edition files live on disk. On error the caller must keep its
/// pre-promotion record (files already renamed are re-converged by a
/// retry).
pub fn promote(
    record: &SourceRecord,
    candidate: &[ValidatedAsset],
    base: &Path,
    images_dir: &Path,
    images_dir_name: &str,
    prefix: &str,
    date: NaiveDate,
) -> Result<PromotionOutcome, PromotionError> {
    let snapshot = record.flyers.current.images.clone();
    let mut updated = record.clone();
    let mut warning = None;
    let mut archived = false;

    // Archive step. The record update is gated on every snapshot file
    // being present (and carrying the current marker) before any rename.
    let resolved: Vec<(String, PathBuf)> = snapshot
        .iter()
        .map(|recorded| (recorded.clone(), naming::resolve_record_path(base, recorded)))
        .collect();

    let all_archivable = resolved
        .iter()
        .all(|(recorded, path)| path.exists() && naming::past_record_for(recorded).is_some());

    if !snapshot.is_empty() {
        if all_archivable {
            for (_, path) in &resolved {
                let Some(past_path) = naming::past_path_for(path) else {
                    continue;
                };
                if let Err(err) = std::fs::rename(path, &past_path) {
                    // Partial archive commits whatever succeeded; a retry
                    // re-converges the stragglers.
                    eprintln!("warning: could not archive {}: {}", path.display(), err);
                }
            }
            let past_images: Vec<String> = snapshot
                .iter()
                .filter_map(|recorded| naming::past_record_for(recorded))
                .collect();
            updated.flyers.past = Edition {
                images: past_images,
                date: record.flyers.current.date,
            };
            archived = true;
        } else {
            let missing = resolved.iter().filter(|(_, p)| !p.exists()).count();
            warning = Some(format!(
                "{} of {} current file(s) missing; archive step skipped",
                missing,
                snapshot.len()
            ));
        }
    }

    // Promote step. First rename failure aborts with the record untouched.
    let mut promoted_images = Vec::with_capacity(candidate.len());
    for asset in candidate {
        let ext = asset
            .local_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");
        let dest = naming::current_path(images_dir, prefix, asset.ordinal, ext);
        std::fs::rename(&asset.local_path, &dest).map_err(|source| PromotionError {
            path: asset.local_path.clone(),
            source,
        })?;

        let file_name = dest
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        promoted_images.push(naming::record_path(images_dir_name, &file_name));
    }

    updated.flyers.current = Edition {
        images: promoted_images,
        date: Some(date),
    };

    Ok(PromotionOutcome {
        record: updated,
        state: PromotionState::Promoted,
        archived,
        warning,
    })
}
