//! Edition change detection.
//!
//! Decides whether a freshly built candidate edition is genuinely new or
//! a re-fetch of what is already stored. Cardinality differences are
//! definitive; equal-length editions are compared slot by slot in one of
//! two flavors, chosen once per deployment:
//!
//! - **exact** — SHA-256 over full file bytes per slot
//! - **tolerant** — byte sizes within a small relative threshold AND
//!   identical decoded dimensions (flyer hosts re-encode images on their
//!   CDN, which shifts bytes without changing content)
//!
//! A stored slot whose file is missing or undecodable can never confirm
//! "unchanged", so the edition fails open to `Changed` and gets refreshed.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::config::DetectionConfig;
use crate::models::{Edition, ValidatedAsset, Verdict};
use crate::naming;

/// Slot comparison flavor, parsed from validated config.
#[derive(Debug, Clone, Copy)]
pub enum DetectionMode {
    Exact,
    Tolerant { size_tolerance: f64 },
}

impl DetectionMode {
    pub fn from_config(config: &DetectionConfig) -> Self {
        match config.mode.as_str() {
            "exact" => DetectionMode::Exact,
            _ => DetectionMode::Tolerant {
                size_tolerance: config.size_tolerance,
            },
        }
    }
}

/// Compare a candidate edition against the stored current edition.
///
/// `base` is the directory the document's recorded paths resolve against.
pub fn detect(
    base: &Path,
    candidate: &[ValidatedAsset],
    stored: &Edition,
    mode: DetectionMode,
) -> Verdict {
    if stored.is_empty() {
        return if candidate.is_empty() {
            Verdict::Unchanged
        } else {
            Verdict::Changed
        };
    }

    if candidate.len() != stored.images.len() {
        return Verdict::Changed;
    }

    for (asset, recorded) in candidate.iter().zip(stored.images.iter()) {
        let stored_path = naming::resolve_record_path(base, recorded);
        let same = match mode {
            DetectionMode::Exact => slot_matches_exact(asset, &stored_path),
            DetectionMode::Tolerant { size_tolerance } => {
                slot_matches_tolerant(asset, &stored_path, size_tolerance)
            }
        };
        if !same {
            return Verdict::Changed;
        }
    }

    Verdict::Unchanged
}

fn slot_matches_exact(asset: &ValidatedAsset, stored_path: &Path) -> bool {
    let stored_hash = match file_sha256(stored_path) {
        Some(hash) => hash,
        None => return false,
    };
    let candidate_hash = match file_sha256(&asset.local_path) {
        Some(hash) => hash,
        None => return false,
    };
    stored_hash == candidate_hash
}

fn slot_matches_tolerant(asset: &ValidatedAsset, stored_path: &Path, tolerance: f64) -> bool {
    let stored_size = match std::fs::metadata(stored_path) {
        Ok(meta) => meta.len(),
        Err(_) => return false,
    };
    if stored_size == 0 {
        return false;
    }

    let delta = asset.byte_size.abs_diff(stored_size) as f64;
    if delta / stored_size as f64 > tolerance {
        return false;
    }

    match image::image_dimensions(stored_path) {
        Ok((width, height)) => width == asset.width && height == asset.height,
        Err(_) => false,
    }
}

fn file_sha256(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Some(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{jpeg_bytes, padded_jpeg};
    use tempfile::TempDir;

    const TOLERANT: DetectionMode = DetectionMode::Tolerant {
        size_tolerance: 0.03,
    };

    /// Write candidate staging files and matching stored current files,
    /// returning (candidate assets, stored edition) rooted at `base`.
    fn seeded_pair(base: &Path, payloads: &[Vec<u8>]) -> (Vec<ValidatedAsset>, Edition) {
        let images = base.join("images");
        std::fs::create_dir_all(&images).unwrap();

        let mut assets = Vec::new();
        let mut recorded = Vec::new();
        for (i, payload) in payloads.iter().enumerate() {
            let ordinal = (i + 1) as u32;
            let cand = images.join(format!("emart_cand_{:02}.jpg", ordinal));
            std::fs::write(&cand, payload).unwrap();
            let (width, height) =
                image::image_dimensions(&cand).expect("fixture payload must decode");
            assets.push(ValidatedAsset {
                ordinal,
                local_path: cand,
                byte_size: payload.len() as u64,
                width,
                height,
            });

            let current = images.join(format!("emart_new_{:02}.jpg", ordinal));
            std::fs::write(&current, payload).unwrap();
            recorded.push(format!("./images/emart_new_{:02}.jpg", ordinal));
        }

        (
            assets,
            Edition {
                images: recorded,
                date: None,
            },
        )
    }

    #[test]
    fn test_reflexive_unchanged_tolerant() {
        let tmp = TempDir::new().unwrap();
        let (assets, stored) = seeded_pair(tmp.path(), &[jpeg_bytes(500, 700), jpeg_bytes(520, 730)]);
        assert_eq!(detect(tmp.path(), &assets, &stored, TOLERANT), Verdict::Unchanged);
    }

    #[test]
    fn test_reflexive_unchanged_exact() {
        let tmp = TempDir::new().unwrap();
        let (assets, stored) = seeded_pair(tmp.path(), &[jpeg_bytes(500, 700)]);
        assert_eq!(
            detect(tmp.path(), &assets, &stored, DetectionMode::Exact),
            Verdict::Unchanged
        );
    }

    #[test]
    fn test_empty_stored_is_changed() {
        let tmp = TempDir::new().unwrap();
        let (assets, _) = seeded_pair(tmp.path(), &[jpeg_bytes(500, 700)]);
        let empty = Edition::default();
        assert_eq!(detect(tmp.path(), &assets, &empty, TOLERANT), Verdict::Changed);
    }

    #[test]
    fn test_cardinality_mismatch_is_changed() {
        let tmp = TempDir::new().unwrap();
        let (assets, mut stored) =
            seeded_pair(tmp.path(), &[jpeg_bytes(500, 700), jpeg_bytes(520, 730)]);
        stored.images.pop();
        assert_eq!(detect(tmp.path(), &assets, &stored, TOLERANT), Verdict::Changed);
    }

    #[test]
    fn test_missing_stored_file_fails_open() {
        let tmp = TempDir::new().unwrap();
        let (assets, stored) = seeded_pair(tmp.path(), &[jpeg_bytes(500, 700)]);
        std::fs::remove_file(tmp.path().join("images/emart_new_01.jpg")).unwrap();
        assert_eq!(detect(tmp.path(), &assets, &stored, TOLERANT), Verdict::Changed);
        assert_eq!(
            detect(tmp.path(), &assets, &stored, DetectionMode::Exact),
            Verdict::Changed
        );
    }

    #[test]
    fn test_tolerant_accepts_small_size_drift() {
        let tmp = TempDir::new().unwrap();
        let base_payload = jpeg_bytes(500, 700);
        let (mut assets, stored) = seeded_pair(tmp.path(), &[base_payload.clone()]);

        // Re-encoded upstream: 1% bigger, same dimensions.
        let drifted = padded_jpeg(&base_payload, 0.01);
        std::fs::write(&assets[0].local_path, &drifted).unwrap();
        assets[0].byte_size = drifted.len() as u64;

        assert_eq!(detect(tmp.path(), &assets, &stored, TOLERANT), Verdict::Unchanged);
    }

    #[test]
    fn test_tolerant_rejects_large_size_drift() {
        let tmp = TempDir::new().unwrap();
        let base_payload = jpeg_bytes(500, 700);
        let (mut assets, stored) = seeded_pair(tmp.path(), &[base_payload.clone()]);

        let drifted = padded_jpeg(&base_payload, 0.10);
        std::fs::write(&assets[0].local_path, &drifted).unwrap();
        assets[0].byte_size = drifted.len() as u64;

        assert_eq!(detect(tmp.path(), &assets, &stored, TOLERANT), Verdict::Changed);
    }

    #[test]
    fn test_tolerant_rejects_dimension_change() {
        let tmp = TempDir::new().unwrap();
        let (mut assets, stored) = seeded_pair(tmp.path(), &[jpeg_bytes(500, 700)]);

        // Byte size identical, pixel dimensions transposed.
        assets[0].width = 700;
        assets[0].height = 500;

        assert_eq!(detect(tmp.path(), &assets, &stored, TOLERANT), Verdict::Changed);
    }

    #[test]
    fn test_exact_rejects_any_byte_change() {
        let tmp = TempDir::new().unwrap();
        let base_payload = jpeg_bytes(500, 700);
        let (assets, stored) = seeded_pair(tmp.path(), &[base_payload.clone()]);

        let drifted = padded_jpeg(&base_payload, 0.001);
        std::fs::write(&assets[0].local_path, &drifted).unwrap();

        assert_eq!(
            detect(tmp.path(), &assets, &stored, DetectionMode::Exact),
            Verdict::Changed
        );
    }
}
