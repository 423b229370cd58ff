//! Asset validation filter chain.
//!
//! Turns one raw byte payload into either a validated local asset or a
//! typed rejection. Filters run in order and short-circuit:
//!
//! 1. byte floor — drops empty and error-page responses
//! 2. magic sniff (JPEG `FF D8 FF`, PNG `89 50 4E 47`) — drops HTML error
//!    bodies served with a 200 status, and anything else that isn't an image
//! 3. resolution floor — drops icons and buttons
//! 4. aspect-ratio ceiling (optional) — drops horizontal promo banners
//!
//! The payload is persisted at its staging path once the cheap in-memory
//! filters pass; any later rejection removes the file again, so no
//! partial or invalid artifact ever survives a rejection.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::ValidatedAsset;
use crate::naming;

/// Why a candidate payload was refused.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("payload too small ({size} bytes)")]
    TooSmall { size: usize },
    #[error("not a JPEG or PNG payload")]
    BadFormat,
    #[error("resolution {width}x{height} below the {min}px floor")]
    TooSmallResolution { width: u32, height: u32, min: u32 },
    #[error("aspect ratio {ratio:.2} looks like a banner")]
    SuspectedBanner { ratio: f64 },
    #[error("could not persist payload: {0}")]
    Io(#[from] std::io::Error),
}

impl Rejection {
    /// Short label used in run-summary tallies.
    pub fn label(&self) -> &'static str {
        match self {
            Rejection::TooSmall { .. } => "too-small",
            Rejection::BadFormat => "bad-format",
            Rejection::TooSmallResolution { .. } => "low-res",
            Rejection::SuspectedBanner { .. } => "banner",
            Rejection::Io(_) => "io",
        }
    }
}

/// The two payload formats the chain accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
        }
    }
}

/// Thresholds for one validation pass.
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    pub min_bytes: usize,
    pub min_dimension: u32,
    pub aspect_ceiling: Option<f64>,
}

const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];
const PNG_MAGIC: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];

/// Identify the payload format from its leading bytes.
pub fn sniff_format(bytes: &[u8]) -> Option<ImageKind> {
    if bytes.starts_with(&JPEG_MAGIC) {
        Some(ImageKind::Jpeg)
    } else if bytes.starts_with(&PNG_MAGIC) {
        Some(ImageKind::Png)
    } else {
        None
    }
}

/// Run the filter chain over one payload.
///
/// On acceptance the payload is persisted at the ordinal-encoded staging
/// path under `images_dir` and the resulting [`ValidatedAsset`] points at
/// it. On rejection nothing is left on disk.
pub fn validate(
    bytes: &[u8],
    images_dir: &Path,
    prefix: &str,
    ordinal: u32,
    policy: &ValidationPolicy,
) -> Result<ValidatedAsset, Rejection> {
    if bytes.len() < policy.min_bytes {
        return Err(Rejection::TooSmall { size: bytes.len() });
    }

    let kind = sniff_format(bytes).ok_or(Rejection::BadFormat)?;

    let dest = naming::candidate_path(images_dir, prefix, ordinal, kind.extension());
    std::fs::write(&dest, bytes)?;

    match inspect_written(bytes, &dest, ordinal, policy) {
        Ok(asset) => Ok(asset),
        Err(rejection) => {
            // Never leave a rejected payload behind.
            let _ = std::fs::remove_file(&dest);
            Err(rejection)
        }
    }
}

/// The decode-dependent filters, split out so the caller can unlink the
/// staged file on any rejection.
fn inspect_written(
    bytes: &[u8],
    dest: &Path,
    ordinal: u32,
    policy: &ValidationPolicy,
) -> Result<ValidatedAsset, Rejection> {
    // Header-only probe; a payload with a valid magic but an undecodable
    // header is a corrupt download.
    let (width, height) = image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|_| Rejection::BadFormat)?
        .into_dimensions()
        .map_err(|_| Rejection::BadFormat)?;

    if width < policy.min_dimension || height < policy.min_dimension {
        return Err(Rejection::TooSmallResolution {
            width,
            height,
            min: policy.min_dimension,
        });
    }

    if let Some(ceiling) = policy.aspect_ceiling {
        let ratio = width as f64 / height as f64;
        if ratio > ceiling {
            return Err(Rejection::SuspectedBanner { ratio });
        }
    }

    Ok(ValidatedAsset {
        ordinal,
        local_path: PathBuf::from(dest),
        byte_size: bytes.len() as u64,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{jpeg_bytes, png_bytes};
    use tempfile::TempDir;

    fn policy() -> ValidationPolicy {
        ValidationPolicy {
            min_bytes: 1000,
            min_dimension: 400,
            aspect_ceiling: Some(3.0),
        }
    }

    #[test]
    fn test_accepts_valid_jpeg() {
        let tmp = TempDir::new().unwrap();
        let bytes = jpeg_bytes(800, 1100);
        let asset = validate(&bytes, tmp.path(), "emart", 1, &policy()).unwrap();
        assert_eq!(asset.ordinal, 1);
        assert_eq!((asset.width, asset.height), (800, 1100));
        assert_eq!(asset.byte_size, bytes.len() as u64);
        assert!(asset.local_path.exists());
        assert!(asset.local_path.ends_with("emart_cand_01.jpg"));
    }

    #[test]
    fn test_accepts_valid_png() {
        let tmp = TempDir::new().unwrap();
        let bytes = png_bytes(600, 900);
        let asset = validate(&bytes, tmp.path(), "lotte", 4, &policy()).unwrap();
        assert!(asset.local_path.ends_with("lotte_cand_04.png"));
    }

    #[test]
    fn test_rejects_tiny_payload() {
        let tmp = TempDir::new().unwrap();
        let err = validate(&[0xFF, 0xD8, 0xFF, 0x00], tmp.path(), "emart", 1, &policy())
            .unwrap_err();
        assert!(matches!(err, Rejection::TooSmall { size: 4 }));
    }

    #[test]
    fn test_rejects_html_error_body() {
        let tmp = TempDir::new().unwrap();
        let body = "<html><body>Not Found</body></html>".repeat(50);
        let err = validate(body.as_bytes(), tmp.path(), "emart", 1, &policy()).unwrap_err();
        assert!(matches!(err, Rejection::BadFormat));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_rejects_icon_resolution_and_removes_file() {
        let tmp = TempDir::new().unwrap();
        let bytes = jpeg_bytes(200, 200);
        let err = validate(&bytes, tmp.path(), "emart", 2, &policy()).unwrap_err();
        assert!(matches!(
            err,
            Rejection::TooSmallResolution {
                width: 200,
                height: 200,
                ..
            }
        ));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_rejects_banner_aspect_and_removes_file() {
        let tmp = TempDir::new().unwrap();
        let bytes = jpeg_bytes(1600, 420);
        let err = validate(&bytes, tmp.path(), "emart", 3, &policy()).unwrap_err();
        assert!(matches!(err, Rejection::SuspectedBanner { .. }));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_banner_filter_off_when_unconfigured() {
        let tmp = TempDir::new().unwrap();
        let mut wide_ok = policy();
        wide_ok.aspect_ceiling = None;
        let bytes = jpeg_bytes(1600, 420);
        assert!(validate(&bytes, tmp.path(), "emart", 3, &wide_ok).is_ok());
    }

    #[test]
    fn test_truncated_jpeg_is_bad_format() {
        let tmp = TempDir::new().unwrap();
        let mut bytes = jpeg_bytes(800, 1100);
        bytes.truncate(1200);
        bytes[4..].fill(0);
        let err = validate(&bytes, tmp.path(), "emart", 1, &policy()).unwrap_err();
        assert!(matches!(err, Rejection::BadFormat));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
