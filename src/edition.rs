//! Edition building: concurrent fetch + validate for one source.
//!
//! All fetches for a source's candidate list run concurrently, capped by
//! a semaphore so the remote host is never hammered. Completion order is
//! explicitly unreliable; the staging filename encodes the candidate's
//! ordinal, and the surviving assets are sorted by ordinal before they
//! leave this module, so edition order always equals acquisition order.
//!
//! A failed fetch or a rejected payload drops that one candidate and
//! nothing else. A source whose every candidate drops yields an empty
//! edition, which downstream treats as "no update available".

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::models::{CandidateImage, ValidatedAsset};
use crate::naming;
use crate::transport::{FetchError, Transport};
use crate::validate::{validate, Rejection, ValidationPolicy};

/// What happened to every candidate of one source.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Survivors, sorted by ordinal. Empty = no update available.
    pub assets: Vec<ValidatedAsset>,
    pub candidates: usize,
    pub fetched: usize,
    pub fetch_failures: usize,
    /// Rejection tallies keyed by short reason label.
    pub rejections: BTreeMap<&'static str, usize>,
}

impl BuildReport {
    pub fn rejected(&self) -> usize {
        self.rejections.values().sum()
    }
}

enum CandidateFailure {
    Fetch(FetchError),
    Rejected(Rejection),
}

/// Fetch and validate every candidate, bounded by `concurrency`.
pub async fn build_edition(
    source_name: &str,
    candidates: Vec<CandidateImage>,
    transport: Arc<dyn Transport>,
    images_dir: &Path,
    policy: &ValidationPolicy,
    concurrency: usize,
) -> BuildReport {
    let mut report = BuildReport {
        candidates: candidates.len(),
        ..BuildReport::default()
    };

    let prefix = naming::source_prefix(source_name);
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks: JoinSet<(u32, Result<ValidatedAsset, CandidateFailure>)> = JoinSet::new();

    for candidate in candidates {
        let transport = Arc::clone(&transport);
        let semaphore = Arc::clone(&semaphore);
        let images_dir: PathBuf = images_dir.to_path_buf();
        let prefix = prefix.clone();
        let policy = policy.clone();

        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore never closed");

            let bytes = match transport.fetch(&candidate.url).await {
                Ok(bytes) => bytes,
                Err(err) => return (candidate.ordinal, Err(CandidateFailure::Fetch(err))),
            };

            let result = validate(&bytes, &images_dir, &prefix, candidate.ordinal, &policy)
                .map_err(CandidateFailure::Rejected);
            (candidate.ordinal, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(asset))) => {
                report.fetched += 1;
                report.assets.push(asset);
            }
            Ok((ordinal, Err(CandidateFailure::Rejected(rejection)))) => {
                report.fetched += 1;
                *report.rejections.entry(rejection.label()).or_insert(0) += 1;
                eprintln!(
                    "warning: {} candidate {:02} rejected: {}",
                    source_name, ordinal, rejection
                );
            }
            Ok((ordinal, Err(CandidateFailure::Fetch(err)))) => {
                report.fetch_failures += 1;
                eprintln!(
                    "warning: {} candidate {:02} fetch failed: {}",
                    source_name, ordinal, err
                );
            }
            Err(join_err) => {
                report.fetch_failures += 1;
                eprintln!("warning: {} candidate task failed: {}", source_name, join_err);
            }
        }
    }

    // Completion order is arbitrary under concurrency; ordinal is the
    // only ordering that matters.
    report.assets.sort_by_key(|asset| asset.ordinal);
    report
}

/// Remove staged candidate files that will not be promoted.
pub fn discard_assets(assets: &[ValidatedAsset]) {
    for asset in assets {
        let _ = std::fs::remove_file(&asset.local_path);
    }
}
