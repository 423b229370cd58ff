//! Run orchestration.
//!
//! Coordinates the full sync flow: acquisition → concurrent fetch +
//! validation → change detection → archive/promote → one final document
//! write. Edition building fans out one task per source; detection and
//! promotion run sequentially on the collecting loop, which is the only
//! code that touches the in-memory document. Every per-candidate and
//! per-source failure is contained at its level; only a failure to write
//! the final document is fatal to the run.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::acquire::{BuiltinAcquirer, PageAcquirer};
use crate::config::{Config, SourceConfig};
use crate::detect::{detect, DetectionMode};
use crate::edition::{build_edition, discard_assets, BuildReport};
use crate::models::{SourceOutcome, Verdict};
use crate::naming;
use crate::promote::{promote, PromotionState};
use crate::store;
use crate::transport::{HttpTransport, Transport};
use crate::validate::ValidationPolicy;

/// Everything that happened to one source this run.
#[derive(Debug)]
pub struct SourceReport {
    pub source: String,
    pub candidates: usize,
    pub fetched: usize,
    pub validated: usize,
    pub rejected: usize,
    pub fetch_failures: usize,
    pub state: PromotionState,
    pub outcome: SourceOutcome,
}

/// Per-run summary, returned to callers and printed as it is built.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub sources: Vec<SourceReport>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.sources
            .iter()
            .filter(|report| matches!(report.outcome, SourceOutcome::Failed { .. }))
            .count()
    }
}

/// Run the pipeline with the production HTTP transport and the built-in
/// acquirer strategies.
pub async fn run_sync(
    config: &Config,
    selector: &str,
    force: bool,
    dry_run: bool,
) -> Result<RunSummary> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.fetch)?);
    let acquirer: Arc<dyn PageAcquirer> = Arc::new(BuiltinAcquirer);
    run_sync_with(config, selector, force, dry_run, transport, acquirer).await
}

/// Run the pipeline with injected acquisition and transport, so tests and
/// custom site strategies can drive the same flow end to end.
pub async fn run_sync_with(
    config: &Config,
    selector: &str,
    force: bool,
    dry_run: bool,
    transport: Arc<dyn Transport>,
    acquirer: Arc<dyn PageAcquirer>,
) -> Result<RunSummary> {
    let selected: Vec<SourceConfig> = if selector == "all" {
        config.sources.clone()
    } else {
        match config.sources.iter().find(|s| s.name == selector) {
            Some(source) => vec![source.clone()],
            None => {
                let known: Vec<&str> = config.sources.iter().map(|s| s.name.as_str()).collect();
                bail!(
                    "Unknown source: '{}'. Available: all, {}",
                    selector,
                    known.join(", ")
                );
            }
        }
    };

    let images_dir = &config.store.images_dir;
    std::fs::create_dir_all(images_dir)
        .with_context(|| format!("Failed to create {}", images_dir.display()))?;

    let base = config.store.base_dir();
    let images_dir_name = config.store.images_dir_name();

    let mut document = store::load_document(&config.store.document);
    let mode = DetectionMode::from_config(&config.detection);
    let today = chrono::Utc::now().date_naive();

    // Fan out: one builder task per source. Document mutation stays on
    // the collecting loop below.
    let mut tasks: JoinSet<(SourceConfig, Result<BuildReport>)> = JoinSet::new();
    for source in selected {
        let transport = Arc::clone(&transport);
        let acquirer = Arc::clone(&acquirer);
        let images_dir = images_dir.clone();
        let policy = ValidationPolicy {
            min_bytes: config.validation.min_bytes,
            min_dimension: config.validation.min_dimension,
            aspect_ceiling: source.effective_aspect_ceiling(&config.validation),
        };
        let concurrency = config.fetch.concurrency;

        tasks.spawn(async move {
            let report = async {
                let candidates = acquirer.acquire(&source).await?;
                Ok(build_edition(
                    &source.name,
                    candidates,
                    transport,
                    &images_dir,
                    &policy,
                    concurrency,
                )
                .await)
            }
            .await;
            (source, report)
        });
    }

    let mut summary = RunSummary::default();

    while let Some(joined) = tasks.join_next().await {
        let (source, built) = match joined {
            Ok(result) => result,
            Err(join_err) => {
                eprintln!("warning: source task failed: {}", join_err);
                continue;
            }
        };

        let name = source.name.clone();
        println!("sync {}", name);

        let report = match built {
            Ok(report) => report,
            Err(err) => {
                println!("  acquisition failed: {:#}", err);
                summary.sources.push(SourceReport {
                    source: name,
                    candidates: 0,
                    fetched: 0,
                    validated: 0,
                    rejected: 0,
                    fetch_failures: 0,
                    state: PromotionState::Stable,
                    outcome: SourceOutcome::Failed {
                        reason: format!("{:#}", err),
                    },
                });
                continue;
            }
        };

        println!("  candidates: {}", report.candidates);
        println!("  fetched: {}", report.fetched);
        println!("  validated: {}", report.assets.len());
        if report.rejected() > 0 {
            let reasons: Vec<String> = report
                .rejections
                .iter()
                .map(|(label, count)| format!("{}: {}", label, count))
                .collect();
            println!("  rejected: {} ({})", report.rejected(), reasons.join(", "));
        } else {
            println!("  rejected: 0");
        }
        if report.fetch_failures > 0 {
            println!("  fetch failures: {}", report.fetch_failures);
        }

        let (state, outcome) = finalize_source(
            &mut document,
            &source,
            &report,
            &base,
            images_dir,
            &images_dir_name,
            mode,
            force,
            dry_run,
            today,
        );

        match &outcome {
            SourceOutcome::Unchanged => println!("  verdict: unchanged"),
            SourceOutcome::Updated { pages } => {
                if dry_run {
                    println!("  verdict: changed (would update {} pages)", pages);
                } else {
                    println!("  verdict: updated ({} pages)", pages);
                }
            }
            SourceOutcome::Failed { reason } => println!("  verdict: failed ({})", reason),
        }

        summary.sources.push(SourceReport {
            source: name,
            candidates: report.candidates,
            fetched: report.fetched,
            validated: report.assets.len(),
            rejected: report.rejected(),
            fetch_failures: report.fetch_failures,
            state,
            outcome,
        });
    }

    if dry_run {
        println!("dry-run: document left untouched");
    } else {
        store::save_document(&config.store.document, &document)
            .with_context(|| "Failed to write the document")?;
    }

    println!("ok");
    Ok(summary)
}

/// Detect and, on a changed verdict, promote. Returns the promotion state
/// transition this source went through plus its reported outcome.
#[allow(clippy::too_many_arguments)]
fn finalize_source(
    document: &mut crate::models::Document,
    source: &SourceConfig,
    report: &BuildReport,
    base: &Path,
    images_dir: &Path,
    images_dir_name: &str,
    mode: DetectionMode,
    force: bool,
    dry_run: bool,
    today: chrono::NaiveDate,
) -> (PromotionState, SourceOutcome) {
    // An empty candidate edition means "no update available", never
    // "edition with zero pages".
    if report.assets.is_empty() {
        return (PromotionState::Stable, SourceOutcome::Unchanged);
    }

    let record = document.record_or_insert(&source.name).clone();

    let verdict = if force {
        Verdict::Changed
    } else {
        detect(base, &report.assets, &record.flyers.current, mode)
    };

    if verdict == Verdict::Unchanged {
        // Redundant re-fetch; the staged copies serve no purpose.
        discard_assets(&report.assets);
        return (PromotionState::Stable, SourceOutcome::Unchanged);
    }

    if dry_run {
        discard_assets(&report.assets);
        return (
            PromotionState::Stable,
            SourceOutcome::Updated {
                pages: report.assets.len(),
            },
        );
    }

    let prefix = naming::source_prefix(&source.name);
    match promote(
        &record,
        &report.assets,
        base,
        images_dir,
        images_dir_name,
        &prefix,
        today,
    ) {
        Ok(outcome) => {
            if let Some(warning) = &outcome.warning {
                eprintln!("warning: {}: {}", source.name, warning);
            }
            *document.record_or_insert(&source.name) = outcome.record;
            (
                outcome.state,
                SourceOutcome::Updated {
                    pages: report.assets.len(),
                },
            )
        }
        Err(err) => {
            // Prior record stays; staged files that were not yet renamed
            // would only shadow the next run's staging, drop them.
            discard_assets(&report.assets);
            (
                PromotionState::PromotionFailed,
                SourceOutcome::Failed {
                    reason: err.to_string(),
                },
            )
        }
    }
}
