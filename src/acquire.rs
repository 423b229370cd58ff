//! Page-acquisition strategies.
//!
//! An acquirer turns a source's configuration into an ordered list of
//! [`CandidateImage`] locations. Site-specific navigation lives entirely
//! behind the [`PageAcquirer`] trait; the pipeline never knows which
//! strategy produced a candidate list, only that its order is the
//! edition's page order.
//!
//! Two strategies are built in:
//!
//! - `template` — expand a URL template containing `{page}` with
//!   zero-padded ordinals (the common scheme for flyer hosts that serve
//!   `emart_01.jpg` .. `emart_14.jpg`)
//! - `list` — an explicit, ordered URL list from the config
//!
//! Custom strategies implement [`PageAcquirer`] and are passed to
//! `run_sync_with` alongside the built-ins.

use anyhow::Result;
use async_trait::async_trait;

use crate::config::{AcquireSpec, SourceConfig};
use crate::models::CandidateImage;

/// Produces the ordered candidate list for one source.
///
/// # Lifecycle
///
/// Called once per source per run, before any fetch. The returned order
/// is authoritative: element N becomes page N+1 of the candidate edition.
#[async_trait]
pub trait PageAcquirer: Send + Sync {
    async fn acquire(&self, source: &SourceConfig) -> Result<Vec<CandidateImage>>;
}

/// The config-driven acquirer covering both built-in strategies.
pub struct BuiltinAcquirer;

#[async_trait]
impl PageAcquirer for BuiltinAcquirer {
    async fn acquire(&self, source: &SourceConfig) -> Result<Vec<CandidateImage>> {
        let urls: Vec<String> = match &source.acquire {
            AcquireSpec::Template { url, pages } => (1..=*pages)
                .map(|page| expand_template(url, page))
                .collect(),
            AcquireSpec::List { urls } => urls.clone(),
        };

        Ok(urls
            .into_iter()
            .enumerate()
            .map(|(i, url)| CandidateImage {
                source: source.name.clone(),
                ordinal: (i + 1) as u32,
                url,
            })
            .collect())
    }
}

/// Replace the `{page}` placeholder with a zero-padded page number.
fn expand_template(template: &str, page: u32) -> String {
    template.replace("{page}", &format!("{:02}", page))
}
