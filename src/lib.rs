//! # flyerdeck
//!
//! A flyer edition tracker for retail sources.
//!
//! flyerdeck keeps, per configured source, a "current" and a "past"
//! edition of flyer-page images. Each run fetches the source's candidate
//! pages, filters out noise (icons, banners, error bodies, corrupt
//! downloads), decides whether the surviving set is genuinely new, and if
//! so atomically rotates editions: current files move into the past
//! namespace and the candidates are promoted to current.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────┐   ┌───────────┐
//! │ Acquirers  │──▶│ Fetch +      │──▶│ Change   │──▶│ Archive / │
//! │ per source │   │ Validate     │   │ Detector │   │ Promote   │
//! └────────────┘   │ (concurrent) │   └──────────┘   └─────┬─────┘
//!                  └──────────────┘                        │
//!                                                          ▼
//!                                                   ┌────────────┐
//!                                                   │ data.json  │
//!                                                   │ + images/  │
//!                                                   └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! flyerdeck init                  # create the document and images dir
//! flyerdeck sources               # check configured sources
//! flyerdeck sync all              # fetch, validate, detect, promote
//! flyerdeck status                # per-source edition overview
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types and the persisted document shape |
//! | [`naming`] | Filename contract for the image store |
//! | [`acquire`] | Page-acquisition strategies |
//! | [`transport`] | Fetch transport abstraction |
//! | [`validate`] | Asset validation filter chain |
//! | [`edition`] | Concurrent per-source edition building |
//! | [`detect`] | Edition change detection |
//! | [`promote`] | Archive/promote state machine |
//! | [`orchestrate`] | Per-run orchestration and summary |
//! | [`store`] | Whole-document persistence |

pub mod acquire;
pub mod config;
pub mod detect;
pub mod edition;
pub mod models;
pub mod naming;
pub mod orchestrate;
pub mod promote;
pub mod show;
pub mod sources;
pub mod stats;
pub mod store;
pub mod transport;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_fixtures;
