//! evr - stateless EKS version reconciler.
//!
//! Walks every EKS cluster in a region, decides whether the control plane,
//! its add-ons and its managed node groups are behind, optionally requests
//! the next upgrade step, and sends one summary per cluster.

pub mod auth;
pub mod aws;
pub mod config;
pub mod eks;
pub mod eligibility;
pub mod error;
pub mod filter;
pub mod logging;
pub mod notify;
pub mod outcome;
pub mod phases;
pub mod provider;
pub mod reconciler;
pub mod report;
pub mod retry;
pub mod version;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const COMMIT: &str = env!("BUILD_COMMIT");
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// `--version` output including build metadata.
pub const LONG_VERSION: &str =
    const_format::formatcp!("{VERSION} (commit: {COMMIT}, build: {BUILD_DATE})");
