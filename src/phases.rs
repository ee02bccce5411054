//! Per-resource reconciliation phases.
//!
//! Each phase reads current remote state, decides, and optionally requests
//! one change. Failures are contained to the narrowest resource.

pub mod addons;
pub mod cluster;
pub mod nodegroups;
