//! Kubernetes and add-on version parsing, comparison and next-step calculation.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::error::{ReconcileError, Result};

/// A platform version as `(major, minor, patch, build)`.
///
/// Ordering is lexicographic over the tuple, so `v1.18.0` sorts after `v1.9.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PlatformVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub build: u64,
}

impl PlatformVersion {
    pub const fn new(major: u64, minor: u64, patch: u64, build: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            build,
        }
    }
}

impl From<(u64, u64, u64, u64)> for PlatformVersion {
    fn from((major, minor, patch, build): (u64, u64, u64, u64)) -> Self {
        Self::new(major, minor, patch, build)
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}-{}",
            self.major, self.minor, self.patch, self.build
        )
    }
}

/// Relative position of one version against another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionRelation {
    Older,
    Equal,
    Newer,
}

impl From<Ordering> for VersionRelation {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Self::Older,
            Ordering::Equal => Self::Equal,
            Ordering::Greater => Self::Newer,
        }
    }
}

/// Parse a version string such as `v1.15.0-eksbuild.2` or `1.29`.
///
/// Missing or non-numeric components become 0. The build number is the
/// numeric part after the first `.` in the `-<qualifier>.<n>` suffix.
pub fn parse(version: &str) -> PlatformVersion {
    let s = version.trim();
    let s = s.strip_prefix('v').unwrap_or(s);

    let (numbers, qualifier) = s.split_once('-').unwrap_or((s, ""));
    let mut parts = numbers.split('.').map(parse_component);

    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    let patch = parts.next().unwrap_or(0);

    let build = qualifier
        .split('-')
        .next()
        .and_then(|q| q.split_once('.'))
        .and_then(|(_, n)| n.split('.').next())
        .map_or(0, parse_component);

    PlatformVersion::new(major, minor, patch, build)
}

fn parse_component(part: &str) -> u64 {
    part.parse().unwrap_or(0)
}

/// Compare `a` against `b`: `Older` means `a` is behind `b`.
pub fn compare(a: &str, b: &str) -> VersionRelation {
    parse(a).cmp(&parse(b)).into()
}

/// Parse a Kubernetes `<major>.<minor>` version string.
pub fn parse_k8s_version(version: &str) -> Result<(u32, u32)> {
    let mut parts = version.trim().split('.');
    let (Some(major), Some(minor)) = (parts.next(), parts.next()) else {
        return Err(ReconcileError::InvalidVersion(version.to_string()));
    };

    let major: u32 = major
        .parse()
        .map_err(|_| ReconcileError::InvalidVersion(version.to_string()))?;
    let minor: u32 = minor
        .parse()
        .map_err(|_| ReconcileError::InvalidVersion(version.to_string()))?;

    Ok((major, minor))
}

/// The next minor version after `current`, if the platform offers it.
///
/// EKS only moves one minor version at a time, so newer versions in
/// `available` are never returned directly.
pub fn next_step<S: AsRef<str>>(current: &str, available: &[S]) -> Option<String> {
    let (major, minor) = match parse_k8s_version(current) {
        Ok(v) => v,
        Err(e) => {
            warn!(version = current, error = %e, "Cannot compute next version");
            return None;
        }
    };

    let target = format!("{major}.{}", minor.checked_add(1)?);
    available
        .iter()
        .any(|v| v.as_ref() == target)
        .then_some(target)
}

/// Sort versions newest first.
pub fn sort_newest_first(versions: &mut [String]) {
    versions.sort_by(|a, b| parse(b).cmp(&parse(a)));
}
