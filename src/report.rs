//! Folding per-resource outcomes into one summary per cluster.

use std::fmt::Write as _;

use crate::outcome::{
    AddonOutcome, Categorized, Category, ClusterOutcome, ClusterReport, ClusterStatus,
    NodeGroupOutcome, NodeGroupStatus,
};

const RULE_WIDTH: usize = 60;

/// Per-category counts for one resource kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub total: usize,
    pub updated: usize,
    pub failed: usize,
    pub update_available: usize,
    pub up_to_date: usize,
    pub blocked_or_skipped: usize,
}

impl Counts {
    pub fn tally<T: Categorized>(items: &[T]) -> Self {
        items.iter().fold(Self::default(), |mut counts, item| {
            counts.add(item.category());
            counts
        })
    }

    fn add(&mut self, category: Category) {
        self.total += 1;
        match category {
            Category::Updated => self.updated += 1,
            Category::Failed => self.failed += 1,
            Category::UpdateAvailable => self.update_available += 1,
            Category::UpToDate => self.up_to_date += 1,
            Category::BlockedOrSkipped => self.blocked_or_skipped += 1,
        }
    }

    pub const fn get(&self, category: Category) -> usize {
        match category {
            Category::Updated => self.updated,
            Category::Failed => self.failed,
            Category::UpdateAvailable => self.update_available,
            Category::UpToDate => self.up_to_date,
            Category::BlockedOrSkipped => self.blocked_or_skipped,
        }
    }
}

/// Headline of a summary, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectCategory {
    Failed(usize),
    Updated(usize),
    Blocked,
    UpdateAvailable(usize),
    AllUpToDate,
}

impl SubjectCategory {
    pub fn label(&self) -> String {
        match self {
            Self::Failed(n) => format!("{n} Failed"),
            Self::Updated(n) => format!("{n} Updated"),
            Self::Blocked => "Upgrade Blocked".to_string(),
            Self::UpdateAvailable(n) => format!("{n} Update Available"),
            Self::AllUpToDate => "All Up-to-Date".to_string(),
        }
    }
}

/// Aggregated view of a [`ClusterReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSummary {
    pub cluster_name: String,
    pub cluster_status: ClusterStatus,
    pub addons: Counts,
    pub nodegroups: Counts,
    pub subject: SubjectCategory,
}

impl ClusterSummary {
    pub fn subject_line(&self) -> String {
        format!(
            "EKS Upgrade Summary - {} - {}",
            self.cluster_name,
            self.subject.label()
        )
    }
}

/// Summarize one cluster report. Never fails, including on empty input.
pub fn summarize(report: &ClusterReport) -> ClusterSummary {
    let addons = Counts::tally(&report.addons);
    let nodegroups = Counts::tally(&report.nodegroups);
    let cluster = Counts::tally(std::slice::from_ref(&report.cluster));

    let total = |category| cluster.get(category) + addons.get(category) + nodegroups.get(category);

    let subject = if total(Category::Failed) > 0 {
        SubjectCategory::Failed(total(Category::Failed))
    } else if total(Category::Updated) > 0 {
        SubjectCategory::Updated(total(Category::Updated))
    } else if report.cluster.status == ClusterStatus::Blocked {
        SubjectCategory::Blocked
    } else if total(Category::UpdateAvailable) > 0 {
        SubjectCategory::UpdateAvailable(total(Category::UpdateAvailable))
    } else {
        SubjectCategory::AllUpToDate
    };

    ClusterSummary {
        cluster_name: report.cluster.name.clone(),
        cluster_status: report.cluster.status,
        addons,
        nodegroups,
        subject,
    }
}

/// Render the notification body for a cluster report.
pub fn render_body(report: &ClusterReport, summary: &ClusterSummary) -> String {
    let mut out = String::new();
    render_cluster(&mut out, &report.cluster);

    out.push('\n');
    rule(&mut out, '=');
    render_addons(&mut out, report, &summary.addons);

    out.push('\n');
    rule(&mut out, '=');
    render_nodegroups(&mut out, report, &summary.nodegroups);

    out
}

fn rule(out: &mut String, ch: char) {
    out.extend(std::iter::repeat_n(ch, RULE_WIDTH));
    out.push('\n');
}

fn section_header(out: &mut String, title: &str) {
    let _ = writeln!(out, "{title}");
    rule(out, '-');
}

fn or_unknown(value: Option<&str>) -> &str {
    value.unwrap_or("unknown")
}

fn render_cluster(out: &mut String, cluster: &ClusterOutcome) {
    let current = or_unknown(cluster.current_version.as_deref());
    let target = cluster.target_version.as_deref().unwrap_or("N/A");

    let _ = writeln!(out, "Cluster: {}", cluster.name);
    let _ = writeln!(out, "Cluster Status: {}", cluster.status);
    let _ = writeln!(out, "Current Version: {current}");

    match cluster.status {
        ClusterStatus::UpToDate => {
            let latest = or_unknown(cluster.latest_available.as_deref());
            let _ = writeln!(out, "Latest Available: {latest}");
        }
        ClusterStatus::Blocked => {
            let _ = writeln!(out, "Next Version: {target}");
            let _ = writeln!(
                out,
                "Upgrade blocked: {} failing upgrade readiness checks",
                cluster.failing_checks.len()
            );
            for name in &cluster.failing_checks {
                let _ = writeln!(out, "  - {name}");
            }
        }
        ClusterStatus::Available => {
            let _ = writeln!(out, "Upgrade available: {current} -> {target}");
        }
        ClusterStatus::Upgrading => {
            let _ = writeln!(out, "Upgrade initiated: {current} -> {target}");
            if let Some(id) = &cluster.update_id {
                let _ = writeln!(out, "Update ID: {id}");
            }
        }
        ClusterStatus::Error => {
            let error = cluster.error.as_deref().unwrap_or("Unknown error");
            let _ = writeln!(out, "Error: {error}");
        }
    }
}

fn by_category<T: Categorized>(items: &[T], category: Category) -> impl Iterator<Item = &T> {
    items.iter().filter(move |i| i.category() == category)
}

fn render_addons(out: &mut String, report: &ClusterReport, counts: &Counts) {
    let _ = writeln!(out, "Total Addons: {}", counts.total);
    let _ = writeln!(out, "Up-to-Date: {}", counts.up_to_date);
    let _ = writeln!(out, "Updated: {}", counts.updated);
    let _ = writeln!(out, "Update Available: {}", counts.update_available);
    let _ = writeln!(out, "Failed: {}", counts.failed);
    if let Some(error) = &report.addon_listing_error {
        let _ = writeln!(out, "Listing Error: {error}");
    }
    out.push('\n');

    let addons = &report.addons;
    if counts.updated > 0 {
        section_header(out, "UPDATED ADDONS:");
        for a in by_category(addons, Category::Updated) {
            let _ = writeln!(out, "  Addon: {}", a.name);
            let _ = writeln!(
                out,
                "  Version: {} -> {}",
                a.current_version,
                or_unknown(a.target_version.as_deref())
            );
            let _ = writeln!(out, "  Authentication: {}\n", a.auth);
        }
    }
    if counts.failed > 0 {
        section_header(out, "FAILED ADDONS:");
        for a in by_category(addons, Category::Failed) {
            render_failed_addon(out, a);
        }
    }
    if counts.update_available > 0 {
        section_header(out, "UPDATE AVAILABLE (auto-upgrade disabled):");
        for a in by_category(addons, Category::UpdateAvailable) {
            let _ = writeln!(
                out,
                "  {}: {} -> {}",
                a.name,
                a.current_version,
                or_unknown(a.target_version.as_deref())
            );
        }
        out.push('\n');
    }
    if counts.up_to_date > 0 {
        section_header(out, "UP-TO-DATE ADDONS:");
        for a in by_category(addons, Category::UpToDate) {
            let _ = writeln!(out, "  {} ({}) - {}", a.name, a.current_version, a.auth);
        }
        out.push('\n');
    }
}

fn render_failed_addon(out: &mut String, addon: &AddonOutcome) {
    let _ = writeln!(out, "  Addon: {}", addon.name);
    let _ = writeln!(out, "  Current Version: {}", addon.current_version);
    let _ = writeln!(
        out,
        "  Target Version: {}",
        addon.target_version.as_deref().unwrap_or("N/A")
    );
    let _ = writeln!(out, "  Authentication: {}", addon.auth);
    let _ = writeln!(
        out,
        "  Error: {}\n",
        addon.error.as_deref().unwrap_or("Unknown error")
    );
}

fn render_nodegroups(out: &mut String, report: &ClusterReport, counts: &Counts) {
    let _ = writeln!(out, "Total Node Groups: {}", counts.total);
    let _ = writeln!(out, "Up-to-Date: {}", counts.up_to_date);
    let _ = writeln!(out, "Update Available: {}", counts.update_available);
    let _ = writeln!(out, "Updating: {}", counts.updated);
    let _ = writeln!(out, "Failed: {}", counts.failed);
    let _ = writeln!(out, "Skipped: {}", counts.blocked_or_skipped);
    if let Some(error) = &report.nodegroup_listing_error {
        let _ = writeln!(out, "Listing Error: {error}");
    }
    out.push('\n');

    let nodegroups = &report.nodegroups;
    if counts.updated > 0 {
        section_header(out, "UPDATING NODE GROUPS:");
        for ng in by_category(nodegroups, Category::Updated) {
            let _ = writeln!(out, "  Node Group: {}", ng.name);
            let _ = writeln!(
                out,
                "  Kubernetes Version: {} -> {}",
                or_unknown(ng.current_version.as_deref()),
                or_unknown(ng.target_version.as_deref())
            );
            let _ = writeln!(
                out,
                "  AMI Release: {} -> Latest",
                or_unknown(ng.ami_release.as_deref())
            );
            let _ = writeln!(
                out,
                "  Update ID: {}\n",
                or_unknown(ng.update_id.as_deref())
            );
        }
    }
    if counts.failed > 0 {
        section_header(out, "FAILED NODE GROUPS:");
        for ng in by_category(nodegroups, Category::Failed) {
            render_failed_nodegroup(out, &report.cluster.name, ng);
        }
    }
    if counts.update_available > 0 {
        section_header(out, "UPDATE AVAILABLE (auto-upgrade disabled):");
        for ng in by_category(nodegroups, Category::UpdateAvailable) {
            let _ = writeln!(
                out,
                "  {}: {} -> {}",
                ng.name,
                or_unknown(ng.current_version.as_deref()),
                or_unknown(ng.target_version.as_deref())
            );
        }
        out.push('\n');
    }
    if counts.up_to_date > 0 {
        section_header(out, "UP-TO-DATE NODE GROUPS:");
        for ng in by_category(nodegroups, Category::UpToDate) {
            let _ = writeln!(
                out,
                "  {} ({}, AMI: {})",
                ng.name,
                or_unknown(ng.current_version.as_deref()),
                or_unknown(ng.ami_release.as_deref())
            );
        }
        out.push('\n');
    }
    if counts.blocked_or_skipped > 0 {
        section_header(out, "SKIPPED (not ACTIVE):");
        for ng in by_category(nodegroups, Category::BlockedOrSkipped) {
            let reason = ng
                .error
                .clone()
                .unwrap_or_else(|| NodeGroupStatus::Skipped.to_string());
            let _ = writeln!(out, "  {}: {reason}", ng.name);
        }
        out.push('\n');
    }
}

/// Failures caused by pod disruption budgets need a manual forced update.
fn needs_force_hint(error: &str) -> bool {
    error.contains("PodEvictionFailure") || error.contains("PDB")
}

fn render_failed_nodegroup(out: &mut String, cluster_name: &str, ng: &NodeGroupOutcome) {
    let error = ng.error.as_deref().unwrap_or("Unknown error");
    let _ = writeln!(out, "  Node Group: {}", ng.name);
    let _ = writeln!(
        out,
        "  Current Version: {}",
        or_unknown(ng.current_version.as_deref())
    );
    let _ = writeln!(
        out,
        "  Target Version: {}",
        ng.target_version.as_deref().unwrap_or("N/A")
    );
    let _ = writeln!(out, "  Error: {error}");
    if needs_force_hint(error) {
        let _ = writeln!(out);
        let _ = writeln!(out, "  ACTION REQUIRED: To force update, run:");
        let _ = writeln!(out, "  aws eks update-nodegroup-version \\");
        let _ = writeln!(out, "    --cluster-name {cluster_name} \\");
        let _ = writeln!(out, "    --nodegroup-name {} \\", ng.name);
        let _ = writeln!(out, "    --force");
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthKind;
    use crate::outcome::AddonStatus;

    fn addon(name: &str, status: AddonStatus) -> AddonOutcome {
        AddonOutcome {
            name: name.to_string(),
            status,
            current_version: "v1.0.0-eksbuild.1".to_string(),
            target_version: Some("v1.1.0-eksbuild.1".to_string()),
            auth: AuthKind::None,
            update_id: None,
            error: (status == AddonStatus::Failed).then(|| "update rejected".to_string()),
        }
    }

    fn nodegroup(name: &str, status: NodeGroupStatus, error: Option<&str>) -> NodeGroupOutcome {
        NodeGroupOutcome {
            name: name.to_string(),
            status,
            current_version: Some("1.28".to_string()),
            target_version: Some("1.29".to_string()),
            ami_release: Some("1.28.5-20240110".to_string()),
            update_id: None,
            error: error.map(str::to_string),
        }
    }

    fn report(status: ClusterStatus) -> ClusterReport {
        ClusterReport::new(ClusterOutcome::new(
            "dev-cluster",
            status,
            Some("1.29".to_string()),
        ))
    }

    #[test]
    fn test_failure_takes_precedence_over_updates() {
        let mut r = report(ClusterStatus::UpToDate);
        r.addons = vec![
            addon("vpc-cni", AddonStatus::Updated),
            addon("coredns", AddonStatus::Updated),
            addon("kube-proxy", AddonStatus::Failed),
            addon("a", AddonStatus::UpToDate),
            addon("b", AddonStatus::UpToDate),
            addon("c", AddonStatus::UpToDate),
        ];

        let summary = summarize(&r);
        assert_eq!(summary.subject, SubjectCategory::Failed(1));
        assert_eq!(summary.addons.total, 6);
        assert_eq!(summary.addons.updated, 2);
        assert_eq!(summary.addons.failed, 1);
        assert_eq!(summary.addons.up_to_date, 3);
        assert_eq!(
            summary.subject_line(),
            "EKS Upgrade Summary - dev-cluster - 1 Failed"
        );
    }

    #[test]
    fn test_updates_over_up_to_date() {
        let mut r = report(ClusterStatus::UpToDate);
        r.addons = vec![
            addon("vpc-cni", AddonStatus::Updated),
            addon("coredns", AddonStatus::UpToDate),
        ];
        r.nodegroups = vec![nodegroup("ng-1", NodeGroupStatus::Updating, None)];

        assert_eq!(summarize(&r).subject, SubjectCategory::Updated(2));
    }

    #[test]
    fn test_cluster_upgrade_counts_as_update() {
        let r = report(ClusterStatus::Upgrading);
        assert_eq!(summarize(&r).subject, SubjectCategory::Updated(1));
    }

    #[test]
    fn test_cluster_error_counts_as_failure() {
        let r = ClusterReport::new(ClusterOutcome::error("dev", None, "AccessDenied"));
        assert_eq!(summarize(&r).subject, SubjectCategory::Failed(1));
    }

    #[test]
    fn test_blocked_and_available_subjects() {
        assert_eq!(
            summarize(&report(ClusterStatus::Blocked)).subject,
            SubjectCategory::Blocked
        );
        assert_eq!(
            summarize(&report(ClusterStatus::Available)).subject,
            SubjectCategory::UpdateAvailable(1)
        );
    }

    #[test]
    fn test_empty_report_is_well_formed() {
        let mut r = report(ClusterStatus::UpToDate);
        r.addon_listing_error = Some("[eks::addon] AccessDeniedException: denied".to_string());

        let summary = summarize(&r);
        assert_eq!(summary.addons, Counts::default());
        assert_eq!(summary.nodegroups, Counts::default());
        assert_eq!(summary.subject, SubjectCategory::AllUpToDate);

        let body = render_body(&r, &summary);
        assert!(body.contains("Total Addons: 0"));
        assert!(body.contains("Total Node Groups: 0"));
        assert!(body.contains("Listing Error: [eks::addon] AccessDeniedException: denied"));
    }

    #[test]
    fn test_body_sections_in_priority_order() {
        let mut r = report(ClusterStatus::UpToDate);
        r.addons = vec![
            addon("up", AddonStatus::UpToDate),
            addon("broken", AddonStatus::Failed),
            addon("fresh", AddonStatus::Updated),
        ];
        let body = render_body(&r, &summarize(&r));

        let updated = body.find("UPDATED ADDONS:").unwrap();
        let failed = body.find("FAILED ADDONS:").unwrap();
        let up_to_date = body.find("UP-TO-DATE ADDONS:").unwrap();
        assert!(updated < failed && failed < up_to_date);
        assert!(body.contains("Error: update rejected"));
    }

    #[test]
    fn test_skipped_nodegroup_shows_reason() {
        let mut r = report(ClusterStatus::UpToDate);
        r.nodegroups = vec![nodegroup(
            "ng-batch",
            NodeGroupStatus::Skipped,
            Some("Node group status is DEGRADED, not ACTIVE"),
        )];
        let summary = summarize(&r);
        assert_eq!(summary.nodegroups.blocked_or_skipped, 1);
        assert_eq!(summary.subject, SubjectCategory::AllUpToDate);

        let body = render_body(&r, &summary);
        assert!(body.contains("SKIPPED (not ACTIVE):"));
        assert!(body.contains("ng-batch: Node group status is DEGRADED, not ACTIVE"));
    }

    #[test]
    fn test_force_hint_for_eviction_failures() {
        let mut r = report(ClusterStatus::UpToDate);
        r.nodegroups = vec![
            nodegroup("ng-pdb", NodeGroupStatus::Failed, Some("PodEvictionFailure: too many pods")),
            nodegroup("ng-other", NodeGroupStatus::Failed, Some("InvalidParameterException")),
        ];
        let body = render_body(&r, &summarize(&r));
        assert_eq!(body.matches("ACTION REQUIRED").count(), 1);
        assert!(body.contains("--nodegroup-name ng-pdb"));
        assert!(body.contains("--cluster-name dev-cluster"));
    }

    #[test]
    fn test_blocked_cluster_lists_failing_checks() {
        let mut r = report(ClusterStatus::Blocked);
        r.cluster.target_version = Some("1.30".to_string());
        r.cluster.failing_checks = vec!["Deprecated APIs".to_string()];
        let body = render_body(&r, &summarize(&r));
        assert!(body.contains("Upgrade blocked: 1 failing upgrade readiness checks"));
        assert!(body.contains("  - Deprecated APIs"));
        assert!(body.contains("Next Version: 1.30"));
    }
}
