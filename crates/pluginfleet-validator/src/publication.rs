//! Publication gate.

use std::path::Path;

use serde::Serialize;

use crate::full::validate_full_plugin;
use crate::paths::README;

/// Individual gate conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PublicationChecks {
    pub readme_exists: bool,
    pub no_critical_issues: bool,
    pub has_agents_or_skills: bool,
}

impl PublicationChecks {
    pub fn all(&self) -> bool {
        self.readme_exists && self.no_critical_issues && self.has_agents_or_skills
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicationReport {
    pub passed: bool,
    pub publication_ready: bool,
    pub checks: PublicationChecks,
    pub total_issues: usize,
    pub verdict: &'static str,
}

/// Ready when full validation is clean, a top-level readme exists and the
/// package ships at least one agent or skill.
pub fn check_publication_ready(package: &Path) -> PublicationReport {
    let full = validate_full_plugin(package);

    let checks = PublicationChecks {
        readme_exists: package.join(README).is_file(),
        no_critical_issues: full.total_issues == 0,
        has_agents_or_skills: !full.agents.is_empty() || !full.skills.is_empty(),
    };
    let ready = checks.all();

    PublicationReport {
        passed: ready,
        publication_ready: ready,
        checks,
        total_issues: full.total_issues,
        verdict: if ready {
            "READY FOR PUBLICATION"
        } else {
            "NOT READY"
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::full::tests::healthy_package;
    use std::fs;

    #[test]
    fn test_ready() {
        let dir = healthy_package();
        let report = check_publication_ready(dir.path());
        assert!(report.publication_ready);
        assert_eq!(report.verdict, "READY FOR PUBLICATION");
    }

    #[test]
    fn test_missing_readme_blocks() {
        let dir = healthy_package();
        fs::remove_file(dir.path().join("README.md")).unwrap();
        let report = check_publication_ready(dir.path());
        assert!(!report.passed);
        assert!(!report.checks.readme_exists);
        assert!(report.checks.no_critical_issues);
    }

    #[test]
    fn test_no_components_blocks() {
        let dir = healthy_package();
        fs::remove_dir_all(dir.path().join("agents")).unwrap();
        fs::remove_dir_all(dir.path().join("skills")).unwrap();
        let report = check_publication_ready(dir.path());
        assert!(!report.checks.has_agents_or_skills);
        assert_eq!(report.verdict, "NOT READY");
    }

    #[test]
    fn test_issues_block() {
        let dir = healthy_package();
        fs::write(dir.path().join("plugin.json"), "{}").unwrap();
        let report = check_publication_ready(dir.path());
        assert!(!report.checks.no_critical_issues);
        assert_eq!(report.total_issues, 1);
    }
}
