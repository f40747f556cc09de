//! Checks behind the lifecycle role: health, diagnosis, fix proposals and
//! install-source inspection. None of them modify the filesystem.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::codes::{self, E001, E002, E003, E201};
use crate::hygiene::scan_content;
use crate::paths::{self, METADATA_DIR, PLUGIN_MANIFEST};
use crate::report::ReportBuilder;
use crate::structure::layout_findings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
    NotFound,
}

impl HealthStatus {
    /// Band for a score in `0..=100`.
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => HealthStatus::Healthy,
            50..=79 => HealthStatus::Warning,
            _ => HealthStatus::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthChecks {
    pub claude_plugin_dir: bool,
    pub plugin_json: bool,
    pub agents_dir: bool,
    pub skills_dir: bool,
}

impl HealthChecks {
    fn passed(&self) -> usize {
        [
            self.claude_plugin_dir,
            self.plugin_json,
            self.agents_dir,
            self.skills_dir,
        ]
        .into_iter()
        .filter(|c| *c)
        .count()
    }

    const TOTAL: usize = 4;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Components {
    pub agents: usize,
    pub skills: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub plugin: String,
    pub status: HealthStatus,
    pub health_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Score the presence of the metadata directory, manifest, `agents/` and
/// `skills/` of `package`.
pub fn check_health(plugin: &str, package: &Path) -> HealthReport {
    if !package.exists() {
        return HealthReport {
            plugin: plugin.to_string(),
            status: HealthStatus::NotFound,
            health_score: 0,
            checks: None,
            components: None,
            path: package.to_path_buf(),
            message: Some(format!("Plugin directory not found: {}", package.display())),
        };
    }

    let checks = HealthChecks {
        claude_plugin_dir: package.join(METADATA_DIR).is_dir(),
        plugin_json: package.join(METADATA_DIR).join(PLUGIN_MANIFEST).is_file(),
        agents_dir: package.join("agents").is_dir(),
        skills_dir: package.join("skills").is_dir(),
    };
    let health_score = u8::try_from(checks.passed() * 100 / HealthChecks::TOTAL).unwrap_or(0);

    let components = Components {
        agents: paths::files_with_extension(&package.join("agents"), "md").len(),
        skills: paths::count_entries(&package.join("skills")),
    };

    HealthReport {
        plugin: plugin.to_string(),
        status: HealthStatus::from_score(health_score),
        health_score,
        checks: Some(checks),
        components: Some(components),
        path: package.to_path_buf(),
        message: None,
    }
}

/// Issues found by [`diagnose`], each paired with a recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnosis {
    pub plugin: String,
    pub found: bool,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub error_codes: Vec<String>,
    pub issue_count: usize,
}

/// Structural problems (E001 to E003) and shell expansion (E201) in
/// `package`.
pub fn diagnose(plugin: &str, package: &Path) -> Diagnosis {
    let mut report = ReportBuilder::new(package);

    if !package.exists() {
        report
            .issue("Plugin directory not found")
            .recommend("Check plugin name spelling");
        let report = report.build();
        return Diagnosis {
            plugin: plugin.to_string(),
            found: false,
            issues: report.issues().to_vec(),
            recommendations: report.recommendations().to_vec(),
            error_codes: Vec::new(),
            issue_count: report.issues().len(),
        };
    }

    for finding in layout_findings(package) {
        report.issue(finding.issue()).recommend(finding.remedy);
    }

    let content = scan_content(package);
    for issue in content.issues() {
        report.issue(issue.clone());
        if codes::code_of(issue) == Some(E201) {
            report.recommend("Replace shell expansions with absolute paths");
        }
    }

    let report = report.build();
    let error_codes = report
        .issues()
        .iter()
        .filter_map(|i| codes::code_of(i))
        .map(str::to_string)
        .collect();

    Diagnosis {
        plugin: plugin.to_string(),
        found: true,
        issues: report.issues().to_vec(),
        recommendations: report.recommendations().to_vec(),
        error_codes,
        issue_count: report.issues().len(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FixStatus {
    NoFixesNeeded,
    FixesProposed,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixProposal {
    pub error: &'static str,
    pub fix: &'static str,
    pub auto_fixable: bool,
}

/// Fixes that would resolve a diagnosis. Proposals only; applying them
/// needs confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixPlan {
    pub plugin: String,
    pub status: FixStatus,
    pub fixes: Vec<FixProposal>,
    pub message: String,
    pub requires_confirmation: bool,
}

pub fn propose_fixes(diagnosis: &Diagnosis) -> FixPlan {
    let plan = |status, fixes: Vec<FixProposal>, message: &str| FixPlan {
        plugin: diagnosis.plugin.clone(),
        requires_confirmation: !fixes.is_empty(),
        status,
        fixes,
        message: message.to_string(),
    };

    if !diagnosis.found {
        return plan(FixStatus::NotFound, Vec::new(), "Plugin directory not found");
    }
    if diagnosis.issue_count == 0 {
        return plan(
            FixStatus::NoFixesNeeded,
            Vec::new(),
            "Plugin has no issues to fix",
        );
    }

    let fixes = diagnosis
        .issues
        .iter()
        .filter_map(|issue| fix_for(codes::code_of(issue)?))
        .collect();

    plan(
        FixStatus::FixesProposed,
        fixes,
        "Fixes proposed - confirm to apply",
    )
}

fn fix_for(code: &str) -> Option<FixProposal> {
    let (error, fix, auto_fixable) = match code {
        E001 => (E001, "Convert .claude-plugin file to directory", true),
        E002 => (E002, "Move plugin.json to .claude-plugin/", true),
        E003 => (E003, "Move component directories to plugin root", true),
        E201 => (
            E201,
            "Replace shell expansions (requires manual path input)",
            false,
        ),
        _ => return None,
    };
    Some(FixProposal {
        error,
        fix,
        auto_fixable,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallStatus {
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallCheck {
    pub status: InstallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_name: Option<String>,
    pub source: PathBuf,
    pub message: String,
    pub requires_confirmation: bool,
}

impl InstallCheck {
    fn failed(source: &Path, message: impl Into<String>) -> Self {
        Self {
            status: InstallStatus::Failed,
            plugin_name: None,
            source: source.to_path_buf(),
            message: message.into(),
            requires_confirmation: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == InstallStatus::Ready
    }
}

/// Check that `source` holds an installable package: it exists and has a
/// parseable manifest in either accepted location.
pub fn inspect_install_source(source: &Path) -> InstallCheck {
    if !source.exists() {
        return InstallCheck::failed(
            source,
            format!("Source path not found: {}", source.display()),
        );
    }

    let Some(location) = paths::find_plugin_manifest(source) else {
        return InstallCheck::failed(source, "No plugin.json found");
    };

    let manifest = paths::read_text(location.path())
        .ok()
        .and_then(|content| serde_json::from_str::<Value>(&content).ok());
    let Some(manifest) = manifest else {
        return InstallCheck::failed(source, "Invalid plugin.json (JSON parse error)");
    };

    let plugin_name = manifest
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        });

    InstallCheck {
        status: InstallStatus::Ready,
        plugin_name,
        source: source.to_path_buf(),
        message: "Plugin validated - ready for installation".to_string(),
        requires_confirmation: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::full::tests::healthy_package;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_health_bands() {
        assert_eq!(HealthStatus::from_score(100), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_score(80), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_score(75), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_score(50), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_score(25), HealthStatus::Critical);
    }

    #[test]
    fn test_health_of_healthy_package() {
        let dir = healthy_package();
        let report = check_health("code-review", dir.path());
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.health_score, 100);
        assert_eq!(
            report.components,
            Some(Components {
                agents: 1,
                skills: 1
            })
        );
    }

    #[test]
    fn test_health_of_bare_directory() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("agents")).unwrap();
        fs::create_dir(dir.path().join("skills")).unwrap();
        let report = check_health("bare", dir.path());
        assert_eq!(report.health_score, 50);
        assert_eq!(report.status, HealthStatus::Warning);
    }

    #[test]
    fn test_health_of_missing_plugin() {
        let dir = tempdir().unwrap();
        let report = check_health("ghost", &dir.path().join("ghost"));
        assert_eq!(report.status, HealthStatus::NotFound);
        assert_eq!(report.health_score, 0);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "NOT_FOUND");
    }

    #[test]
    fn test_diagnose_pairs_issues_with_recommendations() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("plugin.json"), r#"{"cmd": "$(pwd)"}"#).unwrap();

        let diagnosis = diagnose("broken", dir.path());
        assert_eq!(diagnosis.issue_count, 3);
        assert_eq!(diagnosis.recommendations.len(), 3);
        assert_eq!(diagnosis.error_codes, ["E002", "E002", "E201"]);
    }

    #[test]
    fn test_fix_plan() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".claude-plugin"), "").unwrap();
        fs::write(dir.path().join("hooks.json"), r#"{"p": "~/x"}"#).unwrap();

        let plan = propose_fixes(&diagnose("broken", dir.path()));
        assert_eq!(plan.status, FixStatus::FixesProposed);
        assert!(plan.requires_confirmation);
        let summary: Vec<(&str, bool)> = plan
            .fixes
            .iter()
            .map(|f| (f.error, f.auto_fixable))
            .collect();
        assert_eq!(summary, [("E001", true), ("E201", false)]);
    }

    #[test]
    fn test_fix_plan_for_clean_package() {
        let dir = healthy_package();
        let plan = propose_fixes(&diagnose("code-review", dir.path()));
        assert_eq!(plan.status, FixStatus::NoFixesNeeded);
        assert!(plan.fixes.is_empty());
    }

    #[test]
    fn test_install_source() {
        let dir = healthy_package();
        let check = inspect_install_source(dir.path());
        assert!(check.is_ready());
        assert_eq!(check.plugin_name.as_deref(), Some("code-review"));

        let missing = inspect_install_source(&dir.path().join("nope"));
        assert_eq!(missing.status, InstallStatus::Failed);

        let empty = tempdir().unwrap();
        assert_eq!(
            inspect_install_source(empty.path()).message,
            "No plugin.json found"
        );

        fs::write(empty.path().join("plugin.json"), "{oops").unwrap();
        assert_eq!(
            inspect_install_source(empty.path()).message,
            "Invalid plugin.json (JSON parse error)"
        );
    }
}
