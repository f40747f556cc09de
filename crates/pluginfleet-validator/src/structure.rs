//! Directory layout audit.

use std::path::Path;

use serde::Serialize;

use crate::codes::{E001, E002, E003};
use crate::paths::{self, COMPONENT_DIRS, METADATA_DIR, PLUGIN_MANIFEST};
use crate::report::{ReportBuilder, ValidationReport};

/// Component counts of a package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    /// `agents/*.md`
    pub agents: usize,
    /// Entries under `skills/`
    pub skills: usize,
    /// `commands/*.md`
    pub commands: usize,
}

impl Inventory {
    pub fn of(package: &Path) -> Self {
        Self {
            agents: paths::files_with_extension(&package.join("agents"), "md").len(),
            skills: paths::count_entries(&package.join("skills")),
            commands: paths::files_with_extension(&package.join("commands"), "md").len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureReport {
    #[serde(flatten)]
    pub report: ValidationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Inventory>,
}

impl StructureReport {
    pub fn passed(&self) -> bool {
        self.report.passed()
    }

    pub fn issues(&self) -> &[String] {
        self.report.issues()
    }
}

/// Check the metadata directory and component placement of `package`.
pub fn audit_structure(package: &Path) -> StructureReport {
    if !package.exists() {
        return StructureReport {
            report: ValidationReport::not_found(package),
            inventory: None,
        };
    }

    let mut report = ReportBuilder::new(package);
    for finding in layout_findings(package) {
        report.issue(finding.issue());
    }

    StructureReport {
        report: report.build(),
        inventory: Some(Inventory::of(package)),
    }
}

/// A layout problem and how to remedy it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Finding {
    pub code: &'static str,
    pub message: String,
    pub remedy: String,
}

impl Finding {
    fn new(code: &'static str, message: String, remedy: impl Into<String>) -> Self {
        Self {
            code,
            message,
            remedy: remedy.into(),
        }
    }

    pub fn issue(&self) -> String {
        format!("{}: {}", self.code, self.message)
    }
}

/// E001, E002 and E003 findings for an existing package.
pub(crate) fn layout_findings(package: &Path) -> Vec<Finding> {
    let mut findings = Vec::new();
    let metadata = package.join(METADATA_DIR);

    if metadata.is_file() {
        findings.push(Finding::new(
            E001,
            format!("{} is FILE, should be DIRECTORY", METADATA_DIR),
            format!("Convert {} file to directory", METADATA_DIR),
        ));
    } else if !metadata.exists() {
        findings.push(Finding::new(
            E002,
            format!("{}/ directory missing", METADATA_DIR),
            format!("Create {}/ directory with {}", METADATA_DIR, PLUGIN_MANIFEST),
        ));
    }

    if package.join(PLUGIN_MANIFEST).exists() {
        findings.push(Finding::new(
            E002,
            format!("{} at root (should be in {}/)", PLUGIN_MANIFEST, METADATA_DIR),
            format!("Move {} to {}/", PLUGIN_MANIFEST, METADATA_DIR),
        ));
    }

    if metadata.is_dir() {
        for component in COMPONENT_DIRS {
            if metadata.join(component).exists() {
                findings.push(Finding::new(
                    E003,
                    format!("{}/ inside {}/ (move to root)", component, METADATA_DIR),
                    format!("Move {}/ to plugin root", component),
                ));
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_well_formed_package() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".claude-plugin")).unwrap();
        fs::create_dir_all(dir.path().join("agents")).unwrap();
        fs::create_dir_all(dir.path().join("skills/one")).unwrap();
        fs::create_dir_all(dir.path().join("skills/two")).unwrap();
        fs::write(dir.path().join("agents/a.md"), "").unwrap();
        fs::write(dir.path().join("agents/b.txt"), "").unwrap();

        let report = audit_structure(dir.path());
        assert!(report.passed(), "issues: {:?}", report.issues());
        assert_eq!(
            report.inventory,
            Some(Inventory {
                agents: 1,
                skills: 2,
                commands: 0
            })
        );
    }

    #[test]
    fn test_metadata_is_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".claude-plugin"), "").unwrap();

        let report = audit_structure(dir.path());
        assert_eq!(
            report.issues(),
            ["E001: .claude-plugin is FILE, should be DIRECTORY"]
        );
    }

    #[test]
    fn test_missing_metadata_and_root_manifest() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("plugin.json"), "{}").unwrap();

        let report = audit_structure(dir.path());
        assert_eq!(
            report.issues(),
            [
                "E002: .claude-plugin/ directory missing",
                "E002: plugin.json at root (should be in .claude-plugin/)",
            ]
        );
    }

    #[test]
    fn test_nested_components() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".claude-plugin/agents")).unwrap();
        fs::create_dir_all(dir.path().join(".claude-plugin/hooks")).unwrap();

        let report = audit_structure(dir.path());
        assert_eq!(
            report.issues(),
            [
                "E003: agents/ inside .claude-plugin/ (move to root)",
                "E003: hooks/ inside .claude-plugin/ (move to root)",
            ]
        );
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        let report = audit_structure(&dir.path().join("nope"));
        assert!(!report.passed());
        assert_eq!(report.issues().len(), 1);
        assert!(report.inventory.is_none());
    }
}
