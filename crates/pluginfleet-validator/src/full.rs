//! Whole-package validation.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::frontmatter::{validate_agent_md, validate_skill_md, FileReport};
use crate::hygiene::scan_content;
use crate::paths::{self, SKILL_FILE};
use crate::plugin::validate_plugin_json;
use crate::report::ValidationReport;
use crate::structure::{audit_structure, StructureReport};

/// Every check run against one package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullValidation {
    pub path: PathBuf,
    pub plugin_json: ValidationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<StructureReport>,
    pub agents: Vec<FileReport>,
    pub skills: Vec<FileReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ValidationReport>,
    pub total_issues: usize,
    pub overall_passed: bool,
}

/// Run the manifest, structure, frontmatter and hygiene checks on `package`.
///
/// A missing package yields only the manifest section, holding the single
/// not-found issue.
pub fn validate_full_plugin(package: &Path) -> FullValidation {
    let plugin_json = validate_plugin_json(package);

    if !package.exists() {
        return FullValidation {
            path: package.to_path_buf(),
            total_issues: plugin_json.issues().len(),
            overall_passed: false,
            plugin_json,
            structure: None,
            agents: Vec::new(),
            skills: Vec::new(),
            content: None,
        };
    }

    let structure = audit_structure(package);

    let agents: Vec<FileReport> = paths::files_with_extension(&package.join("agents"), "md")
        .iter()
        .map(|file| validate_agent_md(file))
        .collect();

    let skills: Vec<FileReport> = paths::list_dir(&package.join("skills"))
        .unwrap_or_default()
        .into_iter()
        .filter(|dir| dir.is_dir())
        .map(|dir| dir.join(SKILL_FILE))
        .filter(|file| file.is_file())
        .map(|file| validate_skill_md(&file))
        .collect();

    let content = scan_content(package);

    let total_issues = plugin_json.issues().len()
        + structure.issues().len()
        + agents.iter().map(|a| a.issues.len()).sum::<usize>()
        + skills.iter().map(|s| s.issues.len()).sum::<usize>()
        + content.issues().len();

    FullValidation {
        path: package.to_path_buf(),
        plugin_json,
        structure: Some(structure),
        agents,
        skills,
        content: Some(content),
        total_issues,
        overall_passed: total_issues == 0,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    /// A package every check accepts.
    pub(crate) fn healthy_package() -> TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".claude-plugin")).unwrap();
        fs::write(
            root.join(".claude-plugin/plugin.json"),
            r#"{"name": "code-review", "version": "1.0.0", "description": "Reviews", "author": {"name": "me"}}"#,
        )
        .unwrap();
        fs::create_dir_all(root.join("agents")).unwrap();
        fs::write(
            root.join("agents/reviewer.md"),
            "---\nname: reviewer\ndescription: Reviews diffs\n---\nPrompt\n",
        )
        .unwrap();
        fs::create_dir_all(root.join("skills/summarize")).unwrap();
        fs::write(
            root.join("skills/summarize/SKILL.md"),
            "---\nname: summarize\ndescription: Summarizes\n---\n",
        )
        .unwrap();
        fs::write(root.join("README.md"), "# code-review\n").unwrap();
        dir
    }

    #[test]
    fn test_healthy_package_passes() {
        let dir = healthy_package();
        let full = validate_full_plugin(dir.path());
        assert_eq!(full.total_issues, 0, "{:#?}", full);
        assert!(full.overall_passed);
        assert_eq!(full.agents.len(), 1);
        assert_eq!(full.skills.len(), 1);
    }

    #[test]
    fn test_issues_are_summed_across_sections() {
        let dir = healthy_package();
        let root = dir.path();
        fs::write(root.join("agents/broken.md"), ">---\n").unwrap();
        fs::write(root.join("hooks.json"), r#"{"run": "${HOME}/x"}"#).unwrap();
        fs::create_dir_all(root.join(".claude-plugin/skills")).unwrap();

        let full = validate_full_plugin(root);
        assert_eq!(full.total_issues, 3);
        assert!(!full.overall_passed);
    }

    #[test]
    fn test_missing_package() {
        let dir = tempdir().unwrap();
        let full = validate_full_plugin(&dir.path().join("absent"));
        assert_eq!(full.total_issues, 1);
        assert!(!full.overall_passed);
        assert!(full.structure.is_none());
        assert!(full.content.is_none());
    }
}
