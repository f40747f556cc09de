//! Validation reports.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

/// Score deducted per issue in a plugin manifest.
pub const PLUGIN_ISSUE_WEIGHT: u8 = 20;
/// Score deducted per issue in a marketplace manifest.
pub const MARKETPLACE_ISSUE_WEIGHT: u8 = 15;

/// Outcome of one check.
///
/// `passed` is true exactly when `issues` is empty; reports can only be
/// built through [`ReportBuilder`] or [`ValidationReport::not_found`], which
/// both derive it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    passed: bool,
    path: PathBuf,
    issues: Vec<String>,
    recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    manifest: Option<Value>,
}

impl ValidationReport {
    /// A report for a target that does not exist.
    pub fn not_found(path: &Path) -> Self {
        Self {
            passed: false,
            path: path.to_path_buf(),
            issues: vec![format!("Not found: {}", path.display())],
            recommendations: Vec::new(),
            validation_score: None,
            manifest: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn validation_score(&self) -> Option<u8> {
        self.validation_score
    }

    /// The parsed manifest, when the check read one.
    pub fn manifest(&self) -> Option<&Value> {
        self.manifest.as_ref()
    }
}

/// Collects findings in detection order.
#[derive(Debug)]
pub struct ReportBuilder {
    path: PathBuf,
    issues: Vec<String>,
    recommendations: Vec<String>,
    manifest: Option<Value>,
}

impl ReportBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            issues: Vec::new(),
            recommendations: Vec::new(),
            manifest: None,
        }
    }

    /// Record a blocking finding.
    pub fn issue(&mut self, issue: impl Into<String>) -> &mut Self {
        self.issues.push(issue.into());
        self
    }

    /// Record an advisory finding.
    pub fn recommend(&mut self, recommendation: impl Into<String>) -> &mut Self {
        self.recommendations.push(recommendation.into());
        self
    }

    /// Change the reported path, e.g. once the manifest file is located.
    pub fn at(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.path = path.into();
        self
    }

    pub fn manifest(&mut self, manifest: Value) -> &mut Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// Finish without a score.
    pub fn build(self) -> ValidationReport {
        self.finish(None)
    }

    /// Finish with `100 - issues * weight`, floored at zero.
    pub fn build_scored(self, weight: u8) -> ValidationReport {
        let score = score(self.issues.len(), weight);
        self.finish(Some(score))
    }

    fn finish(self, validation_score: Option<u8>) -> ValidationReport {
        ValidationReport {
            passed: self.issues.is_empty(),
            path: self.path,
            issues: self.issues,
            recommendations: self.recommendations,
            validation_score,
            manifest: self.manifest,
        }
    }
}

/// `100 - issues * weight`, never below zero.
pub fn score(issues: usize, weight: u8) -> u8 {
    let penalty = issues.saturating_mul(usize::from(weight));
    u8::try_from(100usize.saturating_sub(penalty)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passed_tracks_issues() {
        let clean = ReportBuilder::new("/p").build();
        assert!(clean.passed());

        let mut builder = ReportBuilder::new("/p");
        builder.recommend("Add 'author' field");
        assert!(builder.build().passed(), "recommendations never fail a report");

        let mut builder = ReportBuilder::new("/p");
        builder.issue("MISSING REQUIRED FIELD: name");
        assert!(!builder.build().passed());
    }

    #[test]
    fn test_score_decreases_by_weight_and_floors() {
        assert_eq!(score(0, PLUGIN_ISSUE_WEIGHT), 100);
        assert_eq!(score(1, PLUGIN_ISSUE_WEIGHT), 80);
        assert_eq!(score(2, PLUGIN_ISSUE_WEIGHT), 60);
        assert_eq!(score(5, PLUGIN_ISSUE_WEIGHT), 0);
        assert_eq!(score(9, PLUGIN_ISSUE_WEIGHT), 0);

        assert_eq!(score(1, MARKETPLACE_ISSUE_WEIGHT), 85);
        assert_eq!(score(6, MARKETPLACE_ISSUE_WEIGHT), 10);
        assert_eq!(score(7, MARKETPLACE_ISSUE_WEIGHT), 0);
    }

    #[test]
    fn test_not_found_has_single_issue() {
        let report = ValidationReport::not_found(Path::new("/missing"));
        assert!(!report.passed());
        assert_eq!(report.issues().len(), 1);
        assert!(report.issues()[0].contains("Not found"));
        assert!(report.recommendations().is_empty());
        assert_eq!(report.validation_score(), None);
        assert!(report.manifest().is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let mut builder = ReportBuilder::new("/p/.claude-plugin/plugin.json");
        builder.issue("INVALID NAME: 'Bad' must be kebab-case");
        let json = serde_json::to_value(builder.build_scored(PLUGIN_ISSUE_WEIGHT)).unwrap();

        assert_eq!(json["passed"], false);
        assert_eq!(json["validation_score"], 80);
        assert_eq!(json["issues"].as_array().unwrap().len(), 1);
        assert!(json.get("manifest").is_none());
    }
}
