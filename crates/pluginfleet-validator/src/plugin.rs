//! Plugin manifest (`plugin.json`) validation.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::codes::E301;
use crate::paths::{self, ManifestLocation, COMPONENT_DIRS, METADATA_DIR};
use crate::report::{ReportBuilder, ValidationReport, PLUGIN_ISSUE_WEIGHT};

/// Lowercase letters, digits and hyphens.
pub(crate) static KEBAB_CASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("kebab-case regex"));

/// `X.Y.Z`, no pre-release or build metadata.
static SEMVER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("semver regex"));

/// Validate the plugin manifest of the package at `package`.
///
/// The manifest is expected at `.claude-plugin/plugin.json`. One found at the
/// package root is still checked, with a location issue.
pub fn validate_plugin_json(package: &Path) -> ValidationReport {
    if !package.exists() {
        return ValidationReport::not_found(package);
    }

    let mut report = ReportBuilder::new(package);

    let Some(location) = paths::find_plugin_manifest(package) else {
        report
            .issue("plugin.json not found")
            .recommend(format!("Create {}/plugin.json", METADATA_DIR));
        return report.build();
    };

    report.at(location.path());
    if let ManifestLocation::Root(_) = location {
        report.issue(format!(
            "LOCATION ERROR: plugin.json should be in {}/",
            METADATA_DIR
        ));
    }

    let manifest = match parse_object(location.path(), &mut report) {
        Some(manifest) => manifest,
        None => return report.build(),
    };

    check_fields(&manifest, &mut report);
    report.manifest(Value::Object(manifest));
    report.build_scored(PLUGIN_ISSUE_WEIGHT)
}

/// Read and parse a JSON object, recording why not on failure.
pub(crate) fn parse_object(path: &Path, report: &mut ReportBuilder) -> Option<Map<String, Value>> {
    let content = match paths::read_text(path) {
        Ok(content) => content,
        Err(e) => {
            report.issue(e.to_string());
            return None;
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            report
                .issue("INVALID MANIFEST: top-level value must be a JSON object")
                .recommend("Fix JSON syntax");
            None
        }
        Err(e) => {
            report
                .issue(format!("JSON SYNTAX ERROR: {}", e))
                .recommend("Fix JSON syntax");
            None
        }
    }
}

fn check_fields(manifest: &Map<String, Value>, report: &mut ReportBuilder) {
    match manifest.get("name") {
        None => {
            report.issue("MISSING REQUIRED FIELD: name");
        }
        Some(Value::String(name)) if KEBAB_CASE_RE.is_match(name) => {}
        Some(name) => {
            report.issue(format!("INVALID NAME: '{}' must be kebab-case", display(name)));
        }
    }

    match manifest.get("version") {
        None => {
            report.recommend("Add 'version' field (semver: X.Y.Z)");
        }
        Some(Value::String(version)) if SEMVER_RE.is_match(version) => {}
        Some(version) => {
            report.issue(format!("INVALID VERSION: '{}' must be semver", display(version)));
        }
    }

    if !manifest.contains_key("description") {
        report.recommend("Add 'description' field");
    }
    if !manifest.contains_key("author") {
        report.recommend("Add 'author' field");
    }

    for field in COMPONENT_DIRS {
        if let Some(Value::String(value)) = manifest.get(field) {
            if value.starts_with("./") {
                report.issue(format!(
                    "{}: '{}' uses directory path (use file paths or delete)",
                    E301, field
                ));
            }
        }
    }
}

/// Strings without their JSON quotes, anything else as JSON.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
