//! Marketplace manifest (`marketplace.json`) validation.

use std::path::Path;

use serde_json::{Map, Value};

use crate::codes::E303;
use crate::paths::{MARKETPLACE_MANIFEST, METADATA_DIR};
use crate::plugin::{display, parse_object, KEBAB_CASE_RE};
use crate::report::{ReportBuilder, ValidationReport, MARKETPLACE_ISSUE_WEIGHT};

/// Validate a marketplace manifest.
///
/// `target` is either the manifest file itself or a marketplace directory,
/// in which case `.claude-plugin/marketplace.json` inside it is checked.
pub fn validate_marketplace_json(target: &Path) -> ValidationReport {
    if !target.exists() {
        return ValidationReport::not_found(target);
    }

    let file = if target.is_dir() {
        target.join(METADATA_DIR).join(MARKETPLACE_MANIFEST)
    } else {
        target.to_path_buf()
    };

    let mut report = ReportBuilder::new(target);
    if !file.is_file() {
        report
            .issue("marketplace.json not found")
            .recommend(format!("Create {}/{}", METADATA_DIR, MARKETPLACE_MANIFEST));
        return report.build();
    }

    report.at(&file);
    let Some(manifest) = parse_object(&file, &mut report) else {
        return report.build();
    };

    check_fields(&manifest, &mut report);
    report.manifest(Value::Object(manifest));
    report.build_scored(MARKETPLACE_ISSUE_WEIGHT)
}

fn check_fields(manifest: &Map<String, Value>, report: &mut ReportBuilder) {
    let marketplace_name = match manifest.get("name") {
        None => {
            report.issue("MISSING REQUIRED FIELD: name");
            None
        }
        Some(Value::String(name)) if KEBAB_CASE_RE.is_match(name) => Some(name.as_str()),
        Some(Value::String(name)) => {
            report.issue("INVALID NAME FORMAT: Use kebab-case");
            Some(name.as_str())
        }
        Some(_) => {
            report.issue("INVALID NAME FORMAT: Use kebab-case");
            None
        }
    };

    match manifest.get("owner") {
        None => {
            report.issue("MISSING REQUIRED FIELD: owner");
        }
        Some(Value::Object(owner)) if owner.contains_key("name") => {}
        Some(_) => {
            report.issue("MISSING REQUIRED FIELD: owner.name");
        }
    }

    match manifest.get("plugins") {
        None => {
            report.issue("MISSING REQUIRED FIELD: plugins");
        }
        Some(Value::Array(plugins)) => {
            for (i, entry) in plugins.iter().enumerate() {
                check_entry(i, entry, marketplace_name, report);
            }
        }
        Some(_) => {
            report.issue("INVALID FIELD: plugins must be an array");
        }
    }
}

fn check_entry(i: usize, entry: &Value, marketplace_name: Option<&str>, report: &mut ReportBuilder) {
    let Value::Object(entry) = entry else {
        report.issue(format!("PLUGIN[{}]: Entry must be an object", i));
        return;
    };

    match entry.get("name") {
        None => {
            report.issue(format!("PLUGIN[{}]: Missing 'name' field", i));
        }
        Some(name) => {
            if marketplace_name.is_some_and(|m| *name == Value::from(m)) {
                report.issue(format!(
                    "{} NAME COLLISION: marketplace.name '{}' equals plugins[{}].name. Rename marketplace!",
                    E303,
                    display(name),
                    i
                ));
            }
        }
    }

    match entry.get("source") {
        None => {
            report.issue(format!("PLUGIN[{}]: Missing 'source' field", i));
        }
        Some(Value::String(source)) if source.starts_with("./") => {}
        Some(_) => {
            report.issue(format!("PLUGIN[{}]: Source must start with './'", i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn marketplace(manifest: &str) -> TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(METADATA_DIR)).unwrap();
        fs::write(
            dir.path().join(METADATA_DIR).join(MARKETPLACE_MANIFEST),
            manifest,
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_valid_marketplace() {
        let dir = marketplace(
            r#"{"name": "tools-market", "owner": {"name": "me"},
                "plugins": [{"name": "linter", "source": "./plugins/linter"}]}"#,
        );
        let report = validate_marketplace_json(dir.path());
        assert!(report.passed(), "issues: {:?}", report.issues());
        assert_eq!(report.validation_score(), Some(100));
    }

    #[test]
    fn test_file_target_is_accepted() {
        let dir = marketplace(r#"{"name": "m", "owner": {"name": "me"}, "plugins": []}"#);
        let file = dir.path().join(METADATA_DIR).join(MARKETPLACE_MANIFEST);
        let report = validate_marketplace_json(&file);
        assert!(report.passed());
        assert_eq!(report.path(), file.as_path());
    }

    #[test]
    fn test_name_collision() {
        let dir = marketplace(
            r#"{"name": "linter", "owner": {"name": "me"},
                "plugins": [{"name": "linter", "source": "./linter"}]}"#,
        );
        let report = validate_marketplace_json(dir.path());
        assert_eq!(report.issues().len(), 1);
        assert!(report.issues()[0].starts_with("E303 NAME COLLISION"));
        assert_eq!(report.validation_score(), Some(85));
    }

    #[test]
    fn test_required_fields() {
        let dir = marketplace(r#"{"owner": {}}"#);
        let report = validate_marketplace_json(dir.path());
        assert_eq!(
            report.issues(),
            [
                "MISSING REQUIRED FIELD: name",
                "MISSING REQUIRED FIELD: owner.name",
                "MISSING REQUIRED FIELD: plugins",
            ]
        );
        assert_eq!(report.validation_score(), Some(55));
    }

    #[test]
    fn test_plugin_entries() {
        let dir = marketplace(
            r#"{"name": "m", "owner": {"name": "me"},
                "plugins": [{"source": "plugins/a"}, {"name": "b"}, 7]}"#,
        );
        let report = validate_marketplace_json(dir.path());
        assert_eq!(
            report.issues(),
            [
                "PLUGIN[0]: Missing 'name' field",
                "PLUGIN[0]: Source must start with './'",
                "PLUGIN[1]: Missing 'source' field",
                "PLUGIN[2]: Entry must be an object",
            ]
        );
    }

    #[test]
    fn test_bad_name_format() {
        let dir = marketplace(r#"{"name": "My Market", "owner": {"name": "me"}, "plugins": []}"#);
        let report = validate_marketplace_json(dir.path());
        assert_eq!(report.issues(), ["INVALID NAME FORMAT: Use kebab-case"]);
    }

    #[test]
    fn test_missing_manifest_in_directory() {
        let dir = tempdir().unwrap();
        let report = validate_marketplace_json(dir.path());
        assert_eq!(report.issues(), ["marketplace.json not found"]);
    }
}
