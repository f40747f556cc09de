use std::path::Path;

use pluginfleet_core::{ManifestCommand, ValidationKind};
use pluginfleet_validator::{
    audit_structure, check_publication_ready, check_schema, resolve, validate_full_plugin,
    validate_marketplace_json, validate_plugin_json,
};
use tracing::info;

use super::{blocking, HandlerError, Outcome};

/// Manifest results are `success` only when the check passed.
pub(super) async fn handle(cmd: ManifestCommand, root: &Path) -> Result<Outcome, HandlerError> {
    match cmd {
        ManifestCommand::Validate { kind, path } => {
            info!(kind = kind.as_str(), path = %path, "Validating");
            let target = resolve(root, &path);
            match kind {
                ValidationKind::Plugin => {
                    let report = blocking(move || validate_plugin_json(&target)).await?;
                    Outcome::verdict(report.passed(), &report)
                }
                ValidationKind::Manifest => {
                    let report = blocking(move || validate_marketplace_json(&target)).await?;
                    Outcome::verdict(report.passed(), &report)
                }
                ValidationKind::Full => {
                    let full = blocking(move || validate_full_plugin(&target)).await?;
                    Outcome::verdict(full.overall_passed, &full)
                }
            }
        }
        ManifestCommand::CheckSchema { path, schema_type } => {
            info!(schema_type = schema_type.as_str(), path = %path, "Checking schema");
            let target = resolve(root, &path);
            let report = blocking(move || check_schema(&target, schema_type)).await?;
            Outcome::verdict(report.passed(), &report)
        }
        ManifestCommand::CheckStructure { path } => {
            info!(path = %path, "Auditing structure");
            let target = resolve(root, &path);
            let report = blocking(move || audit_structure(&target)).await?;
            Outcome::verdict(report.passed(), &report)
        }
        ManifestCommand::PublicationReady { path } => {
            info!(path = %path, "Checking publication readiness");
            let target = resolve(root, &path);
            let report = blocking(move || check_publication_ready(&target)).await?;
            Outcome::verdict(report.passed, &report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pluginfleet_core::ResultStatus;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_status_follows_verdict() {
        let root = tempdir().unwrap();
        let good = root.path().join("good");
        fs::create_dir_all(good.join(".claude-plugin")).unwrap();
        fs::write(good.join(".claude-plugin/plugin.json"), r#"{"name": "good"}"#).unwrap();

        let outcome = handle(
            ManifestCommand::Validate {
                kind: ValidationKind::Plugin,
                path: "good".into(),
            },
            root.path(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.status, ResultStatus::Success);
        assert_eq!(outcome.result["validation_score"], 100);

        let outcome = handle(
            ManifestCommand::CheckStructure {
                path: "missing".into(),
            },
            root.path(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.status, ResultStatus::Failed);
        assert_eq!(outcome.result["issues"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_full_validation_payload() {
        let root = tempdir().unwrap();
        let outcome = handle(
            ManifestCommand::Validate {
                kind: ValidationKind::Full,
                path: root.path().display().to_string(),
            },
            root.path(),
        )
        .await
        .unwrap();
        assert_eq!(outcome.status, ResultStatus::Failed);
        assert_eq!(outcome.result["overall_passed"], false);
        assert!(outcome.result["total_issues"].as_u64().unwrap() > 0);
    }
}
