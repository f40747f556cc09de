use std::path::Path;

use pluginfleet_core::LifecycleCommand;
use pluginfleet_validator::{
    check_health, diagnose, inspect_install_source, propose_fixes, resolve,
};
use serde_json::json;
use tracing::info;

use super::{blocking, HandlerError, Outcome};

/// Lifecycle results are `success` whenever the handler completes.
pub(super) async fn handle(cmd: LifecycleCommand, root: &Path) -> Result<Outcome, HandlerError> {
    match cmd {
        LifecycleCommand::Health { plugin } => {
            info!(plugin = %plugin, "Checking health");
            let package = resolve(root, &plugin);
            let report = blocking(move || check_health(&plugin, &package)).await?;
            Outcome::completed(&report)
        }
        LifecycleCommand::Diagnose { plugin } => {
            info!(plugin = %plugin, "Diagnosing");
            let package = resolve(root, &plugin);
            let diagnosis = blocking(move || diagnose(&plugin, &package)).await?;
            Outcome::completed(&diagnosis)
        }
        LifecycleCommand::Fix { plugin } => {
            info!(plugin = %plugin, "Proposing fixes");
            let package = resolve(root, &plugin);
            let plan = blocking(move || propose_fixes(&diagnose(&plugin, &package))).await?;
            Outcome::completed(&plan)
        }
        LifecycleCommand::Install { path } => {
            info!(path = %path, "Inspecting install source");
            let source = resolve(root, &path);
            let check = blocking(move || inspect_install_source(&source)).await?;
            Outcome::completed(&check)
        }
        LifecycleCommand::Update { plugin } => Outcome::completed(&json!({
            "plugin": plugin,
            "status": "PENDING",
            "message": "Update requires source version specification",
            "requires_confirmation": true,
        })),
        LifecycleCommand::Rollback { plugin, version } => Outcome::completed(&json!({
            "plugin": plugin,
            "target_version": version,
            "status": "PENDING",
            "message": "Rollback requires backup verification",
            "requires_confirmation": true,
        })),
    }
}
