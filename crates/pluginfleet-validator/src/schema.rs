//! Schema check dispatch.

use std::path::Path;

use pluginfleet_core::SchemaType;

use crate::marketplace::validate_marketplace_json;
use crate::plugin::validate_plugin_json;
use crate::report::ValidationReport;

/// Validate `target` against the plugin or marketplace manifest schema.
pub fn check_schema(target: &Path, schema_type: SchemaType) -> ValidationReport {
    match schema_type {
        SchemaType::Plugin => validate_plugin_json(target),
        SchemaType::Marketplace => validate_marketplace_json(target),
    }
}
