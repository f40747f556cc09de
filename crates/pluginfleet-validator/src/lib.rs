//! PluginFleet Validation Engine
//!
//! Independent checks against a plugin package on disk. Each check returns
//! its own report; [`validate_full_plugin`] and [`check_publication_ready`]
//! aggregate them. Checks never fail: filesystem problems are reported as
//! issues.
//!
//! A package is laid out as:
//!
//! ```text
//! my-plugin/
//! ├── .claude-plugin/plugin.json
//! ├── agents/*.md
//! ├── skills/<name>/SKILL.md
//! ├── commands/*.md
//! └── README.md
//! ```

pub mod codes;
pub mod error;
pub mod frontmatter;
pub mod full;
pub mod hygiene;
pub mod lifecycle;
pub mod marketplace;
pub mod paths;
pub mod plugin;
pub mod publication;
pub mod report;
pub mod schema;
pub mod structure;

pub use error::ValidatorError;
pub use frontmatter::{validate_agent_md, validate_skill_md, FileReport};
pub use full::{validate_full_plugin, FullValidation};
pub use hygiene::scan_content;
pub use lifecycle::{
    check_health, diagnose, inspect_install_source, propose_fixes, Diagnosis, FixPlan,
    HealthReport, InstallCheck,
};
pub use marketplace::validate_marketplace_json;
pub use paths::resolve;
pub use plugin::validate_plugin_json;
pub use publication::{check_publication_ready, PublicationReport};
pub use report::{ReportBuilder, ValidationReport};
pub use schema::check_schema;
pub use structure::{audit_structure, Inventory, StructureReport};
