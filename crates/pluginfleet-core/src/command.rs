//! The closed command vocabulary of each worker role.
//!
//! Task messages carry a command name and a parameter map on the wire. On
//! receipt a worker turns them into one of these variants; everything that
//! follows is an exhaustive `match`, so adding a command means touching every
//! handler at compile time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{CoreError, Role};

/// Command-specific arguments as carried on the wire.
pub type Params = serde_json::Map<String, Value>;

/// Which validator the `validate` command runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationKind {
    /// `plugin.json` only.
    #[default]
    Plugin,
    /// `marketplace.json`.
    Manifest,
    /// Manifest, structure, components and content hygiene.
    Full,
}

impl ValidationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationKind::Plugin => "plugin",
            ValidationKind::Manifest => "manifest",
            ValidationKind::Full => "full",
        }
    }
}

impl FromStr for ValidationKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plugin" => Ok(ValidationKind::Plugin),
            "manifest" | "marketplace" => Ok(ValidationKind::Manifest),
            "full" => Ok(ValidationKind::Full),
            other => Err(CoreError::InvalidParameter {
                param: "type".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Schema selected by `check_schema`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    #[default]
    Plugin,
    Marketplace,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Plugin => "plugin",
            SchemaType::Marketplace => "marketplace",
        }
    }
}

impl FromStr for SchemaType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plugin" => Ok(SchemaType::Plugin),
            "marketplace" | "manifest" => Ok(SchemaType::Marketplace),
            other => Err(CoreError::InvalidParameter {
                param: "schema_type".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Commands accepted by the lifecycle role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleCommand {
    Health { plugin: String },
    Diagnose { plugin: String },
    Fix { plugin: String },
    Install { path: String },
    Update { plugin: String },
    Rollback { plugin: String, version: Option<String> },
}

/// Commands accepted by the manifest role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestCommand {
    Validate { kind: ValidationKind, path: String },
    CheckSchema { path: String, schema_type: SchemaType },
    CheckStructure { path: String },
    PublicationReady { path: String },
}

/// A fully parsed command, addressed to exactly one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Lifecycle(LifecycleCommand),
    Manifest(ManifestCommand),
}

impl Command {
    /// Parse a wire command for the given role.
    ///
    /// A name outside the role's vocabulary is `UnknownCommand`, even when
    /// another role would accept it.
    pub fn parse(role: Role, name: &str, params: &Params) -> Result<Self, CoreError> {
        match role {
            Role::Lifecycle => parse_lifecycle(name, params).map(Command::Lifecycle),
            Role::Manifest => parse_manifest(name, params).map(Command::Manifest),
        }
    }

    /// Role this command is routed to.
    pub fn role(&self) -> Role {
        match self {
            Command::Lifecycle(_) => Role::Lifecycle,
            Command::Manifest(_) => Role::Manifest,
        }
    }

    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Lifecycle(cmd) => match cmd {
                LifecycleCommand::Health { .. } => "health",
                LifecycleCommand::Diagnose { .. } => "diagnose",
                LifecycleCommand::Fix { .. } => "fix",
                LifecycleCommand::Install { .. } => "install",
                LifecycleCommand::Update { .. } => "update",
                LifecycleCommand::Rollback { .. } => "rollback",
            },
            Command::Manifest(cmd) => match cmd {
                ManifestCommand::Validate { .. } => "validate",
                ManifestCommand::CheckSchema { .. } => "check_schema",
                ManifestCommand::CheckStructure { .. } => "check_structure",
                ManifestCommand::PublicationReady { .. } => "publication_ready",
            },
        }
    }

    /// Wire parameters of the command.
    pub fn params(&self) -> Params {
        let mut params = Params::new();
        let mut put = |key: &str, value: &str| {
            params.insert(key.to_string(), Value::String(value.to_string()));
        };
        match self {
            Command::Lifecycle(cmd) => match cmd {
                LifecycleCommand::Health { plugin }
                | LifecycleCommand::Diagnose { plugin }
                | LifecycleCommand::Fix { plugin }
                | LifecycleCommand::Update { plugin } => put("plugin", plugin),
                LifecycleCommand::Install { path } => put("path", path),
                LifecycleCommand::Rollback { plugin, version } => {
                    put("plugin", plugin);
                    if let Some(version) = version {
                        put("version", version);
                    }
                }
            },
            Command::Manifest(cmd) => match cmd {
                ManifestCommand::Validate { kind, path } => {
                    put("type", kind.as_str());
                    put("path", path);
                }
                ManifestCommand::CheckSchema { path, schema_type } => {
                    put("path", path);
                    put("schema_type", schema_type.as_str());
                }
                ManifestCommand::CheckStructure { path }
                | ManifestCommand::PublicationReady { path } => put("path", path),
            },
        }
        params
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.role(), self.name())
    }
}

fn parse_lifecycle(name: &str, params: &Params) -> Result<LifecycleCommand, CoreError> {
    let cmd = match name {
        "health" => LifecycleCommand::Health {
            plugin: required(name, params, "plugin")?,
        },
        "diagnose" => LifecycleCommand::Diagnose {
            plugin: required(name, params, "plugin")?,
        },
        "fix" => LifecycleCommand::Fix {
            plugin: required(name, params, "plugin")?,
        },
        "install" => LifecycleCommand::Install {
            path: required(name, params, "path")?,
        },
        "update" => LifecycleCommand::Update {
            plugin: required(name, params, "plugin")?,
        },
        "rollback" => LifecycleCommand::Rollback {
            plugin: required(name, params, "plugin")?,
            version: optional(params, "version"),
        },
        other => return Err(CoreError::UnknownCommand(other.to_string())),
    };
    Ok(cmd)
}

fn parse_manifest(name: &str, params: &Params) -> Result<ManifestCommand, CoreError> {
    let cmd = match name {
        "validate" => ManifestCommand::Validate {
            kind: optional(params, "type")
                .map(|t| t.parse::<ValidationKind>())
                .transpose()?
                .unwrap_or_default(),
            path: required(name, params, "path")?,
        },
        "check_schema" => ManifestCommand::CheckSchema {
            path: required(name, params, "path")?,
            schema_type: optional(params, "schema_type")
                .map(|t| t.parse::<SchemaType>())
                .transpose()?
                .unwrap_or_default(),
        },
        "check_structure" => ManifestCommand::CheckStructure {
            path: required(name, params, "path")?,
        },
        "publication_ready" => ManifestCommand::PublicationReady {
            path: required(name, params, "path")?,
        },
        other => return Err(CoreError::UnknownCommand(other.to_string())),
    };
    Ok(cmd)
}

fn required(command: &str, params: &Params, key: &str) -> Result<String, CoreError> {
    optional(params, key).ok_or_else(|| CoreError::MissingParameter {
        command: command.to_string(),
        param: key.to_string(),
    })
}

/// String parameters only; `null` and empty strings count as absent.
fn optional(params: &Params, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_validate_defaults_to_plugin() {
        let cmd = Command::parse(Role::Manifest, "validate", &params(json!({"path": "p"}))).unwrap();
        assert_eq!(
            cmd,
            Command::Manifest(ManifestCommand::Validate {
                kind: ValidationKind::Plugin,
                path: "p".to_string()
            })
        );
    }

    #[test]
    fn test_parse_rejects_other_roles_vocabulary() {
        let err = Command::parse(Role::Manifest, "health", &params(json!({"plugin": "x"})));
        assert_eq!(err, Err(CoreError::UnknownCommand("health".to_string())));
    }

    #[test]
    fn test_parse_missing_parameter() {
        let err = Command::parse(Role::Lifecycle, "install", &Params::new()).unwrap_err();
        assert!(matches!(err, CoreError::MissingParameter { ref param, .. } if param == "path"));
    }

    #[test]
    fn test_parse_invalid_validation_kind() {
        let err = Command::parse(
            Role::Manifest,
            "validate",
            &params(json!({"path": "p", "type": "everything"})),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidParameter { .. }));
    }

    #[test]
    fn test_params_round_trip_through_parse() {
        let original = Command::Lifecycle(LifecycleCommand::Rollback {
            plugin: "demo".to_string(),
            version: Some("1.2.0".to_string()),
        });
        let parsed = Command::parse(original.role(), original.name(), &original.params()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_every_vocabulary_entry_parses() {
        let p = params(json!({"plugin": "x", "path": "y"}));
        for role in Role::ALL {
            for name in role.commands() {
                let cmd = Command::parse(role, name, &p).unwrap();
                assert_eq!(cmd.name(), *name);
                assert_eq!(cmd.role(), role);
            }
        }
    }
}
