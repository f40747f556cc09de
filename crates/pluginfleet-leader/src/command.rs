//! Interactive command parsing.

use pluginfleet_core::{
    Command, CoreError, LifecycleCommand, ManifestCommand, Role, SchemaType, TaskId,
    ValidationKind,
};

use crate::LeaderError;

/// One line of leader input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderCommand {
    Empty,
    Help,
    Quit,
    ListWorkers,
    Status,
    Pending,
    Result(TaskId),
    /// Work routed to a worker role.
    Task(Command),
    Broadcast(String),
    Assign { role: Role, agent: String },
}

/// Parse one input line.
pub fn parse_line(line: &str) -> Result<LeaderCommand, LeaderError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((head, args)) = parts.split_first() else {
        return Ok(LeaderCommand::Empty);
    };

    let command = match head.to_lowercase().as_str() {
        "help" => LeaderCommand::Help,
        "quit" | "exit" => LeaderCommand::Quit,
        "list" => match args {
            ["workers"] => LeaderCommand::ListWorkers,
            _ => return Err(usage("list workers")),
        },
        "status" => LeaderCommand::Status,
        "pending" => LeaderCommand::Pending,
        "result" => match args {
            [id] => LeaderCommand::Result(TaskId::new(*id)),
            _ => return Err(usage("result <task_id>")),
        },

        "validate" => {
            let (kind, path) = match args {
                [path] => (ValidationKind::Plugin, *path),
                [kind, path] => (kind.parse()?, *path),
                _ => return Err(usage("validate <plugin|manifest|full> <path>")),
            };
            manifest(ManifestCommand::Validate {
                kind,
                path: path.to_string(),
            })
        }
        "schema" => {
            let (path, schema_type) = match args {
                [path] => (*path, SchemaType::Plugin),
                [path, schema_type] => (*path, schema_type.parse()?),
                _ => return Err(usage("schema <path> [plugin|marketplace]")),
            };
            manifest(ManifestCommand::CheckSchema {
                path: path.to_string(),
                schema_type,
            })
        }
        "structure" => manifest(ManifestCommand::CheckStructure {
            path: single(args, "structure <path>")?,
        }),
        "publish" => manifest(ManifestCommand::PublicationReady {
            path: single(args, "publish <path>")?,
        }),

        "health" => lifecycle(LifecycleCommand::Health {
            plugin: single(args, "health <plugin>")?,
        }),
        "diagnose" => lifecycle(LifecycleCommand::Diagnose {
            plugin: single(args, "diagnose <plugin>")?,
        }),
        "fix" => lifecycle(LifecycleCommand::Fix {
            plugin: single(args, "fix <plugin>")?,
        }),
        "update" => lifecycle(LifecycleCommand::Update {
            plugin: single(args, "update <plugin>")?,
        }),
        "install" => lifecycle(LifecycleCommand::Install {
            path: single(args, "install <path>")?,
        }),
        "rollback" => match args {
            [plugin] => lifecycle(LifecycleCommand::Rollback {
                plugin: plugin.to_string(),
                version: None,
            }),
            [plugin, version] => lifecycle(LifecycleCommand::Rollback {
                plugin: plugin.to_string(),
                version: Some(version.to_string()),
            }),
            _ => return Err(usage("rollback <plugin> [version]")),
        },

        "broadcast" => {
            if args.is_empty() {
                return Err(usage("broadcast <message>"));
            }
            LeaderCommand::Broadcast(args.join(" "))
        }
        "assign" => match args {
            [role, agent] => LeaderCommand::Assign {
                role: role.parse()?,
                agent: agent.to_string(),
            },
            _ => return Err(usage("assign <role> <agent>")),
        },

        other => return Err(CoreError::UnknownCommand(other.to_string()).into()),
    };

    Ok(command)
}

fn single(args: &[&str], form: &str) -> Result<String, LeaderError> {
    match args {
        [value] => Ok(value.to_string()),
        _ => Err(usage(form)),
    }
}

fn usage(form: &str) -> LeaderError {
    LeaderError::Usage(form.to_string())
}

fn manifest(command: ManifestCommand) -> LeaderCommand {
    LeaderCommand::Task(Command::Manifest(command))
}

fn lifecycle(command: LifecycleCommand) -> LeaderCommand {
    LeaderCommand::Task(Command::Lifecycle(command))
}

/// Help text for the interactive prompt.
pub const HELP: &str = "\
GUARDIAN - AVAILABLE COMMANDS
==================================================

Task Distribution:
  validate <plugin|manifest|full> <path>  - Validate (-> manifest worker)
  schema <path> [plugin|marketplace]      - Check a manifest schema (-> manifest worker)
  structure <path>                        - Audit directory layout (-> manifest worker)
  publish <path>                          - Publication readiness (-> manifest worker)
  health <plugin>                         - Check plugin health (-> lifecycle worker)
  diagnose <plugin>                       - Diagnose issues (-> lifecycle worker)
  fix <plugin>                            - Propose fixes (-> lifecycle worker)
  install <path>                          - Check an install source (-> lifecycle worker)
  update <plugin>                         - Request an update (-> lifecycle worker)
  rollback <plugin> [version]             - Request a rollback (-> lifecycle worker)

System Commands:
  list workers                            - Last heartbeat per role
  status                                  - Show system status
  pending                                 - Tasks awaiting a result
  result <task_id>                        - Show a recorded result
  broadcast <message>                     - Send a notice to all workers
  assign <role> <agent>                   - Offer a role and wait for the ack

General:
  help                                    - Show this help
  quit                                    - Exit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line_is_empty() {
        assert_eq!(parse_line("   ").unwrap(), LeaderCommand::Empty);
    }

    #[test]
    fn test_validate_forms() {
        assert_eq!(
            parse_line("validate full plugins/demo").unwrap(),
            manifest(ManifestCommand::Validate {
                kind: ValidationKind::Full,
                path: "plugins/demo".to_string(),
            })
        );
        assert_eq!(
            parse_line("validate plugins/demo").unwrap(),
            manifest(ManifestCommand::Validate {
                kind: ValidationKind::Plugin,
                path: "plugins/demo".to_string(),
            })
        );
        assert!(matches!(
            parse_line("validate bogus plugins/demo"),
            Err(LeaderError::Core(CoreError::InvalidParameter { .. }))
        ));
    }

    #[test]
    fn test_rollback_version_is_optional() {
        assert_eq!(
            parse_line("rollback demo 1.2.0").unwrap(),
            lifecycle(LifecycleCommand::Rollback {
                plugin: "demo".to_string(),
                version: Some("1.2.0".to_string()),
            })
        );
        assert_eq!(
            parse_line("rollback demo").unwrap(),
            lifecycle(LifecycleCommand::Rollback {
                plugin: "demo".to_string(),
                version: None,
            })
        );
    }

    #[test]
    fn test_broadcast_keeps_every_word() {
        assert_eq!(
            parse_line("broadcast maintenance at  noon").unwrap(),
            LeaderCommand::Broadcast("maintenance at noon".to_string())
        );
    }

    #[test]
    fn test_assign_parses_role() {
        assert_eq!(
            parse_line("assign manifest agent-7").unwrap(),
            LeaderCommand::Assign {
                role: Role::Manifest,
                agent: "agent-7".to_string(),
            }
        );
        assert!(matches!(
            parse_line("assign janitor agent-7"),
            Err(LeaderError::Core(CoreError::UnknownRole(_)))
        ));
    }

    #[test]
    fn test_missing_argument_is_usage_error() {
        let err = parse_line("health").unwrap_err();
        assert_eq!(err.to_string(), "Usage: health <plugin>");
        assert!(matches!(parse_line("list"), Err(LeaderError::Usage(_))));
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_line("explode now").unwrap_err();
        assert_eq!(err.to_string(), "Unknown command: explode");
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(parse_line("QUIT").unwrap(), LeaderCommand::Quit);
        assert_eq!(parse_line("List workers").unwrap(), LeaderCommand::ListWorkers);
    }
}
