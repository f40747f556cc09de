//! The interactive command loop body.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use pluginfleet_core::{Role, TaskId, TaskOutcome};
use pluginfleet_fabric::Topology;

use crate::command::HELP;
use crate::{parse_line, Dispatcher, LeaderCommand, LeaderError, LeaderState, Review};

/// Whether the input loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Executes parsed commands and prints their outcome.
pub struct Session {
    dispatcher: Dispatcher,
    state: Arc<LeaderState>,
    topology: Topology,
}

impl Session {
    pub fn new(dispatcher: Dispatcher, state: Arc<LeaderState>, topology: Topology) -> Self {
        Self {
            dispatcher,
            state,
            topology,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Parse and execute one input line. Errors are printed, never returned.
    pub async fn handle_line(&self, line: &str) -> Flow {
        let outcome = match parse_line(line) {
            Ok(command) => self.execute(command).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(flow) => flow,
            Err(LeaderError::Core(e)) => {
                println!("{}. Type 'help' for available commands.", e);
                Flow::Continue
            }
            Err(e) => {
                println!("{}", e);
                Flow::Continue
            }
        }
    }

    pub async fn execute(&self, command: LeaderCommand) -> Result<Flow, LeaderError> {
        match command {
            LeaderCommand::Empty => {}
            LeaderCommand::Help => println!("{}", HELP),
            LeaderCommand::Quit => {
                println!("Shutting down Guardian...");
                return Ok(Flow::Quit);
            }
            LeaderCommand::ListWorkers => self.list_workers().await,
            LeaderCommand::Status => self.show_status().await,
            LeaderCommand::Pending => self.show_pending().await,
            LeaderCommand::Result(task_id) => self.show_result(&task_id).await,
            LeaderCommand::Task(command) => {
                let role = command.role();
                let task_id = self.dispatcher.send_task(command).await?;
                println!("[SENT] Task {} -> {}", task_id, role);
            }
            LeaderCommand::Broadcast(message) => {
                self.dispatcher.broadcast(&message).await?;
                println!("[BROADCAST] {}", message);
            }
            LeaderCommand::Assign { role, agent } => {
                println!("[ASSIGN] Offering role {} to {}", role, agent);
                match self.dispatcher.assign_role(role.as_str(), &agent).await {
                    Ok(ack) => println!("[ACK] {} ({})", ack.message, ack.status),
                    Err(e) => {
                        warn!(role = %role, agent = %agent, error = %e, "Role assignment unanswered");
                        println!("[NO ACK] {}", e);
                    }
                }
            }
        }
        Ok(Flow::Continue)
    }

    async fn list_workers(&self) {
        let sightings = self.state.workers().await;

        println!("\nREGISTERED WORKERS");
        println!("========================================");
        for role in Role::ALL {
            println!("  {}", role.display_name());
            println!("    Role: {}", role);
            println!("    Queue: {}", self.topology.task_queue(role));
            match sightings.iter().find(|(seen, _)| *seen == role) {
                Some((_, sighting)) => {
                    let age = (Utc::now() - sighting.last_seen).num_seconds().max(0);
                    println!("    ID: {}", sighting.worker_id);
                    println!(
                        "    Status: [{}] {}s ago, {} tasks processed",
                        sighting.status.to_uppercase(),
                        age,
                        sighting.tasks_processed
                    );
                }
                None => {
                    println!("    ID: {}", role.default_worker_id());
                    println!("    Status: [NO HEARTBEAT]");
                }
            }
            println!();
        }
    }

    async fn show_status(&self) {
        let pending = self.state.pending_count().await;
        let completed = self.state.result_count().await;
        let alive = self.state.workers().await.len();

        println!("\nSYSTEM STATUS");
        println!("========================================");
        println!("  Guardian: ACTIVE");
        println!("  Exchange: {}", self.topology.exchange);
        println!("  Workers seen: {}/{}", alive, Role::ALL.len());
        println!("  Pending Tasks: {}", pending);
        println!("  Completed Tasks: {}", completed);
        println!();
    }

    async fn show_pending(&self) {
        let tasks = self.state.pending_tasks().await;
        if tasks.is_empty() {
            println!("No pending tasks");
            return;
        }

        println!("\nPENDING TASKS ({})", tasks.len());
        for entry in tasks {
            let age = (Utc::now() - entry.sent_at).num_seconds().max(0);
            println!(
                "  {}  {} -> {}  ({}s)",
                entry.task.task_id, entry.task.command, entry.task.assigned_worker, age
            );
        }
    }

    async fn show_result(&self, task_id: &TaskId) {
        if self.state.is_pending(task_id).await {
            println!("Task {} is still pending", task_id);
            return;
        }

        match self.state.record(task_id).await {
            Some(record) => match (&record.outcome, &record.result) {
                (_, Some(result)) => println!("{}", Review::of(result, record.correlation)),
                (TaskOutcome::TimedOut, None) => {
                    println!("Task {} timed out without a result", task_id)
                }
                (outcome, None) => println!("Task {} ended: {}", task_id, outcome),
            },
            None => println!("No task with id {}", task_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pluginfleet_fabric::{Broker, MemoryBroker};

    use crate::LeaderConfig;

    async fn session() -> (MemoryBroker, Arc<LeaderState>, Session) {
        let broker = MemoryBroker::new();
        let topology = Topology::default();
        broker.declare(&topology).await.unwrap();

        let state = LeaderState::new();
        let dispatcher = Dispatcher::new(
            Arc::new(broker.clone()),
            state.clone(),
            Arc::new(LeaderConfig::default()),
            topology.role_ack_queue.clone(),
        );
        (broker, state.clone(), Session::new(dispatcher, state, topology))
    }

    #[tokio::test]
    async fn test_task_line_publishes_and_tracks() {
        let (broker, state, session) = session().await;

        assert_eq!(session.handle_line("structure plugins/demo").await, Flow::Continue);

        assert_eq!(state.pending_count().await, 1);
        assert_eq!(broker.queue_depth("tasks.manifest"), Some(1));
    }

    #[tokio::test]
    async fn test_bad_line_keeps_running() {
        let (broker, state, session) = session().await;

        assert_eq!(session.handle_line("frobnicate").await, Flow::Continue);
        assert_eq!(session.handle_line("health").await, Flow::Continue);

        assert_eq!(state.pending_count().await, 0);
        assert_eq!(broker.queue_depth("tasks.lifecycle"), Some(0));
    }

    #[tokio::test]
    async fn test_quit_stops_loop() {
        let (_broker, _state, session) = session().await;
        assert_eq!(session.handle_line("exit").await, Flow::Quit);
    }
}
