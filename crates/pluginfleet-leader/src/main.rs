//! PluginFleet Leader
//!
//! Interactive front end: reads commands from stdin, dispatches tasks to
//! the worker roles and prints a review of every result.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pluginfleet_fabric::{AmqpBroker, Broker, BrokerConfig, FabricError};
use pluginfleet_leader::{Flow, Leader, LeaderConfig};

/// PluginFleet leader: dispatches tasks and reconciles results.
#[derive(Parser, Debug)]
#[command(name = "pluginfleet-leader", about = "PluginFleet leader")]
struct Args {
    /// Broker URI
    #[arg(long)]
    broker_uri: Option<String>,

    /// Seconds a task may wait for its result
    #[arg(long, default_value = "300")]
    task_deadline_secs: u64,

    /// Seconds between expiry sweeps
    #[arg(long, default_value = "5")]
    sweep_secs: u64,

    /// Seconds `assign` waits for an acknowledgement
    #[arg(long, default_value = "30")]
    role_ack_timeout_secs: u64,
}

async fn connect(config: &BrokerConfig) -> Result<Arc<dyn Broker>, FabricError> {
    match AmqpBroker::connect(config).await {
        Ok(broker) => Ok(Arc::new(broker)),
        Err(e) => {
            error!(error = %e, "Cannot reach broker");
            Err(e)
        }
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pluginfleet=info".parse()?))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut broker_config = BrokerConfig::default();
    if let Some(uri) = args.broker_uri {
        broker_config = broker_config.with_uri(uri);
    }

    let config = LeaderConfig {
        task_deadline: Duration::from_secs(args.task_deadline_secs),
        sweep_interval: Duration::from_secs(args.sweep_secs),
        role_ack_timeout: Duration::from_secs(args.role_ack_timeout_secs),
        ..LeaderConfig::default()
    };

    info!(
        leader_id = %config.leader_id,
        exchange = %broker_config.topology.exchange,
        "Starting PluginFleet leader"
    );

    let publisher = connect(&broker_config).await?;
    publisher.declare(&broker_config.topology).await?;
    let listener = connect(&broker_config).await?;

    let leader = Leader::spawn(publisher, listener, broker_config.topology.clone(), config);

    println!("Guardian ready. Type 'help' for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                info!("Interrupted, shutting down");
                break;
            }
        };

        let Some(line) = line else {
            break;
        };
        if leader.session().handle_line(&line).await == Flow::Quit {
            break;
        }
    }

    leader.shutdown().await;
    Ok(())
}
