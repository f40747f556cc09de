//! PluginFleet Worker Daemon

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pluginfleet_core::{Role, WorkerId};
use pluginfleet_fabric::{AmqpBroker, Broker, BrokerConfig};
use pluginfleet_worker::{run_heartbeat_loop, RoleResponder, WorkerConfig, WorkerRuntime};

/// PluginFleet worker: serves one role's task queue.
#[derive(Parser, Debug)]
#[command(name = "pluginfleet-worker", about = "PluginFleet worker daemon")]
struct Args {
    /// Role to serve (lifecycle or manifest)
    role: Role,

    /// Broker URI
    #[arg(long)]
    broker_uri: Option<String>,

    /// Worker ID (defaults to <role>-001)
    #[arg(long)]
    worker_id: Option<String>,

    /// Directory relative plugin paths are resolved against
    #[arg(long, default_value = ".")]
    marketplace_root: PathBuf,

    /// Heartbeat interval in seconds
    #[arg(long, default_value = "10")]
    heartbeat_secs: u64,

    /// Also answer role assignments from the leader
    #[arg(long)]
    accept_roles: bool,

    /// Agent name matched against role assignments (defaults to the worker ID)
    #[arg(long)]
    agent_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pluginfleet=info".parse()?))
        .with_target(true)
        .init();

    let mut broker_config = BrokerConfig::default();
    if let Some(uri) = args.broker_uri {
        broker_config = broker_config.with_uri(uri);
    }

    let mut config = WorkerConfig::new(args.role).with_marketplace_root(args.marketplace_root);
    if let Some(id) = args.worker_id {
        config = config.with_worker_id(WorkerId::new(id));
    }
    config.heartbeat_interval = Duration::from_secs(args.heartbeat_secs);
    config.agent_name = args
        .agent_name
        .unwrap_or_else(|| config.worker_id.as_str().to_string());
    let config = Arc::new(config);

    info!(
        role = %config.role,
        worker_id = %config.worker_id,
        marketplace_root = %config.marketplace_root.display(),
        "Starting PluginFleet worker"
    );

    let broker: Arc<dyn Broker> = match AmqpBroker::connect(&broker_config).await {
        Ok(broker) => Arc::new(broker),
        Err(e) => {
            error!(error = %e, "Cannot reach broker");
            return Err(e.into());
        }
    };
    broker.declare(&broker_config.topology).await?;

    let queue = broker_config.topology.task_queue(config.role).to_string();
    let mut runtime = WorkerRuntime::new(broker.clone(), config.clone(), queue);

    let heartbeat_handle = tokio::spawn(run_heartbeat_loop(
        broker.clone(),
        config.clone(),
        runtime.tasks_processed(),
    ));

    let roles_handle = args.accept_roles.then(|| {
        let responder = RoleResponder::new(
            broker.clone(),
            config.agent_name.clone(),
            broker_config.topology.role_assignment_queue.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) = responder.run().await {
                warn!(error = %e, "Role responder stopped");
            }
        })
    });

    let result = tokio::select! {
        result = runtime.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    };

    heartbeat_handle.abort();
    if let Some(handle) = roles_handle {
        handle.abort();
    }

    info!(
        tasks_processed = runtime.tasks_processed().load(std::sync::atomic::Ordering::SeqCst),
        "Worker stopped"
    );
    result.map_err(Into::into)
}
