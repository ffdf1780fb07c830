use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use queue_cluster::config::{ExecutorConfigs, NodeConfigFile};
use queue_cluster::executor::PartitionOperationExecutor;
use queue_cluster::operation::OperationRegistry;
use queue_cluster::partition::{StaticPartitionTable, DEFAULT_PARTITION_COUNT};
use queue_cluster::queue::handlers::*;
use queue_cluster::queue::protocol::*;
use queue_cluster::queue::{register_queue_operations, ContainerRegistry, QueueDescriptor};
use queue_cluster::replication::handlers::handle_backup;
use queue_cluster::replication::protocol::ENDPOINT_BACKUP;
use queue_cluster::replication::{BackupReplicator, HttpTransport};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!(
            "Usage: {} --bind <addr:port> [--backup <addr:port>]... [--config <file>] [--partitions <n>]",
            args[0]
        );
        eprintln!("Example: {} --bind 127.0.0.1:6001", args[0]);
        eprintln!(
            "Example: {} --bind 127.0.0.1:6000 --backup 127.0.0.1:6001",
            args[0]
        );

        std::process::exit(1);
    }

    let mut bind_addr: Option<SocketAddr> = None;
    let mut backups: Vec<String> = vec![];
    let mut config_path: Option<String> = None;
    let mut partitions = DEFAULT_PARTITION_COUNT;

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--bind", Some(value)) => {
                bind_addr = Some(value.parse()?);
                i += 2;
            }
            ("--backup", Some(value)) => {
                backups.push(value.clone());
                i += 2;
            }
            ("--config", Some(value)) => {
                config_path = Some(value.clone());
                i += 2;
            }
            ("--partitions", Some(value)) => {
                partitions = value.parse()?;
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    let bind_addr = bind_addr.ok_or_else(|| anyhow::anyhow!("--bind is required"))?;

    tracing::info!("Starting queue node on {}", bind_addr);
    if backups.is_empty() {
        tracing::info!("No backup replicas configured");
    } else {
        tracing::info!("Backup replicas: {:?}", backups);
    }

    // 1. Configuration:
    let file = match &config_path {
        Some(path) => NodeConfigFile::load(path)?,
        None => NodeConfigFile::default(),
    };
    let configs: ExecutorConfigs = file.executor_configs();

    // 2. Containers and operation types:
    let containers = ContainerRegistry::new();
    for (name, settings) in &file.queues {
        containers.create_queue(
            name,
            QueueDescriptor {
                max_size: settings.max_size,
            },
        );
    }

    let registry = OperationRegistry::new();
    register_queue_operations(&registry);

    // 3. Replication and executor:
    let table = Arc::new(StaticPartitionTable::new(partitions, backups));
    let replicator = BackupReplicator::new(table, Arc::new(HttpTransport::new()));
    let executor = PartitionOperationExecutor::new(configs, containers, registry, replicator);

    // 4. HTTP Router:
    let app = Router::new()
        .route(ENDPOINT_QUEUE_OFFER, post(handle_offer))
        .route(ENDPOINT_QUEUE_ADD_ALL, post(handle_add_all))
        .route(ENDPOINT_QUEUE_POLL, post(handle_poll))
        .route(ENDPOINT_QUEUE_PEEK, get(handle_peek))
        .route(ENDPOINT_QUEUE_SIZE, get(handle_size))
        .route(ENDPOINT_QUEUE_CLEAR, post(handle_clear))
        .route(ENDPOINT_NODE_STATS, get(handle_node_stats))
        .route(ENDPOINT_BACKUP, post(handle_backup))
        .layer(Extension(executor.clone()));

    // 5. Spawn stats reporter:
    let stats_executor = executor.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));

        loop {
            interval.tick().await;
            let health = stats_executor.health();
            tracing::info!(
                "Node stats: {} containers, {} backups pending, {} send failures, {} apply failures",
                stats_executor.containers().container_count(),
                health.pending_backups(),
                health.send_failure_count(),
                health.apply_failure_count()
            );
            for pool in stats_executor.all_pool_stats() {
                tracing::info!(
                    "  - pool '{}' ({}) live={} backlog={} completed={}",
                    pool.name,
                    pool.executor_type,
                    pool.live_workers,
                    pool.backlog,
                    pool.completed
                );
            }
        }
    });

    // 6. Start HTTP server:
    tracing::info!("HTTP server listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    executor.shutdown();
    Ok(())
}
