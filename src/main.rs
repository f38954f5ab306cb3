//! minecraft-operator - A Kubernetes operator for MinecraftServer custom resources.
//!
//! The binary initializes JSON logging, reads [`OperatorConfig`] from the
//! environment, serves probes and metrics, and runs the controller once this
//! replica holds the leader lease.

use std::sync::Arc;
use std::time::Duration;

use kube::Client;
use kube_leader_election::{LeaseLock, LeaseLockParams};
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use minecraft_operator::health::{HealthState, run_health_server};
use minecraft_operator::{OperatorConfig, run_controller};

const LEASE_NAME: &str = "minecraft-operator-leader";
const LEASE_TTL: Duration = Duration::from_secs(15);
const LEASE_RENEW_INTERVAL: Duration = Duration::from_secs(5);

/// Time given to in-flight passes after a shutdown signal
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("minecraft_operator=info".parse()?)
                .add_directive("kube=info".parse()?)
                .add_directive("kube_leader_election=info".parse()?),
        )
        .json()
        .init();

    let config = OperatorConfig::from_env()?;
    info!(
        watch_namespace = ?config.watch_namespace,
        label_sync_kinds = ?config.label_sync_kinds,
        health_port = config.health_port,
        "Starting minecraft-operator"
    );

    let client = Client::try_default().await?;
    let health_state = Arc::new(HealthState::new());

    // Probes are served before leadership so standby replicas stay live
    let health_handle = {
        let health_state = health_state.clone();
        let port = config.health_port;
        tokio::spawn(async move {
            if let Err(e) = run_health_server(health_state, port).await {
                error!(error = %e, "Health server failed");
            }
        })
    };

    let lease = lease_lock(&client, &config);
    info!(
        holder_id = %config.pod_name,
        namespace = %config.pod_namespace,
        lease_name = LEASE_NAME,
        "Waiting to acquire leadership"
    );
    acquire_leadership(&lease).await;
    let renewal_handle = spawn_lease_renewal(lease);

    let controller_handle = {
        let health_state = health_state.clone();
        tokio::spawn(run_controller(client, config, Some(health_state)))
    };

    tokio::select! {
        result = controller_handle => {
            if let Err(e) = result {
                error!(error = %e, "Controller task panicked");
            }
        }
        result = health_handle => {
            if let Err(e) = result {
                error!(error = %e, "Health server task panicked");
            }
        }
        // Renewal only returns by panicking; losing the lease exits the process
        Err(e) = renewal_handle => {
            error!(error = %e, "Lease renewal task panicked");
        }
        signal = shutdown_signal() => {
            if let Err(e) = signal {
                error!(error = %e, "Failed to install signal handlers");
            }
            info!("Shutting down");
            health_state.set_ready(false).await;
            tokio::time::sleep(SHUTDOWN_GRACE_PERIOD).await;
        }
    }

    info!("Operator stopped");
    Ok(())
}

fn lease_lock(client: &Client, config: &OperatorConfig) -> LeaseLock {
    LeaseLock::new(
        client.clone(),
        &config.pod_namespace,
        LeaseLockParams {
            holder_id: config.pod_name.clone(),
            lease_name: LEASE_NAME.to_string(),
            lease_ttl: LEASE_TTL,
        },
    )
}

/// Block until this replica holds the lease.
async fn acquire_leadership(lease: &LeaseLock) {
    loop {
        match lease.try_acquire_or_renew().await {
            Ok(result) if result.acquired_lease => {
                info!("Acquired leadership");
                return;
            }
            Ok(_) => info!("Another replica holds the lease"),
            Err(e) => warn!(error = %e, "Failed to acquire lease, retrying"),
        }
        tokio::time::sleep(LEASE_RENEW_INTERVAL).await;
    }
}

/// Keep renewing the lease, exiting the process once it is lost.
///
/// Kubernetes restarts the pod, which then rejoins the election as a standby.
#[allow(clippy::exit)]
fn spawn_lease_renewal(lease: LeaseLock) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(LEASE_RENEW_INTERVAL).await;
            match lease.try_acquire_or_renew().await {
                Ok(result) if result.acquired_lease => {}
                Ok(_) => {
                    error!("Lost leadership, exiting");
                    std::process::exit(1);
                }
                Err(e) => {
                    error!(error = %e, "Failed to renew lease, exiting");
                    std::process::exit(1);
                }
            }
        }
    })
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await
    }
}
