//! Shared context for the controller.
//!
//! The Context struct holds shared state that is passed to the reconciler:
//! the Kubernetes client, the dependent store, the event source, the event
//! recorder and the set of servers handled since the process started.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::{Client, Resource};

use crate::config::OperatorConfig;
use crate::controller::events::{EventSource, StatusEventSource};
use crate::crd::MinecraftServer;
use crate::health::HealthState;
use crate::store::{KubeStore, ResourceStore};

/// Field manager name for the operator
pub const FIELD_MANAGER: &str = "minecraft-operator";

/// Shared context for the controller
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client
    pub client: Client,
    /// Access to the dependents
    pub store: Arc<dyn ResourceStore>,
    /// Handler event classification
    pub events: Arc<dyn EventSource>,
    pub config: OperatorConfig,
    /// Event reporter identity
    reporter: Reporter,
    /// Optional health state for metrics and readiness
    pub health_state: Option<Arc<HealthState>>,
    /// UIDs of servers handled by this process
    seen: Arc<Mutex<HashSet<String>>>,
}

impl Context {
    /// Create a new context backed by the API server
    pub fn new(
        client: Client,
        config: OperatorConfig,
        health_state: Option<Arc<HealthState>>,
    ) -> Self {
        Self {
            store: Arc::new(KubeStore::new(client.clone())),
            events: Arc::new(StatusEventSource),
            reporter: Reporter {
                controller: FIELD_MANAGER.into(),
                instance: Some(config.pod_name.clone()),
            },
            client,
            config,
            health_state,
            seen: Arc::default(),
        }
    }

    /// Whether `uid` is handled for the first time since start.
    pub fn first_seen(&self, uid: &str) -> bool {
        !self
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(uid)
    }

    /// Remember that `uid` has been handled.
    pub fn mark_seen(&self, uid: &str) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uid.to_string());
    }

    /// Create an event recorder for publishing Kubernetes events
    fn recorder(&self) -> Recorder {
        Recorder::new(self.client.clone(), self.reporter.clone())
    }

    async fn publish(
        &self,
        server: &MinecraftServer,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        let object_ref = server.object_ref(&());
        if let Err(e) = self
            .recorder()
            .publish(
                &Event {
                    type_,
                    reason: reason.into(),
                    note,
                    action: action.into(),
                    secondary: None,
                },
                &object_ref,
            )
            .await
        {
            tracing::warn!(reason = %reason, error = %e, "Failed to publish event");
        }
    }

    /// Publish a normal event for a server
    pub async fn publish_normal_event(
        &self,
        server: &MinecraftServer,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        self.publish(server, EventType::Normal, reason, action, note)
            .await;
    }

    /// Publish a warning event for a server
    pub async fn publish_warning_event(
        &self,
        server: &MinecraftServer,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        self.publish(server, EventType::Warning, reason, action, note)
            .await;
    }
}
