//! Reconciliation loop for MinecraftServer.
//!
//! A delivered server is classified into handler events by the context's
//! [`EventSource`](crate::controller::events::EventSource). The handlers run
//! in order against the dependent store, and the resulting bookkeeping is
//! written back through the status subresource.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use kube::{
    Api, ResourceExt,
    api::{Patch, PatchParams},
    runtime::controller::Action,
};
use tracing::{debug, error, info, warn};

use crate::controller::context::{Context, FIELD_MANAGER};
use crate::controller::dependents::{ParentRef, reconcile_dependents_with_report};
use crate::controller::error::Error;
use crate::controller::events::ServerEvent;
use crate::controller::labels::propagate_labels;
use crate::controller::status::{ConditionBuilder, status_patch};
use crate::controller::updater::update_storage;
use crate::crd::{MinecraftServer, MinecraftServerStatus, ServerPhase};
use crate::resources::DependentKind;
use crate::store::ResourceStore;

/// Requeue interval once a pass has nothing left to do
const IDLE_REQUEUE: Duration = Duration::from_secs(300);

/// What a pass of handlers did.
#[derive(Debug, Default)]
pub struct PassOutcome {
    /// Status to persist, including progress made before any failure
    pub status: MinecraftServerStatus,
    /// Dependents created by this pass
    pub created: Vec<DependentKind>,
    pub storage_updated: bool,
    /// Number of dependents whose labels were patched
    pub labels_patched: usize,
    /// Update rejected for a missing storage size, recorded without blocking
    /// later handlers
    pub update_rejected: Option<Error>,
    /// The error that stopped the pass
    pub error: Option<Error>,
}

/// Run the handlers for `events` in order.
///
/// A failing handler stops the pass; its error is returned in the outcome
/// together with the status reflecting the handlers that did complete. A
/// storage update without a size marks the generation as handled, since
/// retrying cannot succeed until the spec changes again. Store failures
/// during the update stop the pass like any other handler failure.
pub async fn run_handlers(
    store: &dyn ResourceStore,
    server: &MinecraftServer,
    events: &[ServerEvent],
    synced_kinds: &[DependentKind],
) -> PassOutcome {
    let generation = server.metadata.generation;
    let mut outcome = PassOutcome {
        status: server.status.clone().unwrap_or_default(),
        ..Default::default()
    };

    for event in events {
        let result = match event {
            ServerEvent::Create | ServerEvent::Resume => {
                match create_dependents(store, server).await {
                    Ok((names, created)) => {
                        if outcome.status.dependents.is_none() {
                            outcome.status.dependents = Some(names);
                        }
                        if *event == ServerEvent::Create
                            || outcome.status.observed_generation.is_none()
                        {
                            outcome.status.observed_generation = generation;
                        }
                        outcome.created.extend(created);
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
            ServerEvent::Update => match outcome.status.dependents.clone() {
                None => Err(Error::MissingStatus("dependents")),
                Some(prior) => {
                    let namespace = server.namespace().unwrap_or_default();
                    match update_storage(store, &server.spec, &prior, &namespace).await {
                        Ok(()) => {
                            outcome.storage_updated = true;
                            outcome.status.observed_generation = generation;
                            Ok(())
                        }
                        Err(e @ Error::MissingField { .. }) => {
                            warn!(error = %e, "Rejected storage update");
                            outcome.status.observed_generation = generation;
                            outcome.update_rejected = Some(e);
                            Ok(())
                        }
                        Err(e) => Err(e),
                    }
                }
            },
            ServerEvent::LabelsChanged(diff) => match outcome.status.dependents.clone() {
                None => Err(Error::MissingStatus("dependents")),
                Some(prior) => {
                    let namespace = server.namespace().unwrap_or_default();
                    match propagate_labels(store, diff, &prior, &namespace, synced_kinds).await {
                        Ok(patched) => {
                            outcome.labels_patched += patched;
                            outcome.status.observed_labels =
                                Some(server.metadata.labels.clone().unwrap_or_default());
                            Ok(())
                        }
                        Err(e) => Err(e),
                    }
                }
            },
        };

        if let Err(e) = result {
            outcome.error = Some(e);
            break;
        }
    }

    set_phase(&mut outcome, generation);
    outcome
}

async fn create_dependents(
    store: &dyn ResourceStore,
    server: &MinecraftServer,
) -> Result<(crate::crd::DependentNames, Vec<DependentKind>), Error> {
    let parent = ParentRef::from_server(server)?;
    let (names, report) = reconcile_dependents_with_report(store, &server.spec, &parent).await?;
    Ok((names, report.created))
}

fn set_phase(outcome: &mut PassOutcome, generation: Option<i64>) {
    let recorded = outcome.status.dependents.is_some();
    let mut conditions = ConditionBuilder::from_existing(&outcome.status.conditions);

    outcome.status.phase = match &outcome.error {
        None if recorded => {
            conditions
                .ready(true, "DependentsReady", "All dependents exist", generation)
                .progressing(false, "Reconciled", "Nothing left to create", generation);
            ServerPhase::Ready
        }
        None => ServerPhase::Pending,
        Some(e) if e.is_permanent() && !recorded => {
            conditions
                .ready(false, "ValidationFailed", &e.to_string(), generation)
                .progressing(false, "SpecInvalid", "Waiting for a spec change", generation);
            ServerPhase::Failed
        }
        Some(e) if !recorded => {
            conditions
                .ready(false, "Provisioning", &e.to_string(), generation)
                .progressing(true, "Retrying", "Dependents are still being created", generation);
            ServerPhase::Provisioning
        }
        Some(e) => {
            conditions.degraded(true, "HandlerFailed", &e.to_string(), generation);
            ServerPhase::Ready
        }
    };

    match &outcome.update_rejected {
        Some(e) => {
            conditions.degraded(true, "StorageUpdateRejected", &e.to_string(), generation);
        }
        None if outcome.error.is_none() => {
            conditions.degraded(false, "Healthy", "Dependents are in sync", generation);
        }
        None => {}
    }

    outcome.status.conditions = conditions.build();
}

/// Hash of the fields whose changes trigger a pass.
///
/// Status-only updates leave both generation and labels unchanged and are
/// filtered out by the controller.
pub fn trigger_hash(server: &MinecraftServer) -> Option<u64> {
    use std::hash::{DefaultHasher, Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    server.metadata.generation.hash(&mut hasher);
    server
        .metadata
        .labels
        .as_ref()
        .unwrap_or(&BTreeMap::new())
        .hash(&mut hasher);
    Some(hasher.finish())
}

/// Reconcile a MinecraftServer
///
/// This is the main reconciliation function called by the controller.
pub async fn reconcile(server: Arc<MinecraftServer>, ctx: Arc<Context>) -> Result<Action, Error> {
    let start_time = Instant::now();
    let name = server.name_any();
    let namespace = server
        .namespace()
        .ok_or_else(|| Error::Validation(format!("MinecraftServer {name} has no namespace")))?;
    let uid = server.uid().unwrap_or_default();

    let events = ctx.events.events_for(&server, ctx.first_seen(&uid));
    if events.is_empty() {
        debug!(name = %name, namespace = %namespace, "Nothing to do");
        ctx.mark_seen(&uid);
        return Ok(Action::requeue(IDLE_REQUEUE));
    }

    let handlers: Vec<&str> = events.iter().map(ServerEvent::as_str).collect();
    info!(name = %name, namespace = %namespace, handlers = ?handlers, "Reconciling MinecraftServer");

    let outcome = run_handlers(
        ctx.store.as_ref(),
        &server,
        &events,
        &ctx.config.label_sync_kinds,
    )
    .await;

    let api: Api<MinecraftServer> = Api::namespaced(ctx.client.clone(), &namespace);
    let patch = status_patch(server.status.as_ref(), &outcome.status)?;
    api.patch_status(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
        .await?;

    publish_outcome(&server, &ctx, &outcome).await;
    record_metrics(&ctx, &namespace, &name, &outcome, start_time);

    match outcome.error {
        Some(e) if e.is_retryable() => Err(e),
        Some(e) => {
            ctx.mark_seen(&uid);
            Err(e)
        }
        None => {
            ctx.mark_seen(&uid);
            Ok(Action::requeue(IDLE_REQUEUE))
        }
    }
}

async fn publish_outcome(server: &MinecraftServer, ctx: &Context, outcome: &PassOutcome) {
    if !outcome.created.is_empty() {
        let kinds: Vec<&str> = outcome.created.iter().map(|k| k.as_str()).collect();
        ctx.publish_normal_event(
            server,
            "DependentsReady",
            "CreateDependents",
            Some(format!("Created {}", kinds.join(", "))),
        )
        .await;
    }
    if outcome.storage_updated {
        ctx.publish_normal_event(
            server,
            "StorageUpdated",
            "UpdateStorage",
            server
                .spec
                .storage_size
                .as_ref()
                .map(|size| format!("Storage request set to {size}")),
        )
        .await;
    }
    if outcome.labels_patched > 0 {
        ctx.publish_normal_event(
            server,
            "LabelsPropagated",
            "PropagateLabels",
            Some(format!("Patched labels on {} dependents", outcome.labels_patched)),
        )
        .await;
    }
    if let Some(e) = &outcome.update_rejected {
        ctx.publish_warning_event(server, "StorageUpdateRejected", "UpdateStorage", Some(e.to_string()))
            .await;
    }
    if let Some(e) = &outcome.error {
        if e.is_permanent() {
            ctx.publish_warning_event(server, "ValidationFailed", "Validating", Some(e.to_string()))
                .await;
        }
    }
}

fn record_metrics(
    ctx: &Context,
    namespace: &str,
    name: &str,
    outcome: &PassOutcome,
    start_time: Instant,
) {
    let Some(health_state) = &ctx.health_state else {
        return;
    };
    let metrics = &health_state.metrics;
    metrics.record_reconcile(namespace, name, start_time.elapsed().as_secs_f64());
    for kind in &outcome.created {
        metrics.record_dependent_created(kind.as_str());
    }
    if outcome.labels_patched > 0 {
        metrics.record_label_patches(namespace, name, outcome.labels_patched as u64);
    }
    if outcome.error.is_none() {
        let now = u64::try_from(jiff::Timestamp::now().as_second()).unwrap_or_default();
        health_state.last_reconcile.store(now, Ordering::Relaxed);
    }
}

/// Error policy for the controller
pub fn error_policy(server: Arc<MinecraftServer>, error: &Error, ctx: Arc<Context>) -> Action {
    let name = server.name_any();
    let namespace = server.namespace().unwrap_or_default();

    if let Some(ref health_state) = ctx.health_state {
        health_state.metrics.record_error(&namespace, &name);
    }

    if error.is_not_found() {
        debug!(name = %name, "Resource not found (likely deleted)");
        return Action::await_change();
    }

    if error.is_retryable() {
        warn!(name = %name, error = %error, "Retryable error, will retry");
    } else {
        error!(name = %name, error = %error, "Non-retryable error");
    }
    Action::requeue(error.requeue_after())
}
