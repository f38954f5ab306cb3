//! Classification of watch deliveries into handler events.

use std::collections::BTreeMap;

use crate::controller::labels::{LabelChange, diff_labels};
use crate::crd::MinecraftServer;

/// A handler invocation derived from a delivered server object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerEvent {
    /// No dependents are recorded yet.
    Create,
    /// Dependents are recorded but this process has not handled the object.
    Resume,
    /// The spec generation moved past the last handled one.
    Update,
    /// The parent's labels differ from the last propagated set.
    LabelsChanged(Vec<LabelChange>),
}

impl ServerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerEvent::Create => "create",
            ServerEvent::Resume => "resume",
            ServerEvent::Update => "update",
            ServerEvent::LabelsChanged(_) => "labels",
        }
    }
}

/// Decides which handlers a delivered object triggers.
pub trait EventSource: Send + Sync {
    /// Events for `server`, in the order their handlers must run.
    ///
    /// `first_seen` is true when this process has not handled the object
    /// since it started.
    fn events_for(&self, server: &MinecraftServer, first_seen: bool) -> Vec<ServerEvent>;
}

/// Event source reading the bookkeeping kept in the server's status.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatusEventSource;

impl EventSource for StatusEventSource {
    fn events_for(&self, server: &MinecraftServer, first_seen: bool) -> Vec<ServerEvent> {
        let status = server.status.as_ref();
        let recorded = status.is_some_and(|s| s.dependents.is_some());
        let mut events = Vec::new();

        if !recorded {
            events.push(ServerEvent::Create);
        } else {
            if first_seen {
                events.push(ServerEvent::Resume);
            }
            let observed = status.and_then(|s| s.observed_generation);
            if server.metadata.generation.is_some() && server.metadata.generation != observed {
                events.push(ServerEvent::Update);
            }
        }

        let empty = BTreeMap::new();
        let observed_labels = status
            .and_then(|s| s.observed_labels.as_ref())
            .unwrap_or(&empty);
        let labels = server.metadata.labels.as_ref().unwrap_or(&empty);
        let diff = diff_labels(observed_labels, labels);
        if !diff.is_empty() {
            events.push(ServerEvent::LabelsChanged(diff));
        }

        events
    }
}
