//! Controller module for minecraft-operator.
//!
//! Contains the reconciliation loop, the handlers it dispatches to, error
//! handling, status management and validation logic.
//!
//! Handlers only reach the cluster through a
//! [`ResourceStore`](crate::store::ResourceStore), so everything below the
//! loop itself runs against the in-memory store in tests.

pub mod context;
pub mod dependents;
pub mod error;
pub mod events;
pub mod labels;
pub mod server_reconciler;
pub mod status;
pub mod updater;
pub mod validation;
