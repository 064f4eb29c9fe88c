//! Sync orchestration for vault-graph-sync.
//!
//! # Architecture
//!
//! ```text
//! QueueManager ──► JobRunner (SyncJobRunner)
//!      │                 │
//!      │                 ├─► Infrastructure (session + transaction, pause/cancel)
//!      │                 └─► NodePropertyWriter / RelationshipWriter / LabelWriter
//!      │
//!      └─► StateHub (migration + queue state, subscribers)
//! ```
//!
//! The composition root builds one [`StateHub`], one [`Infrastructure`], a
//! [`SyncJobRunner`] and a [`QueueManager`] and shares them through `Arc`.

pub mod config;
mod control;
mod infra;
mod manager;
mod queue;
mod runner;
mod state;
pub mod writers;

pub use config::{BatchSize, SyncPlan};
pub use control::{ControlState, SyncControl};
pub use infra::Infrastructure;
pub use manager::QueueManager;
pub use queue::SyncQueueState;
pub use runner::{JobRunner, SyncJobRunner};
pub use state::{Channel, HubState, StateHub, Subscription};
