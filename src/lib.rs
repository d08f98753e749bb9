//! Contexta core — canonical data model and store for the plugin-based
//! ingestion pipeline.
//!
//! This crate owns everything that persists: credentials (with private
//! config encrypted at rest), configured integrations, deduplicated
//! events, versioned data snapshots, and the append-only audit log. It
//! also provides the declarative [`schema`] validator that plugin crates
//! use to describe and check their configuration.
//!
//! Plugin contracts, the registry and the fetch orchestrator live in the
//! `provider-manager` crate, which builds on these types.

pub mod config;
pub mod crypto;
pub mod model;
pub mod schema;
pub mod store;

pub use config::PipelineConfig;
pub use model::{CredentialsEntity, DataRecord, Event, Integration, IntegrationLog, LogMethod};
pub use store::{ContextStore, DataFilter, EventDraft, EventFilter};
