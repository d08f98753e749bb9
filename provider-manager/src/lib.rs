//! Provider Manager — plugin contracts and fetch orchestration for the
//! Contexta ingestion pipeline.
//!
//! This crate defines the contracts every provider plugin implements and
//! the machinery that drives them on a schedule.
//!
//! # Architecture
//!
//! ```text
//! External API (OpenWeather, ...)
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │  ProviderBackend (implements trait)      │
//! │  - Fetch raw records                     │
//! │  - Normalize to the canonical shape      │
//! │  - Hash payloads for versioning          │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │  Fetch Orchestrator                      │
//! │  - Walk active integrations              │
//! │  - Contain per-record/-integration fails │
//! │  - Reconcile events, append versions     │
//! └─────────────────────────────────────────┘
//!          ↓
//!      Contexta store
//! ```
//!
//! # Core Types
//!
//! - [`ProviderBackend`](provider::ProviderBackend) - Trait all provider
//!   plugins implement
//! - [`CredentialType`](credential::CredentialType) - Trait describing how
//!   a provider authenticates
//! - [`Registry`](registry::Registry) - Immutable-after-startup index of
//!   registered plugins
//! - [`FetchOrchestrator`](orchestrator::FetchOrchestrator) - Runs the
//!   fetch → normalize → reconcile sequence

pub mod admin;
pub mod audit;
pub mod credential;
pub mod credential_types;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod providers;
pub mod registry;

pub use audit::{AuditLogger, LogEntry};
pub use credential::CredentialType;
pub use error::PipelineError;
pub use orchestrator::{FetchOrchestrator, RetryPolicy, RunReport, RunState};
pub use provider::{FetchContext, NormalizedRecord, ProviderBackend};
pub use registry::Registry;
