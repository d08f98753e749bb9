//! Fetch orchestration.
//!
//! One run walks every active integration, drives its provider through
//! fetch → normalize → reconcile, and contains failures at the narrowest
//! possible scope: a bad record is dropped, a failing integration does not
//! abort its siblings, and only an empty active set or an exhausted time
//! budget terminates the run itself. An unexpected per-integration error
//! still fails the attempt, which is retried whole with a fixed delay —
//! upsert and append are idempotent, so a re-scan is safe.

use crate::audit::{AuditLogger, LogEntry};
use crate::error::PipelineError;
use crate::provider::{FetchContext, ProviderBackend};
use crate::registry::Registry;
use anyhow::{anyhow, Result};
use contexta::config::PipelineConfig;
use contexta::model::{Integration, LogMethod};
use contexta::store::{ContextStore, EventDraft};
use futures::future::join_all;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Lifecycle states of one orchestration run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Started,
    Progress,
    Success,
    Failure,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Started => "STARTED",
            RunState::Progress => "PROGRESS",
            RunState::Success => "SUCCESS",
            RunState::Failure => "FAILURE",
        };
        f.write_str(s)
    }
}

/// Terminal summary of one orchestration run.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub state: RunState,
    pub status: String,
    pub attempts: u32,
    pub integrations_processed: usize,
    pub records_imported: u32,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.state == RunState::Success
    }

    fn failure(status: String, attempts: u32) -> Self {
        Self {
            state: RunState::Failure,
            status,
            attempts,
            integrations_processed: 0,
            records_imported: 0,
        }
    }
}

/// Retry and time-budget settings for a run.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub time_budget: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            retry_delay: Duration::from_secs(config.retry_delay_secs),
            time_budget: Duration::from_secs(config.run_time_budget_secs),
        }
    }
}

enum AttemptOutcome {
    NoActiveIntegrations,
    Completed {
        integrations_processed: usize,
        records_imported: u32,
    },
}

pub struct FetchOrchestrator {
    store: Arc<ContextStore>,
    registry: Arc<Registry>,
    audit: AuditLogger,
    policy: RetryPolicy,
}

impl FetchOrchestrator {
    pub fn new(store: Arc<ContextStore>, registry: Arc<Registry>, policy: RetryPolicy) -> Self {
        let audit = AuditLogger::new(Arc::clone(&store));
        Self {
            store,
            registry,
            audit,
            policy,
        }
    }

    /// Executes one full run, retrying whole attempts up to the policy's
    /// cap. Always returns a terminal report; never panics on provider
    /// misbehavior.
    pub async fn run(&self) -> RunReport {
        for attempt in 1..=self.policy.max_attempts {
            info!(state = %RunState::Started, attempt, "Starting fetch run");

            match tokio::time::timeout(self.policy.time_budget, self.attempt()).await {
                Ok(Ok(AttemptOutcome::NoActiveIntegrations)) => {
                    // Expected empty state, not a runtime error; no retry.
                    info!(state = %RunState::Failure, "No active integrations to process");
                    return RunReport::failure("No active integrations.".to_string(), attempt);
                }
                Ok(Ok(AttemptOutcome::Completed {
                    integrations_processed,
                    records_imported,
                })) => {
                    info!(
                        state = %RunState::Success,
                        integrations_processed,
                        records_imported,
                        "Fetch run completed"
                    );
                    return RunReport {
                        state: RunState::Success,
                        status: format!(
                            "Processed {} integration(s), imported {} record(s).",
                            integrations_processed, records_imported
                        ),
                        attempts: attempt,
                        integrations_processed,
                        records_imported,
                    };
                }
                Ok(Err(e)) => {
                    error!(state = %RunState::Failure, attempt, error = %e, "Fetch run attempt failed");
                    if attempt < self.policy.max_attempts {
                        tokio::time::sleep(self.policy.retry_delay).await;
                    } else {
                        return RunReport::failure(
                            format!("Run failed after {} attempt(s): {}", attempt, e),
                            attempt,
                        );
                    }
                }
                Err(_) => {
                    // Soft time budget exhausted: terminal, not retried.
                    error!(state = %RunState::Failure, attempt, "Fetch run exceeded its time budget");
                    return RunReport::failure(
                        format!(
                            "Run exceeded its time budget of {}s.",
                            self.policy.time_budget.as_secs()
                        ),
                        attempt,
                    );
                }
            }
        }

        RunReport::failure("Run failed: attempt cap is zero.".to_string(), 0)
    }

    /// One attempt: every active integration, concurrently. All
    /// integrations are driven to completion before an error is reported,
    /// so one bad integration never starves its siblings.
    async fn attempt(&self) -> Result<AttemptOutcome> {
        let integrations = self.store.list_active_integrations()?;
        if integrations.is_empty() {
            return Ok(AttemptOutcome::NoActiveIntegrations);
        }

        let results = join_all(
            integrations
                .iter()
                .map(|integration| self.process_integration(integration)),
        )
        .await;

        let mut records_imported = 0u32;
        let mut first_error: Option<anyhow::Error> = None;
        for result in results {
            match result {
                Ok(imported) => records_imported += imported,
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(AttemptOutcome::Completed {
                integrations_processed: integrations.len(),
                records_imported,
            }),
        }
    }

    /// Processes one integration and updates its credential health.
    ///
    /// An unexpected failure is audit-logged here before propagating, so
    /// every operationally relevant failure leaves exactly one log entry.
    async fn process_integration(&self, integration: &Integration) -> Result<u32> {
        let result = self.process_inner(integration).await;

        if let Some(credentials_uid) = integration.credentials_uid {
            let health_error = result.as_ref().err().map(|e| e.to_string());
            if let Err(e) = self
                .store
                .mark_credentials_checked(&credentials_uid, health_error.as_deref())
            {
                error!(
                    integration = %integration.handle,
                    error = %e,
                    "Failed to update credential health"
                );
            }
        }

        if let Err(e) = &result {
            self.audit.save(
                integration,
                LogEntry::failure(
                    &format!("Integration run failed: {}", e),
                    LogMethod::Import,
                ),
            );
        }

        result
    }

    async fn process_inner(&self, integration: &Integration) -> Result<u32> {
        let provider = self
            .registry
            .require_provider(&integration.provider_backend_id)?;

        let credentials = match integration.credentials_uid {
            Some(uid) => Some(self.store.get_credentials(&uid)?.ok_or_else(|| {
                anyhow!(
                    "integration '{}' references missing credentials {}",
                    integration.handle,
                    uid
                )
            })?),
            None => None,
        };

        let ctx = FetchContext {
            integration,
            credentials: credentials.as_ref(),
            audit: &self.audit,
        };
        let raw_records = provider
            .fetch(&ctx)
            .await
            .map_err(|e| PipelineError::Fetch(e.to_string()))?;

        let mut imported = 0u32;
        for raw in &raw_records {
            match self.consume_record(provider.as_ref(), integration, raw) {
                Ok(true) => imported += 1,
                Ok(false) => {}
                Err(e) => {
                    // Per-record containment: drop the record, log, keep
                    // going with the rest of the batch.
                    warn!(
                        integration = %integration.handle,
                        error = %e,
                        "Dropping record that failed to reconcile"
                    );
                    self.audit.save(
                        integration,
                        LogEntry::failure(
                            &format!("Record dropped: {}", e),
                            LogMethod::Consume,
                        )
                        .request(raw.clone()),
                    );
                }
            }
        }

        if imported > 0 {
            self.audit.save(
                integration,
                LogEntry::success(
                    &format!("Imported {} record(s).", imported),
                    LogMethod::Import,
                )
                .records(imported),
            );
        }

        info!(
            state = %RunState::Progress,
            integration = %integration.handle,
            imported,
            "Integration processed"
        );
        Ok(imported)
    }

    /// Normalizes one raw record and reconciles it into an event plus a
    /// new data version. Returns false when the record is dropped as
    /// incomplete.
    fn consume_record(
        &self,
        provider: &dyn ProviderBackend,
        integration: &Integration,
        raw: &serde_json::Value,
    ) -> Result<bool> {
        let record = provider.normalize(raw)?;

        let (city, timestamp) = match (&record.city, &record.timestamp) {
            (Some(city), Some(timestamp)) => (city.clone(), *timestamp),
            _ => {
                warn!(
                    integration = %integration.handle,
                    "Dropping record missing city or timestamp"
                );
                return Ok(false);
            }
        };

        // The event carries the latest normalized payload as its extra
        // attributes; a re-match refreshes them (last write wins).
        let payload = record.to_json();
        let draft = EventDraft {
            integration_uid: Some(integration.uid),
            event_type: format!("{} - {}", city, provider.category()),
            event_date: Some(timestamp.date_naive()),
            location: None,
            city: Some(city),
            category: Some(provider.category().to_string()),
            extra_fields: payload.clone(),
        };
        let (event, created) = self
            .store
            .upsert_event(&draft)
            .map_err(|e| PipelineError::Reconciliation(e.to_string()))?;

        let data_hash = provider.version_hash(&record);
        self.store
            .append_data(&event.uid, &integration.uid, &payload, &data_hash)
            .map_err(|e| PipelineError::Reconciliation(e.to_string()))?;

        if created {
            self.audit.save(
                integration,
                LogEntry::success("New event created.", LogMethod::Consume)
                    .records(1)
                    .request(json!({
                        "event_type": event.event_type,
                        "event_date": event.event_date,
                        "extra_fields": payload,
                    })),
            );
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

    fn test_store() -> Arc<ContextStore> {
        let key = BASE64.encode([0u8; 32]);
        Arc::new(ContextStore::new(":memory:", &key).unwrap())
    }

    fn test_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            retry_delay: Duration::ZERO,
            time_budget: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_run_state_display() {
        assert_eq!(RunState::Started.to_string(), "STARTED");
        assert_eq!(RunState::Progress.to_string(), "PROGRESS");
        assert_eq!(RunState::Success.to_string(), "SUCCESS");
        assert_eq!(RunState::Failure.to_string(), "FAILURE");
    }

    #[tokio::test]
    async fn test_empty_active_set_fails_without_retry() {
        let orchestrator = FetchOrchestrator::new(
            test_store(),
            Arc::new(Registry::builtin()),
            test_policy(),
        );

        let report = orchestrator.run().await;
        assert_eq!(report.state, RunState::Failure);
        assert_eq!(report.attempts, 1);
        assert!(report.status.contains("No active integrations"));
    }

    #[test]
    fn test_policy_from_config() {
        let config = PipelineConfig {
            database_path: ":memory:".to_string(),
            encryption_key: String::new(),
            fetch_interval_secs: 600,
            max_attempts: 3,
            retry_delay_secs: 60,
            run_time_budget_secs: 300,
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.retry_delay, Duration::from_secs(60));
        assert_eq!(policy.time_budget, Duration::from_secs(300));
    }
}
