//! Fire-and-forget audit side channel.
//!
//! Mutating operations emit an `AuditEvent` after they commit. Recording happens on a
//! spawned task so a slow or failing sink never blocks or fails the request.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// A single audit record.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Verb, e.g. `CREATE`, `UPDATE`, `DELETE`, `SETTLE`.
    pub action: String,
    /// Entity kind, e.g. `payment`.
    pub entity_type: String,
    /// Entity identifier when there is one.
    pub entity_id: Option<String>,
    /// Human readable description.
    pub description: String,
    /// Free-form context.
    pub metadata: serde_json::Value,
    /// Acting user.
    pub actor_id: Option<Uuid>,
    /// Acting user's email.
    pub actor_email: Option<String>,
}

impl AuditEvent {
    /// Starts an event with empty metadata and no actor.
    #[must_use]
    pub fn new(
        action: impl Into<String>,
        entity_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: None,
            description: description.into(),
            metadata: serde_json::Value::Null,
            actor_id: None,
            actor_email: None,
        }
    }

    /// Sets the entity id.
    #[must_use]
    pub fn entity(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    /// Sets the metadata payload.
    #[must_use]
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sets the acting user.
    #[must_use]
    pub fn actor(mut self, id: Uuid, email: impl Into<String>) -> Self {
        self.actor_id = Some(id);
        self.actor_email = Some(email.into());
        self
    }
}

/// Audit sink failure.
#[derive(Debug, Error)]
#[error("audit sink failed: {0}")]
pub struct AuditError(pub String);

/// Destination for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persists one event.
    async fn record(&self, event: &AuditEvent) -> Result<(), AuditError>;
}

/// Sink that writes events to the `audit` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        tracing::info!(
            target: "audit",
            action = %event.action,
            entity_type = %event.entity_type,
            entity_id = ?event.entity_id,
            actor_id = ?event.actor_id,
            actor_email = ?event.actor_email,
            metadata = %event.metadata,
            "{}",
            event.description
        );
        Ok(())
    }
}

/// Records an event in the background. Sink failures are logged and dropped.
pub fn log_audit(sink: &Arc<dyn AuditSink>, event: AuditEvent) {
    let sink = Arc::clone(sink);
    tokio::spawn(async move {
        if let Err(e) = sink.record(&event).await {
            tracing::warn!(
                error = %e,
                action = %event.action,
                entity_type = %event.entity_type,
                "Failed to record audit event"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySink {
        events: Mutex<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl AuditSink for MemorySink {
        async fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn record(&self, _event: &AuditEvent) -> Result<(), AuditError> {
            Err(AuditError("disk full".into()))
        }
    }

    #[test]
    fn test_event_builder() {
        let actor = Uuid::new_v4();
        let event = AuditEvent::new("CREATE", "payment", "Created payment")
            .entity("abc")
            .metadata(serde_json::json!({"amount": "10.00"}))
            .actor(actor, "clerk@quarry.test");

        assert_eq!(event.entity_id.as_deref(), Some("abc"));
        assert_eq!(event.actor_id, Some(actor));
        assert_eq!(event.metadata["amount"], "10.00");
    }

    #[tokio::test]
    async fn test_log_audit_reaches_sink() {
        let memory = Arc::new(MemorySink::default());
        let sink: Arc<dyn AuditSink> = memory.clone();

        log_audit(&sink, AuditEvent::new("DELETE", "payment", "Deleted"));

        for _ in 0..50 {
            if !memory.events.lock().unwrap().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(memory.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_panic() {
        let sink: Arc<dyn AuditSink> = Arc::new(FailingSink);
        log_audit(&sink, AuditEvent::new("UPDATE", "invoice", "Paid"));
        tokio::task::yield_now().await;
    }
}
