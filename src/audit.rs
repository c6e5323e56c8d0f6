// ==============================================================================
// audit.rs - Audit Trail for Summary Statistics Runs
// ==============================================================================
// Description: Structured record of every stage of an audit run
// Author: Matt Barham
// Created: 2026-10-16
// Modified: 2026-10-16
// Version: 1.0.0
// ==============================================================================
// Events are emitted through tracing as they happen and persisted next to the
// report (audit.jsonl) when a report directory is given.
// ==============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    RunStarted,
    InputValidated,
    ClassificationCompleted,
    AggregationCompleted,
    ReportWritten,
    RunCompleted,
    RunFailed,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuditEvent {
    pub id: Uuid,
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub resource: Option<String>,
    pub details: serde_json::Value,
    pub severity: LogSeverity,
}

impl AuditEvent {
    pub fn new(
        run_id: Uuid,
        event_type: AuditEventType,
        resource: Option<String>,
        details: serde_json::Value,
    ) -> Self {
        let severity = match event_type {
            AuditEventType::RunFailed => LogSeverity::Error,
            _ => LogSeverity::Info,
        };

        Self {
            id: Uuid::new_v4(),
            run_id,
            timestamp: Utc::now(),
            event_type,
            resource,
            details,
            severity,
        }
    }

    /// Raise the severity of a stage that completed with dropped rows
    pub fn with_severity(mut self, severity: LogSeverity) -> Self {
        self.severity = severity;
        self
    }

    fn emit(&self) {
        let event_type = serde_json::to_string(&self.event_type).unwrap_or_default();
        match self.severity {
            LogSeverity::Info => info!(
                target: "audit",
                run_id = %self.run_id,
                event = %event_type,
                details = %self.details,
                "audit event"
            ),
            LogSeverity::Warning => warn!(
                target: "audit",
                run_id = %self.run_id,
                event = %event_type,
                details = %self.details,
                "audit event"
            ),
            LogSeverity::Error => error!(
                target: "audit",
                run_id = %self.run_id,
                event = %event_type,
                details = %self.details,
                "audit event"
            ),
        }
    }
}

/// Ordered events of one run
#[derive(Debug, Clone)]
pub struct AuditTrail {
    run_id: Uuid,
    events: Vec<AuditEvent>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::with_run_id(Uuid::new_v4())
    }

    pub fn with_run_id(run_id: Uuid) -> Self {
        Self {
            run_id,
            events: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    /// Record an event and emit it through tracing
    pub fn record(
        &mut self,
        event_type: AuditEventType,
        resource: Option<String>,
        details: serde_json::Value,
    ) -> &AuditEvent {
        self.push(AuditEvent::new(self.run_id, event_type, resource, details))
    }

    pub fn push(&mut self, event: AuditEvent) -> &AuditEvent {
        event.emit();
        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    /// One JSON object per line
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
        Ok(out)
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}
