//! Event logging subsystem for quotedesk.
//!
//! Every successful mutating command appends one event to
//! `<home>/events/events.ndjson` (one JSON object per line).
//!
//! # Event Format
//!
//! - `ts`: RFC3339 timestamp
//! - `action`: The action performed (init, add_item, submit, etc.)
//! - `actor`: The acting customer, or `user@HOST` for desk-level actions
//! - `quote`: Optional quote number for quote-specific events
//! - `details`: Freeform object with action-specific details
//!
//! ```no_run
//! use quotedesk::context::DeskContext;
//! use quotedesk::events::{Event, EventAction, append_event};
//! use serde_json::json;
//!
//! let ctx = DeskContext::resolve(None)?;
//! let event = Event::new(EventAction::Submit)
//!     .with_actor("cust-1")
//!     .with_quote("Q-00001")
//!     .with_details(json!({"notification": "acknowledged"}));
//! append_event(&ctx, &event)?;
//! # Ok::<(), quotedesk::error::QuoteError>(())
//! ```

use crate::context::DeskContext;
use crate::error::{QuoteError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// Desk initialization
    Init,
    /// Draft created for a customer
    CreateDraft,
    AddItem,
    RemoveItem,
    /// Field patch applied
    Update,
    /// Draft -> Submitted
    Submit,
    /// Submitted -> Confirmed
    Confirm,
    /// Submitted -> Rejected
    Reject,
    /// Approval status sync pass
    Sync,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Init => write!(f, "init"),
            EventAction::CreateDraft => write!(f, "create_draft"),
            EventAction::AddItem => write!(f, "add_item"),
            EventAction::RemoveItem => write!(f, "remove_item"),
            EventAction::Update => write!(f, "update"),
            EventAction::Submit => write!(f, "submit"),
            EventAction::Confirm => write!(f, "confirm"),
            EventAction::Reject => write!(f, "reject"),
            EventAction::Sync => write!(f, "sync"),
        }
    }
}

/// An event record for the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub ts: DateTime<Utc>,

    pub action: EventAction,

    /// Acting customer, or `user@HOST` when no customer is involved.
    pub actor: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,

    pub details: Value,
}

impl Event {
    /// Create a new event attributed to the local `USER@HOSTNAME`.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_operator_string(),
            quote: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Attribute the event to a customer.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    pub fn with_quote(mut self, number: impl Into<String>) -> Self {
        self.quote = Some(number.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            QuoteError::UserError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

fn get_operator_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append an event to the events log, creating the file if needed.
pub fn append_event(ctx: &DeskContext, event: &Event) -> Result<()> {
    let events_file = ctx.events_file();
    let json_line = event.to_ndjson_line()?;

    let events_dir = ctx.events_dir();
    if !events_dir.exists() {
        fs::create_dir_all(&events_dir).map_err(|e| {
            QuoteError::UserError(format!(
                "failed to create events directory '{}': {}",
                events_dir.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&events_file)
        .map_err(|e| {
            QuoteError::UserError(format!(
                "failed to open events file '{}': {}",
                events_file.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        QuoteError::UserError(format!(
            "failed to write event to '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        QuoteError::UserError(format!(
            "failed to sync events file '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    Ok(())
}

/// Read every event from the log, oldest first.
pub fn read_events(ctx: &DeskContext) -> Result<Vec<Event>> {
    let events_file = ctx.events_file();
    if !events_file.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&events_file).map_err(|e| {
        QuoteError::UserError(format!(
            "failed to read events file '{}': {}",
            events_file.display(),
            e
        ))
    })?;

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| {
                QuoteError::UserError(format!("corrupt event line in events log: {}", e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_event_creation() {
        let event = Event::new(EventAction::Init);

        assert_eq!(event.action, EventAction::Init);
        assert!(event.actor.contains('@'));
        assert!(event.quote.is_none());
        let age = Utc::now().signed_duration_since(event.ts);
        assert!(age.num_minutes() < 1);
    }

    #[test]
    fn test_event_builders() {
        let event = Event::new(EventAction::AddItem)
            .with_actor("cust-1")
            .with_quote("Q-00001")
            .with_details(json!({"product": "P-100", "quantity": 2}));

        assert_eq!(event.actor, "cust-1");
        assert_eq!(event.quote.as_deref(), Some("Q-00001"));
        assert_eq!(event.details["product"], "P-100");
        assert_eq!(event.details["quantity"], 2);
    }

    #[test]
    fn test_event_action_serialization() {
        let line = Event::new(EventAction::CreateDraft)
            .to_ndjson_line()
            .unwrap();
        assert!(line.contains(r#""action":"create_draft""#));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_event_without_quote_omits_field() {
        let line = Event::new(EventAction::Sync).to_ndjson_line().unwrap();
        assert!(!line.contains("\"quote\""));
    }

    #[test]
    fn test_event_action_display() {
        assert_eq!(EventAction::RemoveItem.to_string(), "remove_item");
        assert_eq!(EventAction::Confirm.to_string(), "confirm");
    }

    #[test]
    fn test_append_and_read_events() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = DeskContext::at(temp_dir.path());

        append_event(&ctx, &Event::new(EventAction::Init)).unwrap();
        append_event(
            &ctx,
            &Event::new(EventAction::Submit)
                .with_actor("cust-1")
                .with_quote("Q-00001"),
        )
        .unwrap();

        let content = fs::read_to_string(ctx.events_file()).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.ends_with('\n'));

        let events = read_events(&ctx).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, EventAction::Init);
        assert_eq!(events[1].action, EventAction::Submit);
        assert_eq!(events[1].quote.as_deref(), Some("Q-00001"));
    }

    #[test]
    fn test_read_events_without_log_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = DeskContext::at(temp_dir.path());
        assert!(read_events(&ctx).unwrap().is_empty());
    }
}
