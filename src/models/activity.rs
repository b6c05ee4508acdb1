use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::nullable;

pub const RECENT_ACTIVITY_VIEW: &str = "recent_activity";

/// One line of the dashboard feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    #[serde(alias = "type")]
    pub event_type: String,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub detail: String,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Sale,
    Purchase,
    Inventory,
}

impl ActivityKind {
    pub fn icon(&self) -> &'static str {
        match self {
            ActivityKind::Sale => "🛒",
            ActivityKind::Purchase => "📋",
            ActivityKind::Inventory => "📦",
        }
    }
}

impl ActivityEvent {
    /// Unknown event types are shown as inventory events
    pub fn kind(&self) -> ActivityKind {
        match self.event_type.to_ascii_lowercase().as_str() {
            "sale" => ActivityKind::Sale,
            "purchase" => ActivityKind::Purchase,
            _ => ActivityKind::Inventory,
        }
    }

    /// Secondary line: counterparty for orders, free text otherwise
    pub fn meta(&self) -> String {
        if self.detail.is_empty() {
            return String::new();
        }
        match self.kind() {
            ActivityKind::Sale => format!("To: {}", self.detail),
            ActivityKind::Purchase => format!("From: {}", self.detail),
            ActivityKind::Inventory => self.detail.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: &str, detail: &str) -> ActivityEvent {
        ActivityEvent {
            event_type: kind.into(),
            title: "Sold 5 Solar Panel 250W".into(),
            detail: detail.into(),
            occurred_at: None,
        }
    }

    #[test]
    fn test_meta_per_kind() {
        assert_eq!(event("sale", "Green Energy Co.").meta(), "To: Green Energy Co.");
        assert_eq!(event("purchase", "BrightSky").meta(), "From: BrightSky");
        assert_eq!(event("inventory", "low stock alert").meta(), "low stock alert");
        assert_eq!(event("sale", "").meta(), "");
    }

    #[test]
    fn test_type_alias() {
        let e: ActivityEvent = serde_json::from_value(serde_json::json!({
            "type": "purchase",
            "title": "Purchased 10 Inverter 5kW",
            "detail": null,
            "occurred_at": "2026-10-17T08:00:00Z"
        }))
        .unwrap();
        assert_eq!(e.kind(), ActivityKind::Purchase);
        assert_eq!(e.kind().icon(), "📋");
        assert!(e.occurred_at.is_some());
    }
}
