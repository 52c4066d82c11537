//! Audit event data structures

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Money, SemanticType};

use super::diff::FieldChange;

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Transaction,
    BudgetLimit,
    Category,
    BudgetMonth,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Transaction => write!(f, "Transaction"),
            EntityType::BudgetLimit => write!(f, "BudgetLimit"),
            EntityType::Category => write!(f, "Category"),
            EntityType::BudgetMonth => write!(f, "BudgetMonth"),
        }
    }
}

/// What happened to the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeType::Create => write!(f, "CREATE"),
            ChangeType::Update => write!(f, "UPDATE"),
            ChangeType::Delete => write!(f, "DELETE"),
        }
    }
}

/// Entity-specific detail attached to an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditDetail {
    Transaction {
        transaction_id: String,
        category: String,
        month: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        changes: Vec<FieldChange>,
    },
    Limit {
        category: String,
        month: String,
        previous: Option<Money>,
        limit: Option<Money>,
    },
    Category {
        semantic_type: SemanticType,
    },
    /// Anything without a dedicated shape
    Other { fields: BTreeMap<String, String> },
}

impl AuditDetail {
    pub fn other<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Other {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    fn summary(&self) -> Option<String> {
        match self {
            Self::Transaction { changes, .. } => super::diff::summarize(changes),
            Self::Limit {
                category,
                previous,
                limit,
                ..
            } => Some(format!(
                "{}: {} -> {}",
                category,
                previous.map_or_else(|| "(none)".to_string(), |m| m.to_string()),
                limit.map_or_else(|| "(none)".to_string(), |m| m.to_string())
            )),
            Self::Category { semantic_type } => Some(format!("type: {}", semantic_type)),
            Self::Other { fields } if fields.is_empty() => None,
            Self::Other { fields } => Some(
                fields
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        }
    }
}

/// A single significant state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub entity_type: EntityType,

    /// Human-readable name of the entity (transaction name, category label)
    pub entity_name: String,

    pub change_type: ChangeType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<AuditDetail>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_delta: Option<Money>,

    /// Month flow balance before the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_balance: Option<Money>,

    /// Month flow balance after the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<Money>,

    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(entity_type: EntityType, entity_name: impl Into<String>, change_type: ChangeType) -> Self {
        Self {
            entity_type,
            entity_name: entity_name.into(),
            change_type,
            detail: None,
            amount_delta: None,
            previous_balance: None,
            new_balance: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: AuditDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn with_amount_delta(mut self, delta: Money) -> Self {
        self.amount_delta = Some(delta);
        self
    }

    pub fn with_balances(mut self, previous: Money, new: Money) -> Self {
        self.previous_balance = Some(previous);
        self.new_balance = Some(new);
        self
    }

    /// Format the event for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.change_type,
            self.entity_type,
            self.entity_name
        );

        if let Some(delta) = self.amount_delta {
            output.push_str(&format!(" ({})", delta));
        }

        if let (Some(previous), Some(new)) = (self.previous_balance, self.new_balance) {
            output.push_str(&format!("\n  Balance: {} -> {}", previous, new));
        }

        if let Some(summary) = self.detail.as_ref().and_then(AuditDetail::summary) {
            output.push_str(&format!("\n  Changes: {}", summary));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_type_display() {
        assert_eq!(ChangeType::Create.to_string(), "CREATE");
        assert_eq!(ChangeType::Update.to_string(), "UPDATE");
        assert_eq!(ChangeType::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_detail_is_tagged() {
        let event = AuditEvent::new(EntityType::BudgetLimit, "Food", ChangeType::Update).with_detail(
            AuditDetail::Limit {
                category: "Food".into(),
                month: "2025-01".into(),
                previous: None,
                limit: Some(Money::from_cents(20000)),
            },
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["entityType"], "budget_limit");
        assert_eq!(json["detail"]["kind"], "limit");
        assert!(json.get("amountDelta").is_none());

        let back: AuditEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_other_detail_fallback() {
        let detail = AuditDetail::other([("source", "import"), ("rows", "12")]);
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["kind"], "other");
        assert_eq!(json["fields"]["rows"], "12");
    }

    #[test]
    fn test_human_readable_format() {
        let event = AuditEvent::new(EntityType::Transaction, "Groceries", ChangeType::Create)
            .with_amount_delta(Money::from_cents(5000))
            .with_balances(Money::from_cents(10000), Money::from_cents(5000));

        let formatted = event.format_human_readable();
        assert!(formatted.contains("CREATE Transaction Groceries"));
        assert!(formatted.contains("$50.00"));
        assert!(formatted.contains("Balance: $100.00 -> $50.00"));
    }
}
