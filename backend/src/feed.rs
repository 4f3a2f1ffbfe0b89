//! Live change feed
//!
//! Services publish an event after each committed write; clients subscribed
//! through `/stream` refetch the collections they display. Delivery order is
//! only guaranteed within a single collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Collections clients can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Users,
    Roles,
    Sites,
    BeverageTypes,
    Products,
    DailyInventories,
    SalesOrders,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Users,
        Collection::Roles,
        Collection::Sites,
        Collection::BeverageTypes,
        Collection::Products,
        Collection::DailyInventories,
        Collection::SalesOrders,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Roles => "roles",
            Collection::Sites => "sites",
            Collection::BeverageTypes => "beverage_types",
            Collection::Products => "products",
            Collection::DailyInventories => "daily_inventories",
            Collection::SalesOrders => "sales_orders",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }

    /// Parse a comma-separated subscription list; empty means every collection
    pub fn parse_list(value: Option<&str>) -> Result<Vec<Self>, String> {
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            return Ok(Self::ALL.to_vec());
        };
        value
            .split(',')
            .map(str::trim)
            .map(|name| Self::parse(name).ok_or_else(|| name.to_string()))
            .collect()
    }
}

/// What happened to a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A committed change to one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub document_id: String,
    pub kind: ChangeKind,
    pub at: DateTime<Utc>,
}

/// Broadcast fan-out of change events
#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a change. Having no subscribers is not an error.
    pub fn publish(&self, collection: Collection, document_id: impl ToString, kind: ChangeKind) {
        let event = ChangeEvent {
            collection,
            document_id: document_id.to_string(),
            kind,
            at: Utc::now(),
        };
        tracing::debug!(
            collection = collection.as_str(),
            document_id = %event.document_id,
            "Publishing change event"
        );
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
