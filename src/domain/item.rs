use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier of a pipeline item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Stage (column) an item currently sits in, e.g. "Orçamento"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(String);

impl Status {
    pub const FIRST_CONTACT: &'static str = "1º Contato";
    pub const QUOTE: &'static str = "Orçamento";
    pub const NEGOTIATION: &'static str = "Negociação";
    pub const CONFIRMED: &'static str = "Confirmado";
    pub const CANCELLED: &'static str = "Cancelado";

    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A blank status cannot be used as a move destination
    pub fn is_usable(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A card on the pipeline board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineItem {
    pub id: ItemId,
    pub status: Status,
    /// Stored ordinal. Rows written by the reorder engine are always whole
    /// numbers, but other writers may leave fractional values behind.
    #[serde(default, deserialize_with = "lenient_position")]
    pub position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PipelineItem {
    pub fn new(id: impl Into<ItemId>, status: impl Into<Status>, position: i64) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            position: Some(position as f64),
            title: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Position used for ordering; missing values sort as 0
    pub fn effective_position(&self) -> f64 {
        self.position.unwrap_or(0.0)
    }
}

/// Write row sent to the store. Only the reorder columns are carried, so
/// store-managed audit timestamps are never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: ItemId,
    pub status: Status,
    pub position: i64,
}

impl PositionUpdate {
    pub fn new(id: ItemId, status: Status, position: i64) -> Self {
        Self {
            id,
            status,
            position,
        }
    }
}

impl From<&PipelineItem> for PositionUpdate {
    fn from(item: &PipelineItem) -> Self {
        Self::new(
            item.id.clone(),
            item.status.clone(),
            item.effective_position().round() as i64,
        )
    }
}

/// Accepts any JSON number and numeric strings; anything else reads as missing.
fn lenient_position<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|p| p.is_finite()))
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        Self(s)
    }
}
