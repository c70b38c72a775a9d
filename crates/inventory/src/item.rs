use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockwatch_core::{AdminId, DomainError, Entity, RecordStatus, StockItemId};

/// Active items with a quantity strictly below this value are "low stock".
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// A tracked inventory record.
///
/// # Invariants
/// - `quantity` is never negative (enforced by the type and by command validation).
/// - Deleted items stay in storage but are excluded from listings and low-stock checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub id: StockItemId,
    pub title: String,
    pub quantity: u32,
    pub status: RecordStatus,
    #[serde(rename = "createDate")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updateDate")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "managerId")]
    pub owner_id: AdminId,
}

impl StockItem {
    /// Build a new item from a validated create command.
    pub fn create(id: StockItemId, cmd: CreateStockItem) -> Result<Self, DomainError> {
        let title = validate_title(&cmd.title)?;
        let quantity = validate_quantity(cmd.quantity)?;

        Ok(Self {
            id,
            title,
            quantity,
            status: cmd.status.unwrap_or_default(),
            created_at: cmd.created_at.unwrap_or(cmd.occurred_at),
            updated_at: cmd.updated_at,
            owner_id: cmd.owner_id,
        })
    }

    /// Apply an in-place update. The acting admin becomes the owner.
    ///
    /// Validation happens before any field is touched, so a rejected update
    /// leaves the item unchanged.
    pub fn apply_update(&mut self, cmd: &UpdateStockItem) -> Result<(), DomainError> {
        let title = cmd.title.as_deref().map(validate_title).transpose()?;
        let quantity = cmd.quantity.map(validate_quantity).transpose()?;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(quantity) = quantity {
            self.quantity = quantity;
        }
        if let Some(created_at) = cmd.created_at {
            self.created_at = created_at;
        }
        if let Some(status) = cmd.status {
            self.status = status;
        }
        self.updated_at = Some(cmd.updated_at.unwrap_or(cmd.occurred_at));
        self.owner_id = cmd.actor_id;
        Ok(())
    }

    /// Whether this item should be reported by the low-stock notifier.
    pub fn is_low_stock(&self) -> bool {
        self.status.is_active() && self.quantity < LOW_STOCK_THRESHOLD
    }

    pub fn low_stock_entry(&self) -> LowStockEntry {
        LowStockEntry {
            title: self.title.clone(),
            quantity: self.quantity,
        }
    }
}

impl Entity for StockItem {
    type Id = StockItemId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn status(&self) -> RecordStatus {
        self.status
    }
}

/// The slice of a stock item that goes into a low-stock alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockEntry {
    pub title: String,
    pub quantity: u32,
}

/// Command: create a stock item owned by the acting admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStockItem {
    pub title: String,
    /// Raw quantity from the caller; negative values are rejected.
    pub quantity: i64,
    pub status: Option<RecordStatus>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub owner_id: AdminId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: partial update of a stock item. `None` keeps the current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStockItem {
    pub title: Option<String>,
    pub quantity: Option<i64>,
    pub status: Option<RecordStatus>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub actor_id: AdminId,
    pub occurred_at: DateTime<Utc>,
}

fn validate_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title cannot be empty"));
    }
    Ok(title.to_string())
}

fn validate_quantity(quantity: i64) -> Result<u32, DomainError> {
    if quantity < 0 {
        return Err(DomainError::validation("quantity cannot be negative"));
    }
    u32::try_from(quantity).map_err(|_| DomainError::validation("quantity is too large"))
}
