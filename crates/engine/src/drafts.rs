//! Editable forms that produce shops and bills.
//!
//! Drafts are where the `amount == Σ quantity × price` invariant is
//! enforced: a bill leaving [`BillDraft::finish`] always carries the total
//! of its items.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Bill, BillItem, BillStatus, EngineError, ResultEngine, Shop};

/// Item name given to the single line of an edited legacy bill.
pub const LEGACY_ITEM_NAME: &str = "Legacy Bill Amount";

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Clone, Debug)]
pub struct BillDraft {
    /// Present when editing an existing bill.
    id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    pub shop_id: String,
    pub items: Vec<BillItem>,
    pub status: BillStatus,
}

impl BillDraft {
    /// Blank draft with one empty line.
    pub fn new(shop_id: &str) -> Self {
        Self {
            id: None,
            created_at: None,
            shop_id: shop_id.to_string(),
            items: vec![blank_item()],
            status: BillStatus::NotPaid,
        }
    }

    /// Draft pre-filled from `bill`. Legacy bills get one line holding their
    /// whole amount.
    pub fn edit(bill: &Bill) -> Self {
        let items = if bill.is_legacy() {
            vec![BillItem::new(
                "1".to_string(),
                LEGACY_ITEM_NAME.to_string(),
                1.0,
                bill.amount,
            )]
        } else {
            bill.items().to_vec()
        };

        Self {
            id: Some(bill.id.clone()),
            created_at: Some(bill.created_at),
            shop_id: bill.shop_id.clone(),
            items,
            status: bill.status,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Appends a blank line and returns its id.
    pub fn add_item(&mut self) -> String {
        let item = blank_item();
        let id = item.id.clone();
        self.items.push(item);
        id
    }

    pub fn remove_item(&mut self, item_id: &str) -> ResultEngine<BillItem> {
        let pos = self
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| EngineError::KeyNotFound(item_id.to_string()))?;
        Ok(self.items.remove(pos))
    }

    pub fn item_mut(&mut self, item_id: &str) -> ResultEngine<&mut BillItem> {
        self.items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| EngineError::KeyNotFound(item_id.to_string()))
    }

    /// Sum of the line totals.
    pub fn total(&self) -> f64 {
        self.items.iter().map(BillItem::line_total).sum()
    }

    /// Validates the draft and produces the bill to save.
    pub fn finish(self, now: DateTime<Utc>) -> ResultEngine<Bill> {
        let total = self.total();
        if !(total > 0.0) {
            return Err(EngineError::InvalidBill(
                "Total amount must be greater than 0".to_string(),
            ));
        }
        if self.items.iter().any(|item| item.name.trim().is_empty()) {
            return Err(EngineError::InvalidBill(
                "Please enter names for all items".to_string(),
            ));
        }
        if self.items.iter().any(|item| !(item.quantity > 0.0)) {
            return Err(EngineError::InvalidBill(
                "Quantity must be greater than 0".to_string(),
            ));
        }
        if self.items.iter().any(|item| !(item.price >= 0.0)) {
            return Err(EngineError::InvalidBill(
                "Price must not be negative".to_string(),
            ));
        }

        Ok(Bill {
            id: self.id.unwrap_or_else(new_id),
            shop_id: self.shop_id,
            amount: total,
            items: Some(self.items),
            status: self.status,
            created_at: self.created_at.unwrap_or(now),
            updated_at: now,
        })
    }
}

fn blank_item() -> BillItem {
    BillItem::new(new_id(), String::new(), 1.0, 0.0)
}

/// Form for a new shop.
#[derive(Clone, Debug, Default)]
pub struct ShopDraft {
    pub name: String,
}

impl ShopDraft {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    pub fn finish(self, now: DateTime<Utc>) -> ResultEngine<Shop> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidShop(
                "shop name must not be empty".to_string(),
            ));
        }
        Ok(Shop::new(new_id(), name.to_string(), now))
    }
}
