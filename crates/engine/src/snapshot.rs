//! The pair of shop and bill collections that every derived view reads.

use serde::{Deserialize, Serialize};

use crate::{
    Bill, Shop,
    item_index::{DEFAULT_ITEMS, ItemIndex},
    stats::{self, DashboardStats, ShopStat},
};

/// Shops and bills captured together. Replaced as a whole, never patched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub shops: Vec<Shop>,
    pub bills: Vec<Bill>,
}

impl Snapshot {
    pub fn new(shops: Vec<Shop>, bills: Vec<Bill>) -> Self {
        Self { shops, bills }
    }

    pub fn is_empty(&self) -> bool {
        self.shops.is_empty() && self.bills.is_empty()
    }

    pub fn shop(&self, shop_id: &str) -> Option<&Shop> {
        self.shops.iter().find(|shop| shop.id == shop_id)
    }

    pub fn bill(&self, bill_id: &str) -> Option<&Bill> {
        self.bills.iter().find(|bill| bill.id == bill_id)
    }

    /// Autocomplete index over every item name of every bill.
    ///
    /// Without any bill to learn from, the index holds [`DEFAULT_ITEMS`].
    pub fn item_index(&self) -> ItemIndex {
        let index = if self.bills.is_empty() {
            ItemIndex::from_items(DEFAULT_ITEMS)
        } else {
            ItemIndex::from_items(
                self.bills
                    .iter()
                    .flat_map(|bill| bill.items())
                    .map(|item| item.name.as_str()),
            )
        };
        tracing::debug!("item index rebuilt with {} names", index.len());
        index
    }

    pub fn shop_stats(&self) -> Vec<ShopStat> {
        stats::shop_stats(&self.shops, &self.bills)
    }

    pub fn dashboard(&self) -> DashboardStats {
        stats::dashboard_stats(&self.shops, &self.bills)
    }
}
