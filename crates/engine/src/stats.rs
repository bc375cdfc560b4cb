//! Derived per-shop statistics.
//!
//! Everything here is a pure function of the current shops and bills and is
//! recomputed on demand; nothing is persisted.

use std::{cmp::Ordering, collections::HashMap};

use serde::Serialize;

use crate::{Bill, BillStatus, Shop};

/// Totals of one shop, partitioned by bill status.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopStat {
    pub shop: Shop,
    pub pending_count: usize,
    pub total_pending: f64,
    pub total_received: f64,
}

impl ShopStat {
    fn empty(shop: &Shop) -> Self {
        Self {
            shop: shop.clone(),
            pending_count: 0,
            total_pending: 0.0,
            total_received: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Totals {
    pending_count: usize,
    total_pending: f64,
    total_received: f64,
}

/// Computes one [`ShopStat`] per shop, in shop order.
///
/// Canceled bills and bills pointing at unknown shops do not contribute.
pub fn shop_stats(shops: &[Shop], bills: &[Bill]) -> Vec<ShopStat> {
    let mut totals: HashMap<&str, Totals> = HashMap::with_capacity(shops.len());
    for bill in bills {
        let entry = totals.entry(bill.shop_id.as_str()).or_default();
        match bill.status {
            BillStatus::NotPaid => {
                entry.pending_count += 1;
                entry.total_pending += bill.amount_or_zero();
            }
            BillStatus::Paid => entry.total_received += bill.amount_or_zero(),
            BillStatus::Canceled => {}
        }
    }

    shops
        .iter()
        .map(|shop| match totals.get(shop.id.as_str()) {
            Some(t) => ShopStat {
                shop: shop.clone(),
                pending_count: t.pending_count,
                total_pending: t.total_pending,
                total_received: t.total_received,
            },
            None => ShopStat::empty(shop),
        })
        .collect()
}

/// Headline figures across all shops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_shops: usize,
    /// Every unpaid bill, including bills whose shop no longer exists.
    pub total_pending_bills: usize,
    pub total_amount_to_collect: f64,
}

pub fn dashboard_stats(shops: &[Shop], bills: &[Bill]) -> DashboardStats {
    bills
        .iter()
        .filter(|bill| bill.status.is_pending())
        .fold(
            DashboardStats {
                total_shops: shops.len(),
                ..DashboardStats::default()
            },
            |mut acc, bill| {
                acc.total_pending_bills += 1;
                acc.total_amount_to_collect += bill.amount_or_zero();
                acc
            },
        )
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShopStatusFilter {
    #[default]
    All,
    /// Shops that still owe something.
    Pending,
    /// Shops with nothing pending.
    Clear,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShopSort {
    NameAsc,
    NameDesc,
    #[default]
    AmountDesc,
    AmountAsc,
    ReceivedDesc,
    DateDesc,
}

/// Search, filter and ordering for the shop list.
#[derive(Clone, Debug, Default)]
pub struct ShopListQuery {
    pub search: String,
    pub status: ShopStatusFilter,
    pub sort: ShopSort,
}

impl ShopListQuery {
    pub fn apply(&self, stats: &[ShopStat]) -> Vec<ShopStat> {
        let needle = self.search.trim().to_lowercase();
        let mut result: Vec<ShopStat> = stats
            .iter()
            .filter(|s| needle.is_empty() || s.shop.name.to_lowercase().contains(&needle))
            .filter(|s| match self.status {
                ShopStatusFilter::All => true,
                ShopStatusFilter::Pending => s.total_pending > 0.0,
                ShopStatusFilter::Clear => s.total_pending == 0.0,
            })
            .cloned()
            .collect();

        result.sort_by(|a, b| self.compare(a, b));
        result
    }

    fn compare(&self, a: &ShopStat, b: &ShopStat) -> Ordering {
        match self.sort {
            ShopSort::NameAsc => compare_names(&a.shop.name, &b.shop.name),
            ShopSort::NameDesc => compare_names(&b.shop.name, &a.shop.name),
            ShopSort::AmountDesc => b.total_pending.total_cmp(&a.total_pending),
            ShopSort::AmountAsc => a.total_pending.total_cmp(&b.total_pending),
            ShopSort::ReceivedDesc => b.total_received.total_cmp(&a.total_received),
            ShopSort::DateDesc => b.shop.created_at.cmp(&a.shop.created_at),
        }
    }

    /// Number of criteria that differ from the defaults.
    pub fn active_filter_count(&self) -> usize {
        usize::from(self.status != ShopStatusFilter::All)
            + usize::from(self.sort != ShopSort::AmountDesc)
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
