//! Raw records → domain objects.
//!
//! Remote data is loosely typed. Bad fields are patched with a warning
//! instead of failing the whole batch; only bills with an unknown status
//! are dropped.

use api_types::{
    bill::{RawBill, RawBillItem, RawItems},
    number_or_zero,
    shop::RawShop,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use engine::{Bill, BillItem, BillStatus, Shop};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// RFC 3339, or a zone-less timestamp read as UTC.
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Unparseable creation times sort as the oldest records.
fn created_at_or_epoch(kind: &str, id: &str, value: &str) -> DateTime<Utc> {
    parse_timestamp(value).unwrap_or_else(|| {
        tracing::warn!("{kind} {id}: bad createdAt {value:?}, using the epoch");
        DateTime::<Utc>::UNIX_EPOCH
    })
}

pub(crate) fn shop_from_raw(raw: RawShop) -> Shop {
    let name = raw.name.trim();
    if name.is_empty() {
        tracing::warn!("shop {} has no name", raw.id);
    }
    let created_at = created_at_or_epoch("shop", &raw.id, &raw.created_at);
    Shop::new(raw.id, name.to_string(), created_at)
}

pub(crate) fn bill_from_raw(raw: RawBill) -> Option<Bill> {
    let status = match BillStatus::try_from(raw.status.as_str()) {
        Ok(status) => status,
        Err(err) => {
            tracing::warn!("skipping bill {}: {err}", raw.id);
            return None;
        }
    };
    let created_at = created_at_or_epoch("bill", &raw.id, &raw.created_at);
    let updated_at = parse_timestamp(&raw.updated_at).unwrap_or(created_at);
    let items = raw.items.and_then(|items| normalize_items(&raw.id, items));

    Some(Bill {
        amount: number_or_zero(&raw.amount),
        id: raw.id,
        shop_id: raw.shop_id,
        items,
        status,
        created_at,
        updated_at,
    })
}

/// Both item encodings end up as the same list. Malformed or empty item
/// data leaves the bill legacy.
pub(crate) fn normalize_items(bill_id: &str, raw: RawItems) -> Option<Vec<BillItem>> {
    let items = match raw {
        RawItems::Items(items) => items,
        RawItems::Encoded(text) if text.trim().is_empty() => return None,
        RawItems::Encoded(text) => match serde_json::from_str::<Vec<RawBillItem>>(&text) {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!("bill {bill_id}: unreadable items, treating as legacy: {err}");
                return None;
            }
        },
        RawItems::Other(value) => {
            if !value.is_null() {
                tracing::warn!("bill {bill_id}: unexpected items shape, treating as legacy");
            }
            return None;
        }
    };

    if items.is_empty() {
        return None;
    }
    Some(
        items
            .into_iter()
            .map(|item| {
                BillItem::new(
                    item.id,
                    item.name,
                    number_or_zero(&item.quantity),
                    number_or_zero(&item.price),
                )
            })
            .collect(),
    )
}
