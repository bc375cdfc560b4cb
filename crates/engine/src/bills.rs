//! Bill primitives.
//!
//! A `Bill` is one purchase on credit by a shop. Bills created before line
//! items existed ("legacy" bills) carry only an aggregate `amount`.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Payment state of a bill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    NotPaid,
    Paid,
    Canceled,
}

impl BillStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotPaid => "NOT_PAID",
            Self::Paid => "PAID",
            Self::Canceled => "CANCELED",
        }
    }

    /// A bill still owed by the shop.
    pub fn is_pending(self) -> bool {
        self == Self::NotPaid
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for BillStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NOT_PAID" => Ok(Self::NotPaid),
            "PAID" => Ok(Self::Paid),
            "CANCELED" => Ok(Self::Canceled),
            other => Err(EngineError::InvalidBill(format!(
                "invalid bill status: {other}"
            ))),
        }
    }
}

/// One line of a bill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub price: f64,
}

impl BillItem {
    pub fn new(id: String, name: String, quantity: f64, price: f64) -> Self {
        Self {
            id,
            name,
            quantity,
            price,
        }
    }

    /// `quantity × price`.
    pub fn line_total(&self) -> f64 {
        self.quantity * self.price
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: String,
    pub shop_id: String,
    /// Authoritative total. For itemized bills the producer keeps it equal to
    /// the sum of the line totals; it is never re-derived on read.
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<BillItem>>,
    pub status: BillStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    /// Returns `true` for bills without a line-item breakdown.
    pub fn is_legacy(&self) -> bool {
        self.items.as_ref().is_none_or(|items| items.is_empty())
    }

    /// Item lines, empty for legacy bills.
    pub fn items(&self) -> &[BillItem] {
        self.items.as_deref().unwrap_or_default()
    }

    /// Amount with non-finite values coerced to zero.
    pub fn amount_or_zero(&self) -> f64 {
        if self.amount.is_finite() {
            self.amount
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn bill(items: Option<Vec<BillItem>>) -> Bill {
        let at = Utc.timestamp_opt(0, 0).unwrap();
        Bill {
            id: "b1".to_string(),
            shop_id: "s1".to_string(),
            amount: 10.0,
            items,
            status: BillStatus::NotPaid,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(BillStatus::try_from("paid").unwrap(), BillStatus::Paid);
        assert_eq!(
            BillStatus::try_from(" NOT_PAID ").unwrap(),
            BillStatus::NotPaid
        );
        assert!(BillStatus::try_from("REFUNDED").is_err());
    }

    #[test]
    fn legacy_detection() {
        assert!(bill(None).is_legacy());
        assert!(bill(Some(Vec::new())).is_legacy());
        let item = BillItem::new("1".to_string(), "Tea".to_string(), 2.0, 5.0);
        assert!(!bill(Some(vec![item])).is_legacy());
    }

    #[test]
    fn serializes_with_wire_names() {
        let json = serde_json::to_value(bill(None)).unwrap();
        assert_eq!(json["shopId"], "s1");
        assert_eq!(json["status"], "NOT_PAID");
        assert!(json.get("items").is_none());
    }

    #[test]
    fn non_finite_amount_is_zero() {
        let mut bill = bill(None);
        bill.amount = f64::NAN;
        assert_eq!(bill.amount_or_zero(), 0.0);
    }
}
