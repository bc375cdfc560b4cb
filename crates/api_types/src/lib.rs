//! Wire types of the remote ledger API.
//!
//! Every call is a POST of `{"action": ..., ...payload}` answered with
//! `{"success": bool, "data": ..., "error": ...}`. Records come back loosely
//! typed (numeric ids, amounts as strings, items as JSON text), so the raw
//! shapes here accept all of it and leave normalization to the caller.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Accepts an id sent either as a JSON string or a JSON number.
fn loose_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LooseId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match LooseId::deserialize(deserializer)? {
        LooseId::Text(text) => text,
        LooseId::Int(n) => n.to_string(),
        LooseId::Float(n) => n.to_string(),
    })
}

/// Reads a loosely typed numeric field: numbers as-is, numeric strings
/// parsed, everything else (including non-finite values) is `0`.
pub fn number_or_zero(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

pub mod envelope {
    use super::*;

    /// Remote procedure names.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub enum Action {
        GetShops,
        SaveShop,
        DeleteShop,
        GetBills,
        SaveBill,
        DeleteBill,
    }

    impl Action {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::GetShops => "getShops",
                Self::SaveShop => "saveShop",
                Self::DeleteShop => "deleteShop",
                Self::GetBills => "getBills",
                Self::SaveBill => "saveBill",
                Self::DeleteBill => "deleteBill",
            }
        }
    }

    /// Request body: the action name flattened next to its payload.
    #[derive(Debug, Serialize)]
    pub struct Request<P> {
        pub action: Action,
        #[serde(flatten)]
        pub payload: P,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Response {
        #[serde(default)]
        pub success: bool,
        #[serde(default)]
        pub data: Value,
        #[serde(default)]
        pub error: Option<String>,
    }
}

pub mod shop {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ShopsGet {
        pub user_id: String,
    }

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ShopSave<'a, S> {
        pub user_id: &'a str,
        pub shop: &'a S,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ShopDelete {
        pub user_id: String,
        pub shop_id: String,
    }

    /// A shop as the server returns it.
    #[derive(Clone, Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RawShop {
        #[serde(deserialize_with = "loose_id")]
        pub id: String,
        #[serde(default)]
        pub name: String,
        /// RFC3339 timestamp.
        #[serde(default)]
        pub created_at: String,
    }
}

pub mod bill {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BillsGet {
        pub user_id: String,
    }

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BillSave<'a, B> {
        pub user_id: &'a str,
        pub bill: &'a B,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BillDelete {
        pub user_id: String,
        pub bill_id: String,
    }

    /// Line items as stored remotely: either structured, or a JSON document
    /// encoded in a string cell.
    #[derive(Clone, Debug, Deserialize)]
    #[serde(untagged)]
    pub enum RawItems {
        Encoded(String),
        Items(Vec<RawBillItem>),
        Other(Value),
    }

    #[derive(Clone, Debug, Deserialize)]
    pub struct RawBillItem {
        #[serde(deserialize_with = "loose_id")]
        pub id: String,
        #[serde(default)]
        pub name: String,
        #[serde(default)]
        pub quantity: Value,
        #[serde(default)]
        pub price: Value,
    }

    /// A bill as the server returns it.
    #[derive(Clone, Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RawBill {
        #[serde(deserialize_with = "loose_id")]
        pub id: String,
        #[serde(deserialize_with = "loose_id")]
        pub shop_id: String,
        /// Number, numeric string, or missing.
        #[serde(default)]
        pub amount: Value,
        #[serde(default)]
        pub items: Option<RawItems>,
        #[serde(default)]
        pub status: String,
        #[serde(default)]
        pub created_at: String,
        #[serde(default)]
        pub updated_at: String,
    }
}
