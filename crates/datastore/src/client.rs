//! HTTP implementation of [`LedgerApi`].

use std::time::Duration;

use api_types::{
    bill::{BillDelete, BillSave, BillsGet, RawBill},
    envelope::{Action, Request, Response},
    shop::{RawShop, ShopDelete, ShopSave, ShopsGet},
};
use engine::{Bill, Shop};
use reqwest::Url;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{LedgerApi, StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct HttpApi {
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpApi {
    pub fn new(endpoint: &str, timeout: Duration) -> StoreResult<Self> {
        let endpoint =
            Url::parse(endpoint).map_err(|err| StoreError::InvalidUrl(err.to_string()))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, http })
    }

    async fn call<P: Serialize>(&self, action: Action, payload: P) -> StoreResult<Value> {
        let result = self.send(action, payload).await;
        if let Err(err) = &result {
            tracing::debug!("[{}] request failed: {err}", action.as_str());
        }
        result
    }

    async fn send<P: Serialize>(&self, action: Action, payload: P) -> StoreResult<Value> {
        let res = self
            .http
            .post(self.endpoint.clone())
            .json(&Request { action, payload })
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(StoreError::Status(status.as_u16()));
        }

        let body = res.text().await?;
        decode_response(&body)
    }
}

/// Unwraps the `{success, data, error}` envelope.
pub(crate) fn decode_response(body: &str) -> StoreResult<Value> {
    let trimmed = body.trim();
    if trimmed.starts_with("<!DOCTYPE") || trimmed.starts_with("<html") {
        return Err(StoreError::HtmlResponse);
    }

    let response: Response = serde_json::from_str(trimmed)?;
    if !response.success {
        return Err(StoreError::Api(
            response
                .error
                .unwrap_or_else(|| "Request failed".to_string()),
        ));
    }
    Ok(response.data)
}

/// Reads a list payload record by record. A non-array payload is an empty
/// list; records that do not fit `T` are skipped.
pub(crate) fn decode_list<T: DeserializeOwned>(data: Value, what: &str) -> Vec<T> {
    let Value::Array(records) = data else {
        tracing::warn!("expected a list of {what}, got something else");
        return Vec::new();
    };

    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<T>(record) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::warn!("skipping malformed {what} record: {err}");
                None
            }
        })
        .collect()
}

impl LedgerApi for HttpApi {
    async fn get_shops(&self, user_id: &str) -> StoreResult<Vec<RawShop>> {
        let payload = ShopsGet {
            user_id: user_id.to_string(),
        };
        let data = self.call(Action::GetShops, payload).await?;
        Ok(decode_list(data, "shop"))
    }

    async fn save_shop(&self, user_id: &str, shop: &Shop) -> StoreResult<()> {
        self.call(Action::SaveShop, ShopSave { user_id, shop })
            .await
            .map(|_| ())
    }

    async fn delete_shop(&self, user_id: &str, shop_id: &str) -> StoreResult<()> {
        let payload = ShopDelete {
            user_id: user_id.to_string(),
            shop_id: shop_id.to_string(),
        };
        self.call(Action::DeleteShop, payload).await.map(|_| ())
    }

    async fn get_bills(&self, user_id: &str) -> StoreResult<Vec<RawBill>> {
        let payload = BillsGet {
            user_id: user_id.to_string(),
        };
        let data = self.call(Action::GetBills, payload).await?;
        Ok(decode_list(data, "bill"))
    }

    async fn save_bill(&self, user_id: &str, bill: &Bill) -> StoreResult<()> {
        self.call(Action::SaveBill, BillSave { user_id, bill })
            .await
            .map(|_| ())
    }

    async fn delete_bill(&self, user_id: &str, bill_id: &str) -> StoreResult<()> {
        let payload = BillDelete {
            user_id: user_id.to_string(),
            bill_id: bill_id.to_string(),
        };
        self.call(Action::DeleteBill, payload).await.map(|_| ())
    }
}
