//! The remote operations the store depends on.

use std::future::Future;

use api_types::{bill::RawBill, shop::RawShop};
use engine::{Bill, Shop};

use crate::StoreResult;

/// Remote ledger, scoped per user.
///
/// List calls return raw records; the store normalizes them. Implementations
/// report failures as errors and leave the degrade-to-empty policy to
/// [`DataStore`](crate::DataStore).
pub trait LedgerApi: Send + Sync {
    fn get_shops(&self, user_id: &str) -> impl Future<Output = StoreResult<Vec<RawShop>>> + Send;

    fn save_shop(&self, user_id: &str, shop: &Shop) -> impl Future<Output = StoreResult<()>> + Send;

    fn delete_shop(
        &self,
        user_id: &str,
        shop_id: &str,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    fn get_bills(&self, user_id: &str) -> impl Future<Output = StoreResult<Vec<RawBill>>> + Send;

    fn save_bill(&self, user_id: &str, bill: &Bill) -> impl Future<Output = StoreResult<()>> + Send;

    fn delete_bill(
        &self,
        user_id: &str,
        bill_id: &str,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}
