//! Remote access and local persistence for the shop ledger.
//!
//! [`DataStore`] pulls shops and bills through a [`LedgerApi`], normalizes
//! them into an [`engine::Snapshot`] and mirrors the result into a [`Cache`].

pub use api::LedgerApi;
pub use cache::{BILLS_KEY, Cache, JsonFileCache, MemoryCache, SHOPS_KEY, default_cache_path};
pub use client::HttpApi;
pub use error::{StoreError, StoreResult};
pub use store::{DataStore, RefreshOutcome, RefreshPolicy};

mod api;
mod cache;
mod client;
mod error;
mod ingest;
mod store;
