//! The authoritative snapshot, kept in sync with the remote ledger.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use engine::{Bill, Shop, Snapshot};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;

use crate::{
    Cache, LedgerApi, StoreResult,
    cache::{self, BILLS_KEY, SHOPS_KEY},
    ingest,
};

/// What happens when refreshes overlap and complete out of order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Whichever response completes last is applied.
    #[default]
    LastResponseWins,
    /// A response older than the one already applied is dropped.
    DiscardStale,
}

impl RefreshPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LastResponseWins => "last_response_wins",
            Self::DiscardStale => "discard_stale",
        }
    }
}

impl TryFrom<&str> for RefreshPolicy {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "last_response_wins" => Ok(Self::LastResponseWins),
            "discard_stale" => Ok(Self::DiscardStale),
            other => Err(format!("invalid refresh policy: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// A newer refresh had already been applied.
    Discarded,
}

#[derive(Debug)]
struct Current {
    snapshot: Arc<Snapshot>,
    applied_seq: u64,
    /// Bumped on every swap, in apply order.
    generation: u64,
}

/// Owns the current [`Snapshot`] of one user's ledger.
///
/// Readers get an `Arc` to an immutable snapshot; a refresh swaps shops and
/// bills together, so no reader ever sees one without the other.
pub struct DataStore<A, C> {
    api: A,
    cache: C,
    user_id: String,
    policy: RefreshPolicy,
    issued: AtomicU64,
    current: RwLock<Current>,
    /// Generation last written to the cache.
    persisted: Mutex<u64>,
}

impl<A: LedgerApi, C: Cache> DataStore<A, C> {
    /// Builds the store, seeded from whatever the cache holds.
    pub fn new(api: A, cache: C, user_id: impl Into<String>, policy: RefreshPolicy) -> Self {
        let shops: Vec<Shop> = read_cached(&cache, SHOPS_KEY);
        let bills: Vec<Bill> = read_cached(&cache, BILLS_KEY);
        tracing::debug!(
            "seeded from cache: {} shops, {} bills",
            shops.len(),
            bills.len()
        );

        Self {
            api,
            cache,
            user_id: user_id.into(),
            policy,
            issued: AtomicU64::new(0),
            current: RwLock::new(Current {
                snapshot: Arc::new(Snapshot::new(shops, bills)),
                applied_seq: 0,
                generation: 0,
            }),
            persisted: Mutex::new(0),
        }
    }

    pub async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read().await.snapshot)
    }

    /// Fetches shops and bills concurrently and replaces the snapshot.
    ///
    /// A failed fetch yields an empty collection for that half; the refresh
    /// itself never fails.
    pub async fn refresh(&self) -> RefreshOutcome {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("refresh #{seq} started");

        let (shops, bills) = tokio::join!(
            self.api.get_shops(&self.user_id),
            self.api.get_bills(&self.user_id)
        );

        let shops: Vec<Shop> = match shops {
            Ok(raw) => raw.into_iter().map(ingest::shop_from_raw).collect(),
            Err(err) => {
                tracing::warn!("fetching shops failed, using none: {err}");
                Vec::new()
            }
        };
        let bills: Vec<Bill> = match bills {
            Ok(raw) => raw.into_iter().filter_map(ingest::bill_from_raw).collect(),
            Err(err) => {
                tracing::warn!("fetching bills failed, using none: {err}");
                Vec::new()
            }
        };

        let snapshot = Arc::new(Snapshot::new(shops, bills));
        let generation = {
            let mut current = self.current.write().await;
            if self.policy == RefreshPolicy::DiscardStale && seq < current.applied_seq {
                tracing::debug!(
                    "refresh #{seq} discarded, #{} already applied",
                    current.applied_seq
                );
                return RefreshOutcome::Discarded;
            }
            current.snapshot = Arc::clone(&snapshot);
            current.applied_seq = seq;
            current.generation += 1;
            current.generation
        };
        tracing::debug!("refresh #{seq} applied");

        self.persist(generation, &snapshot);
        RefreshOutcome::Applied
    }

    /// Creates or replaces a shop remotely, then refreshes.
    pub async fn save_shop(&self, shop: &Shop) -> StoreResult<RefreshOutcome> {
        self.api.save_shop(&self.user_id, shop).await?;
        Ok(self.refresh().await)
    }

    pub async fn delete_shop(&self, shop_id: &str) -> StoreResult<RefreshOutcome> {
        self.api.delete_shop(&self.user_id, shop_id).await?;
        Ok(self.refresh().await)
    }

    /// Creates or replaces a bill remotely, then refreshes.
    pub async fn save_bill(&self, bill: &Bill) -> StoreResult<RefreshOutcome> {
        self.api.save_bill(&self.user_id, bill).await?;
        Ok(self.refresh().await)
    }

    pub async fn delete_bill(&self, bill_id: &str) -> StoreResult<RefreshOutcome> {
        self.api.delete_bill(&self.user_id, bill_id).await?;
        Ok(self.refresh().await)
    }

    /// Writes `snapshot` to the cache unless a later one already went out.
    fn persist(&self, generation: u64, snapshot: &Snapshot) {
        let mut persisted = cache::lock(&self.persisted);
        if generation < *persisted {
            tracing::debug!("skipping cache write of generation {generation}");
            return;
        }
        write_cached(&self.cache, SHOPS_KEY, &snapshot.shops);
        write_cached(&self.cache, BILLS_KEY, &snapshot.bills);
        *persisted = generation;
    }
}

fn read_cached<T: DeserializeOwned>(cache: &impl Cache, key: &str) -> Vec<T> {
    let Some(content) = cache.get(key) else {
        return Vec::new();
    };
    serde_json::from_str(&content).unwrap_or_else(|err| {
        tracing::warn!("ignoring unreadable cache entry {key}: {err}");
        Vec::new()
    })
}

fn write_cached<T: Serialize>(cache: &impl Cache, key: &str, values: &[T]) {
    let result = serde_json::to_string(values)
        .map_err(Into::into)
        .and_then(|content| cache.set(key, content));
    if let Err(err) = result {
        tracing::error!("writing cache entry {key} failed: {err}");
    }
}
