use std::{
    collections::VecDeque,
    sync::{
        Arc, Barrier, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use api_types::{bill::RawBill, shop::RawShop};
use chrono::{TimeZone, Utc};
use datastore::{
    BILLS_KEY, Cache, DataStore, LedgerApi, MemoryCache, RefreshOutcome, RefreshPolicy,
    SHOPS_KEY, StoreError, StoreResult,
};
use engine::{Bill, BillStatus, Shop};
use serde_json::json;

type Script<T> = Arc<Mutex<VecDeque<(Duration, StoreResult<T>)>>>;

/// Answers list calls from scripted `(delay, result)` queues, in call order.
/// An exhausted queue answers an empty list at once.
#[derive(Clone, Default)]
struct FakeApi {
    shops: Script<Vec<RawShop>>,
    bills: Script<Vec<RawBill>>,
    saved_bills: Arc<Mutex<Vec<Bill>>>,
    deleted: Arc<Mutex<Vec<String>>>,
    reject_writes: bool,
}

impl FakeApi {
    fn push_shops(&self, delay_ms: u64, result: StoreResult<Vec<RawShop>>) {
        self.shops
            .lock()
            .unwrap()
            .push_back((Duration::from_millis(delay_ms), result));
    }

    fn push_bills(&self, delay_ms: u64, result: StoreResult<Vec<RawBill>>) {
        self.bills
            .lock()
            .unwrap()
            .push_back((Duration::from_millis(delay_ms), result));
    }

    fn pending_scripts(&self) -> usize {
        self.shops.lock().unwrap().len() + self.bills.lock().unwrap().len()
    }

    fn write_result(&self) -> StoreResult<()> {
        if self.reject_writes {
            Err(StoreError::Api("sheet is read-only".to_string()))
        } else {
            Ok(())
        }
    }
}

async fn next<T: Default>(script: &Script<T>) -> StoreResult<T> {
    let entry = script.lock().unwrap().pop_front();
    match entry {
        Some((delay, result)) => {
            tokio::time::sleep(delay).await;
            result
        }
        None => Ok(T::default()),
    }
}

impl LedgerApi for FakeApi {
    async fn get_shops(&self, _user_id: &str) -> StoreResult<Vec<RawShop>> {
        next(&self.shops).await
    }

    async fn save_shop(&self, _user_id: &str, _shop: &Shop) -> StoreResult<()> {
        self.write_result()
    }

    async fn delete_shop(&self, _user_id: &str, shop_id: &str) -> StoreResult<()> {
        self.write_result()?;
        self.deleted.lock().unwrap().push(shop_id.to_string());
        Ok(())
    }

    async fn get_bills(&self, _user_id: &str) -> StoreResult<Vec<RawBill>> {
        next(&self.bills).await
    }

    async fn save_bill(&self, _user_id: &str, bill: &Bill) -> StoreResult<()> {
        self.write_result()?;
        self.saved_bills.lock().unwrap().push(bill.clone());
        Ok(())
    }

    async fn delete_bill(&self, _user_id: &str, bill_id: &str) -> StoreResult<()> {
        self.write_result()?;
        self.deleted.lock().unwrap().push(bill_id.to_string());
        Ok(())
    }
}

fn raw_shop(id: &str, name: &str) -> RawShop {
    serde_json::from_value(json!({
        "id": id, "name": name, "createdAt": "2024-06-01T09:00:00Z"
    }))
    .unwrap()
}

fn raw_bill(id: &str, amount: f64) -> RawBill {
    serde_json::from_value(json!({
        "id": id, "shopId": "s1", "amount": amount, "status": "NOT_PAID",
        "createdAt": "2024-06-02T09:00:00Z",
        "items": format!("[{{\"id\":\"i1\",\"name\":\"Tea\",\"quantity\":1,\"price\":{amount}}}]")
    }))
    .unwrap()
}

fn new_store(
    api: FakeApi,
    cache: Arc<MemoryCache>,
    policy: RefreshPolicy,
) -> DataStore<FakeApi, Arc<MemoryCache>> {
    DataStore::new(api, cache, "u1", policy)
}

/// Two overlapping refreshes where the first one issued completes last.
fn script_race(api: &FakeApi) {
    api.push_shops(100, Ok(vec![raw_shop("s1", "Old Stores")]));
    api.push_bills(100, Ok(vec![raw_bill("b-old", 10.0)]));
    api.push_shops(10, Ok(vec![raw_shop("s1", "New Stores")]));
    api.push_bills(10, Ok(vec![raw_bill("b-new", 20.0)]));
}

#[tokio::test]
async fn refresh_builds_snapshot_and_writes_cache() {
    let api = FakeApi::default();
    api.push_shops(0, Ok(vec![raw_shop("s1", "Anna Stores")]));
    api.push_bills(0, Ok(vec![raw_bill("b1", 45.0)]));
    let cache = Arc::new(MemoryCache::new());
    let store = new_store(api, Arc::clone(&cache), RefreshPolicy::default());

    assert!(store.snapshot().await.is_empty());
    assert_eq!(store.refresh().await, RefreshOutcome::Applied);

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.shops[0].name, "Anna Stores");
    assert_eq!(snapshot.bills[0].items()[0].name, "Tea");
    assert_eq!(snapshot.shop_stats()[0].total_pending, 45.0);

    let cached: Vec<Shop> = serde_json::from_str(&cache.get(SHOPS_KEY).unwrap()).unwrap();
    assert_eq!(cached, snapshot.shops);
    let cached: Vec<Bill> = serde_json::from_str(&cache.get(BILLS_KEY).unwrap()).unwrap();
    assert_eq!(cached, snapshot.bills);
}

#[tokio::test]
async fn cache_seeds_a_new_store() {
    let api = FakeApi::default();
    api.push_shops(0, Ok(vec![raw_shop("s1", "Anna Stores")]));
    api.push_bills(0, Ok(vec![raw_bill("b1", 45.0)]));
    let cache = Arc::new(MemoryCache::new());
    new_store(api, Arc::clone(&cache), RefreshPolicy::default())
        .refresh()
        .await;

    let reopened = new_store(FakeApi::default(), cache, RefreshPolicy::default());
    let snapshot = reopened.snapshot().await;
    assert_eq!(snapshot.shops.len(), 1);
    assert_eq!(snapshot.bills[0].id, "b1");
}

#[tokio::test]
async fn unreadable_cache_starts_empty() {
    let cache = Arc::new(MemoryCache::new());
    cache.set(SHOPS_KEY, "{broken".to_string()).unwrap();
    let store = new_store(FakeApi::default(), cache, RefreshPolicy::default());
    assert!(store.snapshot().await.is_empty());
}

#[tokio::test]
async fn failed_fetch_degrades_to_empty() {
    let api = FakeApi::default();
    api.push_shops(0, Err(StoreError::Status(502)));
    api.push_bills(0, Ok(vec![raw_bill("b1", 45.0)]));
    let store = new_store(api, Arc::new(MemoryCache::new()), RefreshPolicy::default());

    assert_eq!(store.refresh().await, RefreshOutcome::Applied);
    let snapshot = store.snapshot().await;
    assert!(snapshot.shops.is_empty());
    assert_eq!(snapshot.bills.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn last_response_wins_lets_a_slow_refresh_overwrite() {
    let api = FakeApi::default();
    script_race(&api);
    let cache = Arc::new(MemoryCache::new());
    let store = new_store(api, Arc::clone(&cache), RefreshPolicy::LastResponseWins);

    let (first, second) = tokio::join!(store.refresh(), store.refresh());
    assert_eq!(first, RefreshOutcome::Applied);
    assert_eq!(second, RefreshOutcome::Applied);

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.shops[0].name, "Old Stores");
    assert_eq!(snapshot.bills[0].id, "b-old");

    let cached: Vec<Bill> = serde_json::from_str(&cache.get(BILLS_KEY).unwrap()).unwrap();
    assert_eq!(cached[0].id, "b-old");
}

#[tokio::test(start_paused = true)]
async fn discard_stale_drops_the_older_response() {
    let api = FakeApi::default();
    script_race(&api);
    let cache = Arc::new(MemoryCache::new());
    let store = new_store(api, Arc::clone(&cache), RefreshPolicy::DiscardStale);

    let (first, second) = tokio::join!(store.refresh(), store.refresh());
    assert_eq!(first, RefreshOutcome::Discarded);
    assert_eq!(second, RefreshOutcome::Applied);

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.shops[0].name, "New Stores");
    assert_eq!(snapshot.bills[0].id, "b-new");

    let cached: Vec<Bill> = serde_json::from_str(&cache.get(BILLS_KEY).unwrap()).unwrap();
    assert_eq!(cached[0].id, "b-new");
}

#[tokio::test(start_paused = true)]
async fn readers_see_shops_and_bills_from_the_same_refresh() {
    let api = FakeApi::default();
    api.push_shops(0, Ok(vec![raw_shop("s1", "First")]));
    api.push_bills(0, Ok(vec![raw_bill("b-first", 1.0)]));
    api.push_shops(5, Ok(vec![raw_shop("s1", "Second")]));
    api.push_bills(50, Ok(vec![raw_bill("b-second", 2.0)]));
    let store = new_store(api, Arc::new(MemoryCache::new()), RefreshPolicy::default());
    store.refresh().await;

    let observe = async {
        // Shops of the second refresh have arrived, its bills have not.
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.snapshot().await
    };
    let (_, mid) = tokio::join!(store.refresh(), observe);
    assert_eq!(mid.shops[0].name, "First");
    assert_eq!(mid.bills[0].id, "b-first");

    let done = store.snapshot().await;
    assert_eq!(done.shops[0].name, "Second");
    assert_eq!(done.bills[0].id, "b-second");
}

/// Parks the first cache write until the test releases it.
struct GatedCache {
    inner: MemoryCache,
    gated: AtomicBool,
    writing: Barrier,
    release: Barrier,
}

impl GatedCache {
    fn new() -> Self {
        Self {
            inner: MemoryCache::new(),
            gated: AtomicBool::new(true),
            writing: Barrier::new(2),
            release: Barrier::new(2),
        }
    }
}

impl Cache for GatedCache {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: String) -> StoreResult<()> {
        if self.gated.swap(false, Ordering::SeqCst) {
            self.writing.wait();
            self.release.wait();
        }
        self.inner.set(key, value)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn readers_are_not_blocked_by_cache_writes() {
    let api = FakeApi::default();
    api.push_shops(0, Ok(vec![raw_shop("s1", "Anna Stores")]));
    api.push_bills(0, Ok(vec![raw_bill("b1", 45.0)]));
    let cache = Arc::new(GatedCache::new());
    let store = Arc::new(DataStore::new(
        api,
        Arc::clone(&cache),
        "u1",
        RefreshPolicy::default(),
    ));

    let refreshing = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.refresh().await }
    });
    let gate = Arc::clone(&cache);
    tokio::task::spawn_blocking(move || {
        gate.writing.wait();
    })
    .await
    .unwrap();

    // The refresh is now inside the cache write.
    let snapshot = tokio::time::timeout(Duration::from_secs(5), store.snapshot())
        .await
        .expect("snapshot read waited on the cache write");
    assert_eq!(snapshot.shops[0].name, "Anna Stores");
    assert_eq!(snapshot.bills[0].id, "b1");
    assert!(cache.get(SHOPS_KEY).is_none());

    let gate = Arc::clone(&cache);
    tokio::task::spawn_blocking(move || {
        gate.release.wait();
    })
    .await
    .unwrap();
    assert_eq!(refreshing.await.unwrap(), RefreshOutcome::Applied);
    assert!(cache.get(SHOPS_KEY).is_some());
    assert!(cache.get(BILLS_KEY).is_some());
}

#[tokio::test]
async fn save_bill_refreshes_after_success() {
    let api = FakeApi::default();
    api.push_shops(0, Ok(vec![raw_shop("s1", "Anna Stores")]));
    api.push_bills(0, Ok(vec![raw_bill("b1", 45.0)]));
    let store = new_store(api.clone(), Arc::new(MemoryCache::new()), RefreshPolicy::default());

    let created = Utc.with_ymd_and_hms(2024, 6, 2, 9, 0, 0).unwrap();
    let bill = Bill {
        id: "b1".to_string(),
        shop_id: "s1".to_string(),
        amount: 45.0,
        items: None,
        status: BillStatus::NotPaid,
        created_at: created,
        updated_at: created,
    };
    assert_eq!(store.save_bill(&bill).await.unwrap(), RefreshOutcome::Applied);

    assert_eq!(api.saved_bills.lock().unwrap().as_slice(), &[bill]);
    assert_eq!(api.pending_scripts(), 0);
    assert_eq!(store.snapshot().await.bills.len(), 1);
}

#[tokio::test]
async fn failed_write_propagates_without_refresh() {
    let api = FakeApi {
        reject_writes: true,
        ..FakeApi::default()
    };
    api.push_shops(0, Ok(vec![raw_shop("s1", "Anna Stores")]));
    let store = new_store(api.clone(), Arc::new(MemoryCache::new()), RefreshPolicy::default());

    let err = store.delete_shop("s1").await.unwrap_err();
    assert!(matches!(err, StoreError::Api(ref msg) if msg == "sheet is read-only"));
    assert_eq!(api.pending_scripts(), 1);
    assert!(api.deleted.lock().unwrap().is_empty());
    assert!(store.snapshot().await.is_empty());
}

#[tokio::test]
async fn delete_bill_refreshes() {
    let api = FakeApi::default();
    let store = new_store(api.clone(), Arc::new(MemoryCache::new()), RefreshPolicy::default());
    store.delete_bill("b9").await.unwrap();
    assert_eq!(api.deleted.lock().unwrap().as_slice(), &["b9".to_string()]);
}
