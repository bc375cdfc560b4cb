//! In-memory data engine of the shop ledger.
//!
//! - [`ItemIndex`]: case-insensitive prefix search over item names.
//! - [`stats`]: per-shop totals and dashboard figures.
//! - [`listing`]: filter → sort → paginate pipeline for a shop's bills.
//! - [`drafts`]: forms that validate and produce shops and bills.
//!
//! Nothing here performs I/O. Callers hand in a [`Snapshot`] and rebuild the
//! derived values whenever it changes.

pub use bills::{Bill, BillItem, BillStatus};
pub use drafts::{BillDraft, ShopDraft};
pub use error::EngineError;
pub use item_index::ItemIndex;
pub use listing::{BillFilter, BillListState, BillSort};
pub use shops::Shop;
pub use snapshot::Snapshot;
pub use stats::{DashboardStats, ShopListQuery, ShopStat};

mod bills;
pub mod drafts;
mod error;
pub mod item_index;
pub mod listing;
mod shops;
mod snapshot;
pub mod stats;

type ResultEngine<T> = Result<T, EngineError>;
