//! Bill list shown for one shop: filter, then sort, then paginate.
//!
//! Each stage is a pure transform of the previous stage's output. Bad filter
//! input never fails; it just stops constraining the list.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::Bill;

mod filter;
mod page;
mod sort;

pub use filter::{
    AmountRange, BillFilter, DateFilter, DateWindow, StatusFilter, parse_amount, parse_day,
};
pub use page::{DEFAULT_BATCH_SIZE, Pager};
pub use sort::BillSort;

/// Time zone used to turn calendar days into instants by default.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Kolkata;

/// Filters and sorts `bills` without paginating.
pub fn process<'a, I>(
    bills: I,
    filter: &BillFilter,
    sort: BillSort,
    now: DateTime<Utc>,
    tz: Tz,
) -> Vec<&'a Bill>
where
    I: IntoIterator<Item = &'a Bill>,
{
    let mut result = filter.apply(bills, now, tz);
    sort.sort(&mut result);
    result
}

/// The visible slice of a processed bill list.
#[derive(Clone, Debug)]
pub struct BillPage<'a> {
    pub bills: Vec<&'a Bill>,
    /// Length of the whole filtered and sorted list.
    pub total: usize,
    pub has_more: bool,
}

/// User-selected criteria for a shop's bill list plus its pagination.
///
/// Every criteria change resets pagination to the first batch.
#[derive(Clone, Debug)]
pub struct BillListState {
    filter: BillFilter,
    sort: BillSort,
    pager: Pager,
    tz: Tz,
}

impl Default for BillListState {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE, DEFAULT_BATCH_SIZE)
    }
}

impl BillListState {
    pub fn new(tz: Tz, batch_size: usize) -> Self {
        Self {
            filter: BillFilter::default(),
            sort: BillSort::default(),
            pager: Pager::new(batch_size),
            tz,
        }
    }

    pub fn filter(&self) -> &BillFilter {
        &self.filter
    }

    pub fn sort(&self) -> BillSort {
        self.sort
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn set_filter(&mut self, filter: BillFilter) {
        self.filter = filter;
        self.pager.reset();
    }

    pub fn set_status(&mut self, status: StatusFilter) {
        self.filter.status = status;
        self.pager.reset();
    }

    pub fn set_amount(&mut self, amount: AmountRange) {
        self.filter.amount = amount;
        self.pager.reset();
    }

    pub fn set_date(&mut self, date: DateFilter) {
        self.filter.date = date;
        self.pager.reset();
    }

    pub fn set_sort(&mut self, sort: BillSort) {
        self.sort = sort;
        self.pager.reset();
    }

    /// Clears every criterion back to the defaults.
    pub fn clear(&mut self) {
        self.filter = BillFilter::default();
        self.sort = BillSort::default();
        self.pager.reset();
    }

    /// Bills of `shop_id`, filtered and sorted, not paginated.
    pub fn processed<'a>(
        &self,
        bills: &'a [Bill],
        shop_id: &str,
        now: DateTime<Utc>,
    ) -> Vec<&'a Bill> {
        process(
            bills.iter().filter(|bill| bill.shop_id == shop_id),
            &self.filter,
            self.sort,
            now,
            self.tz,
        )
    }

    /// The currently revealed part of the list.
    pub fn view<'a>(
        &self,
        bills: &'a [Bill],
        shop_id: &str,
        now: DateTime<Utc>,
    ) -> BillPage<'a> {
        let processed = self.processed(bills, shop_id, now);
        let total = processed.len();
        BillPage {
            bills: self.pager.page(&processed).to_vec(),
            total,
            has_more: self.pager.has_more(total),
        }
    }

    /// Reveals one more batch if the list is longer than what is shown.
    pub fn reveal_more(&mut self, total: usize) -> bool {
        self.pager.reveal_more(total)
    }

    /// Number of criteria that differ from the defaults.
    pub fn active_filter_count(&self) -> usize {
        usize::from(self.filter.status != StatusFilter::All)
            + usize::from(self.sort != BillSort::StatusFirst)
            + usize::from(!self.filter.amount.is_unbounded())
            + usize::from(!self.filter.date.is_unbounded())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::BillStatus;

    fn bill(id: &str, shop_id: &str, amount: f64, status: BillStatus, minute: u32) -> Bill {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 10, minute, 0).unwrap();
        Bill {
            id: id.to_string(),
            shop_id: shop_id.to_string(),
            amount,
            items: None,
            status,
            created_at: at,
            updated_at: at,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap()
    }

    #[test]
    fn unpaid_by_amount_desc() {
        let bills = [
            bill("a", "s1", 50.0, BillStatus::Paid, 0),
            bill("b", "s1", 200.0, BillStatus::NotPaid, 1),
            bill("c", "s1", 10.0, BillStatus::NotPaid, 2),
        ];
        let mut state = BillListState::default();
        state.set_status(StatusFilter::Only(BillStatus::NotPaid));
        state.set_sort(BillSort::AmountDesc);

        let amounts: Vec<f64> = state
            .processed(&bills, "s1", now())
            .iter()
            .map(|b| b.amount)
            .collect();
        assert_eq!(amounts, vec![200.0, 10.0]);
        assert_eq!(state.active_filter_count(), 2);
    }

    #[test]
    fn only_the_requested_shop_is_listed() {
        let bills = [
            bill("a", "s1", 1.0, BillStatus::Paid, 0),
            bill("b", "s2", 2.0, BillStatus::Paid, 1),
        ];
        let page = BillListState::default().view(&bills, "s2", now());
        assert_eq!(page.total, 1);
        assert_eq!(page.bills[0].id, "b");
    }

    #[test]
    fn criteria_change_resets_pagination() {
        let bills: Vec<Bill> = (0..40)
            .map(|i| bill(&format!("b{i}"), "s1", f64::from(i), BillStatus::Paid, i))
            .collect();
        let changes: [fn(&mut BillListState); 6] = [
            |state| state.set_sort(BillSort::AmountAsc),
            |state| state.set_status(StatusFilter::Only(BillStatus::Paid)),
            |state| state.set_amount(AmountRange::parse("0", "")),
            |state| state.set_date(DateFilter::All),
            |state| state.set_filter(BillFilter::default()),
            BillListState::clear,
        ];

        for change in changes {
            let mut state = BillListState::default();
            assert!(state.reveal_more(40));
            assert_eq!(state.view(&bills, "s1", now()).bills.len(), 30);

            change(&mut state);
            let page = state.view(&bills, "s1", now());
            assert_eq!(page.bills.len(), DEFAULT_BATCH_SIZE);
            assert!(page.has_more);
        }
    }

    #[test]
    fn malformed_bounds_do_not_filter() {
        let bills = [
            bill("a", "s1", 5.0, BillStatus::Paid, 0),
            bill("b", "s1", 500.0, BillStatus::Paid, 1),
        ];
        let mut state = BillListState::default();
        state.set_amount(AmountRange::parse("five", ""));
        state.set_date(DateFilter::parse_range("yesterday", ""));
        assert_eq!(state.processed(&bills, "s1", now()).len(), 2);
        assert_eq!(state.active_filter_count(), 0);
    }

    #[test]
    fn revealing_until_exhausted_yields_everything_in_order() {
        let bills: Vec<Bill> = (0..52)
            .map(|i| bill(&format!("b{i}"), "s1", f64::from(i % 7), BillStatus::NotPaid, i))
            .collect();
        let mut state = BillListState::new(chrono_tz::UTC, 15);
        state.set_sort(BillSort::AmountDesc);

        let full: Vec<String> = state
            .processed(&bills, "s1", now())
            .iter()
            .map(|b| b.id.clone())
            .collect();
        while state.reveal_more(full.len()) {}
        let shown: Vec<String> = state
            .view(&bills, "s1", now())
            .bills
            .iter()
            .map(|b| b.id.clone())
            .collect();
        assert_eq!(shown, full);

        let mut deduped = shown.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), bills.len());
    }
}
