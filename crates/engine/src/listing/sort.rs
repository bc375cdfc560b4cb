use std::cmp::Ordering;

use crate::Bill;

/// Ordering policy for a bill list. Only one is active at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BillSort {
    /// Unpaid bills first, newest first inside each group.
    #[default]
    StatusFirst,
    DateDesc,
    DateAsc,
    AmountDesc,
    AmountAsc,
}

impl BillSort {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StatusFirst => "status-first",
            Self::DateDesc => "date-desc",
            Self::DateAsc => "date-asc",
            Self::AmountDesc => "amount-desc",
            Self::AmountAsc => "amount-asc",
        }
    }

    pub fn compare(self, a: &Bill, b: &Bill) -> Ordering {
        match self {
            Self::StatusFirst => b
                .status
                .is_pending()
                .cmp(&a.status.is_pending())
                .then_with(|| b.created_at.cmp(&a.created_at)),
            Self::DateDesc => b.created_at.cmp(&a.created_at),
            Self::DateAsc => a.created_at.cmp(&b.created_at),
            Self::AmountDesc => b.amount.total_cmp(&a.amount),
            Self::AmountAsc => a.amount.total_cmp(&b.amount),
        }
    }

    /// Stable sort: bills equal on the active key keep their input order.
    pub fn sort(self, bills: &mut [&Bill]) {
        bills.sort_by(|a, b| self.compare(a, b));
    }
}
