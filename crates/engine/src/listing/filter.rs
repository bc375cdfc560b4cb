use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{Bill, BillStatus};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(BillStatus),
}

impl StatusFilter {
    fn matches(self, status: BillStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => status == wanted,
        }
    }
}

/// Inclusive amount bounds; a missing bound is unbounded on that side.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AmountRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AmountRange {
    /// Builds a range from raw form input. Blank or non-numeric text leaves
    /// that side unbounded.
    pub fn parse(min: &str, max: &str) -> Self {
        Self {
            min: parse_amount(min),
            max: parse_amount(max),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    fn contains(&self, amount: f64) -> bool {
        self.min.is_none_or(|min| amount >= min) && self.max.is_none_or(|max| amount <= max)
    }
}

/// Parses a user-typed amount. Accepts `.` or `,` as decimal separator.
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parses a calendar day written as `YYYY-MM-DD`.
pub fn parse_day(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DateFilter {
    #[default]
    All,
    /// Bills created from `now - N days` onwards.
    LastDays(u32),
    /// Whole calendar days, both ends inclusive.
    Range {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl DateFilter {
    /// Range from raw form input; malformed days are dropped.
    pub fn parse_range(from: &str, to: &str) -> Self {
        Self::Range {
            from: parse_day(from),
            to: parse_day(to),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::All | Self::Range { from: None, to: None })
    }

    /// Resolves the filter to absolute instants.
    pub fn window(&self, now: DateTime<Utc>, tz: Tz) -> DateWindow {
        match *self {
            Self::All => DateWindow::default(),
            Self::LastDays(days) => DateWindow {
                start: Some(now - Duration::days(i64::from(days))),
                end: None,
            },
            Self::Range { from, to } => DateWindow {
                start: from.map(|day| start_of_day(day, tz)),
                end: to.map(|day| end_of_day(day, tz)),
            },
        }
    }
}

/// Inclusive `[start, end]` instants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateWindow {
    fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| at >= start) && self.end.is_none_or(|end| at <= end)
    }
}

fn start_of_day(day: NaiveDate, tz: Tz) -> DateTime<Utc> {
    local_to_utc(day.and_time(NaiveTime::MIN), tz, true)
}

fn end_of_day(day: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let last_milli = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    local_to_utc(day.and_time(last_milli), tz, false)
}

// Wall-clock times skipped by a DST jump do not exist; step past the gap.
fn local_to_utc(local: NaiveDateTime, tz: Tz, earliest: bool) -> DateTime<Utc> {
    let pick = |at: NaiveDateTime| {
        let mapped = tz.from_local_datetime(&at);
        if earliest {
            mapped.earliest()
        } else {
            mapped.latest()
        }
    };
    pick(local)
        .or_else(|| pick(local + Duration::hours(1)))
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_else(|| local.and_utc())
}

/// Conjunction of the status, amount and date predicates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BillFilter {
    pub status: StatusFilter,
    pub amount: AmountRange,
    pub date: DateFilter,
}

impl BillFilter {
    /// Keeps the bills matching every predicate, preserving input order.
    pub fn apply<'a, I>(&self, bills: I, now: DateTime<Utc>, tz: Tz) -> Vec<&'a Bill>
    where
        I: IntoIterator<Item = &'a Bill>,
    {
        let window = self.date.window(now, tz);
        bills
            .into_iter()
            .filter(|bill| self.matches(bill, &window))
            .collect()
    }

    fn matches(&self, bill: &Bill, window: &DateWindow) -> bool {
        self.status.matches(bill.status)
            && self.amount.contains(bill.amount)
            && window.contains(bill.created_at)
    }
}
