//! Text rendering of amounts and bill timestamps.

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

/// Rupee amount with Indian digit grouping (`₹12,34,567.5`).
///
/// At most two fraction digits are shown; trailing zeros are dropped down to
/// `min_fraction` digits.
pub fn rupees(value: f64, min_fraction: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let cents = (value.abs() * 100.0).round() as u64;
    let (whole, frac) = (cents / 100, cents % 100);

    let mut out = String::new();
    if value < 0.0 && cents > 0 {
        out.push('-');
    }
    out.push('₹');
    out.push_str(&group_indian(whole));

    let mut frac = format!("{frac:02}");
    while frac.len() > min_fraction.min(2) && frac.ends_with('0') {
        frac.pop();
    }
    if !frac.is_empty() {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

// Last three digits, then groups of two.
fn group_indian(n: u64) -> String {
    let digits = n.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (mut head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    while head.len() > 2 {
        let (rest, group) = head.split_at(head.len() - 2);
        groups.push(group);
        head = rest;
    }
    groups.push(head);
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

/// Part of the day a bill was written in, by local hour.
pub fn session(hour: u32) -> &'static str {
    match hour {
        5..=11 => "morning",
        12..=16 => "afternoon",
        17..=20 => "evening",
        _ => "night",
    }
}

/// `01 Jun, 10:30 AM (morning)` in the ledger's time zone.
pub fn bill_time(at: DateTime<Utc>, tz: Tz) -> String {
    let local = at.with_timezone(&tz);
    format!(
        "{} ({})",
        local.format("%d %b, %I:%M %p"),
        session(local.hour())
    )
}
