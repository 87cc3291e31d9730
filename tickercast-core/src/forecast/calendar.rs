//! Business-day stepping (Monday to Friday, no holiday calendar).

use chrono::{Datelike, NaiveDate, Weekday};

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// First business day strictly after `date`.
pub fn next_business_day(date: NaiveDate) -> NaiveDate {
    let mut next = date + chrono::Duration::days(1);
    while !is_business_day(next) {
        next += chrono::Duration::days(1);
    }
    next
}

/// The `count` business days following `after`, ascending.
pub fn business_days_after(after: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(count);
    let mut current = after;
    for _ in 0..count {
        current = next_business_day(current);
        days.push(current);
    }
    days
}
