//! Due date arithmetic for recurring tasks.
//!
//! Days and weeks are fixed-length steps. Months move on the calendar: the day
//! of month is kept when the target month has it and clamped to the target
//! month's last day otherwise, so Jan 31 advances to Feb 29 in a leap year and
//! to Feb 28 in any other. Time of day and UTC offset are always preserved.

use crate::model::Recurrence;
use time::util::days_in_year_month;
use time::{Date, Duration, Month, OffsetDateTime};

/// Advances `due` by `interval` units of `unit`.
///
/// Returns `None` when the result falls outside the representable calendar.
pub fn next_due_date(due: OffsetDateTime, unit: Recurrence, interval: u32) -> Option<OffsetDateTime> {
    match unit {
        Recurrence::Daily => due.checked_add(Duration::days(i64::from(interval))),
        Recurrence::Weekly => due.checked_add(Duration::weeks(i64::from(interval))),
        Recurrence::Monthly => {
            let date = add_months(due.date(), interval)?;
            Some(due.replace_date(date))
        }
    }
}

fn add_months(date: Date, months: u32) -> Option<Date> {
    let zero_based = i64::from(date.year()) * 12 + i64::from(u8::from(date.month()) - 1);
    let target = zero_based.checked_add(i64::from(months))?;
    let year = i32::try_from(target.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(target.rem_euclid(12) + 1).ok()?).ok()?;
    let day = date.day().min(days_in_year_month(year, month));
    Date::from_calendar_date(year, month, day).ok()
}
