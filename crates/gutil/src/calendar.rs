//! 日期计算与随机日期生成。
//!
//! 所有日期均为 `chrono` 的前推格里高利历 (`NaiveDate`)。

use chrono::{Datelike, Month, Months, NaiveDate};
use rand::Rng;

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

/// `start <= end` 时两个日期之间的完整年数。
///
/// 只有到达（或超过）起始日期的月和日，才算满一年。
fn full_years_forward(start: NaiveDate, end: NaiveDate) -> i32 {
    let years = end.year() - start.year();
    if (end.month(), end.day()) < (start.month(), start.day()) {
        years - 1
    } else {
        years
    }
}

/// 两个日期之间的完整年数；`start` 晚于 `end` 时为负数。
#[must_use]
pub fn full_years_between(start: NaiveDate, end: NaiveDate) -> i32 {
    if start > end {
        -full_years_forward(end, start)
    } else {
        full_years_forward(start, end)
    }
}

/// 两个日期之间的年数（含小数部分）。
///
/// 结果为完整年数加上剩余天数除以 365；`start` 晚于 `end` 时为负数。
/// 加上完整年数时 2 月 29 日会被截到 2 月 28 日。
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn years_between(start: NaiveDate, end: NaiveDate) -> f64 {
    let (from, to, sign) = if start > end {
        (end, start, -1.0)
    } else {
        (start, end, 1.0)
    };

    let full_years = full_years_forward(from, to);
    let anniversary = u32::try_from(full_years)
        .ok()
        .and_then(|years| years.checked_mul(12))
        .and_then(|months| from.checked_add_months(Months::new(months)))
        .unwrap_or(to);
    let days = to.signed_duration_since(anniversary).num_days();

    sign * (f64::from(full_years) + days as f64 / 365.0)
}

/// 两个日期之间相差的天数，相同日期为 0。
#[must_use]
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    end.signed_duration_since(start).num_days()
}

/// 月份在任意年份中的最少天数（2 月为 28）。
#[must_use]
pub const fn min_length(month: Month) -> u32 {
    match month {
        Month::February => 28,
        Month::April | Month::June | Month::September | Month::November => 30,
        _ => 31,
    }
}

/// 是否为闰年（366 天）。
#[must_use]
pub const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// 随机返回一个月份。
#[must_use]
pub fn random_month() -> Month {
    MONTHS[rand::rng().random_range(0..MONTHS.len())]
}

/// 随机返回该月中的一天。不考虑年份，因此 2 月永远不会返回 29。
#[must_use]
pub fn random_day_of_month(month: Month) -> u32 {
    rand::rng().random_range(1..=min_length(month))
}

/// 随机返回指定年份中该月的一天，闰年的 2 月可能返回 29。
#[must_use]
pub fn random_day_of_month_in_year(month: Month, year: i32) -> u32 {
    if month == Month::February && is_leap_year(year) {
        rand::rng().random_range(1..=29)
    } else {
        random_day_of_month(month)
    }
}

/// 随机返回指定年份中的一个日期。年份超出 `chrono` 的表示范围时返回 `None`。
#[must_use]
pub fn random_date(year: i32) -> Option<NaiveDate> {
    let month = random_month();
    let day = random_day_of_month_in_year(month, year);
    NaiveDate::from_ymd_opt(year, month.number_from_month(), day)
}
