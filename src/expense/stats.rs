//! Period resolution and shaping of grouped totals into the stats views.

use chrono::{Datelike, NaiveDate};

use super::filter::InputPolicy;
use super::models::{CategoryStat, MonthlyStat, StatsPeriod, StatsQuery, TotalStat};
use super::store::{GroupKey, GroupTotal};
use crate::errors::AppError;

pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

impl StatsPeriod {
    /// January 1 to December 31
    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            start_date: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end_date: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    /// First to last day of `month` (1-12)
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start_date = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            start_date,
            end_date: next_month.pred_opt()?,
        })
    }
}

/// The two windows a stats request reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindows {
    pub year: i32,
    pub month: Option<u32>,
    /// Window for category and total stats
    pub narrowed: StatsPeriod,
    /// Window for monthly stats, always the whole year
    pub full_year: StatsPeriod,
}

/// Resolve `year`/`month` against `today`.
///
/// Lenient: a bad year becomes the current year and a bad month is ignored.
/// Strict: either one is a validation error.
pub fn resolve_windows(
    query: &StatsQuery,
    policy: InputPolicy,
    today: NaiveDate,
) -> Result<StatsWindows, AppError> {
    let raw_year = query.year.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let raw_month = query.month.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let year = raw_year.map(|s| {
        s.parse::<i32>()
            .ok()
            .filter(|y| (MIN_YEAR..=MAX_YEAR).contains(y))
    });
    let month = raw_month.map(|s| s.parse::<u32>().ok().filter(|m| (1..=12).contains(m)));

    if policy == InputPolicy::Strict {
        let mut invalid = Vec::new();
        if matches!(year, Some(None)) {
            invalid.push("year");
        }
        if matches!(month, Some(None)) {
            invalid.push("month");
        }
        if !invalid.is_empty() {
            return Err(AppError::invalid_fields(&invalid));
        }
    }

    let year = year.flatten().unwrap_or_else(|| today.year());
    let month = month.flatten();

    let full_year = StatsPeriod::year(year)
        .ok_or_else(|| AppError::ValidationError(format!("Unsupported year {year}")))?;
    let narrowed = match month {
        Some(m) => StatsPeriod::month(year, m)
            .ok_or_else(|| AppError::ValidationError(format!("Unsupported month {m}")))?,
        None => full_year,
    };

    Ok(StatsWindows {
        year,
        month,
        narrowed,
        full_year,
    })
}

/// Category totals, largest first; equal totals ordered by label
pub fn category_stats(groups: Vec<GroupTotal>) -> Vec<CategoryStat> {
    let mut stats: Vec<CategoryStat> = groups
        .into_iter()
        .filter_map(|g| match g.key {
            GroupKey::Category(category) => Some(CategoryStat {
                category,
                total: g.total,
                count: g.count,
            }),
            _ => None,
        })
        .collect();
    stats.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    stats
}

/// Month totals in calendar order
pub fn monthly_stats(groups: Vec<GroupTotal>) -> Vec<MonthlyStat> {
    let mut stats: Vec<MonthlyStat> = groups
        .into_iter()
        .filter_map(|g| match g.key {
            GroupKey::Month(month) => Some(MonthlyStat {
                month,
                total: g.total,
                count: g.count,
            }),
            _ => None,
        })
        .collect();
    stats.sort_by_key(|s| s.month);
    stats
}

/// Grand total, zero when nothing matched
pub fn total_stat(groups: Vec<GroupTotal>) -> TotalStat {
    groups
        .into_iter()
        .filter(|g| g.key == GroupKey::All)
        .fold(TotalStat::zero(), |acc, g| TotalStat {
            total: acc.total + g.total,
            count: acc.count + g.count,
        })
}
