//! Compiles raw list parameters into an owner-scoped predicate and a page window.
//!
//! The predicate is a plain data structure. Each [`ExpenseStore`] renders it for its
//! own backend, and [`ExpensePredicate::matches`] is the reference semantics every
//! rendering must agree with.
//!
//! [`ExpenseStore`]: super::store::ExpenseStore

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use uuid::Uuid;

use super::models::{Expense, ExpenseCategory, ExpenseQuery};
use crate::errors::AppError;

pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Category value that disables category filtering
pub const ALL_CATEGORIES: &str = "all";

/// How a date range with a single bound is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRangePolicy {
    /// Both bounds must be present, a lone bound is ignored
    #[default]
    BothRequired,
    /// A lone bound filters one side only
    OpenEnded,
}

impl FromStr for DateRangePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "both-required" => Ok(DateRangePolicy::BothRequired),
            "open-ended" => Ok(DateRangePolicy::OpenEnded),
            other => Err(format!(
                "unknown date range policy '{other}', expected 'both-required' or 'open-ended'"
            )),
        }
    }
}

/// How malformed query inputs are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputPolicy {
    /// Malformed values fall back to defaults or are dropped
    #[default]
    Lenient,
    /// Malformed values are rejected with a validation error
    Strict,
}

impl FromStr for InputPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "lenient" => Ok(InputPolicy::Lenient),
            "strict" => Ok(InputPolicy::Strict),
            other => Err(format!(
                "unknown input policy '{other}', expected 'lenient' or 'strict'"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryPolicy {
    pub date_range: DateRangePolicy,
    pub input: InputPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Description,
}

impl TextField {
    pub fn column(&self) -> &'static str {
        match self {
            TextField::Title => "title",
            TextField::Description => "description",
        }
    }

    fn value<'a>(&self, expense: &'a Expense) -> Option<&'a str> {
        match self {
            TextField::Title => Some(expense.title.as_str()),
            TextField::Description => expense.description.as_deref(),
        }
    }
}

/// One constraint of a predicate, combined with AND
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Exact label match. An unknown label is kept as given and matches nothing.
    CategoryEquals(String),
    /// Inclusive on both ends; a missing bound is unbounded
    DateInRange {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    /// Case-insensitive substring match against any of the fields.
    /// Build with [`Clause::text_match_any`] so `needle` is already lowercased.
    TextMatchAny {
        needle: String,
        fields: Vec<TextField>,
    },
}

impl Clause {
    pub fn text_match_any(needle: &str, fields: Vec<TextField>) -> Self {
        Clause::TextMatchAny {
            needle: needle.to_lowercase(),
            fields,
        }
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        match self {
            Clause::CategoryEquals(category) => expense.category == *category,
            Clause::DateInRange { from, to } => {
                from.map_or(true, |from| expense.expense_date >= from)
                    && to.map_or(true, |to| expense.expense_date <= to)
            }
            Clause::TextMatchAny { needle, fields } => fields.iter().any(|field| {
                field
                    .value(expense)
                    .is_some_and(|value| value.to_lowercase().contains(needle.as_str()))
            }),
        }
    }
}

/// Owner-scoped conjunction of clauses.
///
/// The owner is fixed at construction and cannot be replaced by a clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpensePredicate {
    owner: Uuid,
    clauses: Vec<Clause>,
}

impl ExpensePredicate {
    pub fn for_owner(owner: Uuid) -> Self {
        Self {
            owner,
            clauses: Vec::new(),
        }
    }

    pub fn with(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        expense.owner_id == self.owner && self.clauses.iter().all(|c| c.matches(expense))
    }
}

/// Result ordering for listed expenses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpenseSort {
    /// Newest expense date first, ties by creation time then id
    #[default]
    DateDesc,
}

impl ExpenseSort {
    pub fn compare(&self, a: &Expense, b: &Expense) -> Ordering {
        match self {
            ExpenseSort::DateDesc => b
                .expense_date
                .cmp(&a.expense_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id)),
        }
    }

    pub fn order_by_sql(&self) -> &'static str {
        match self {
            ExpenseSort::DateDesc => " ORDER BY expense_date DESC, created_at ASC, id ASC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 1-indexed
    pub page: i64,
    pub page_size: i64,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageWindow {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            return 0;
        }
        // No `total + size - 1`: page sizes are uncapped and may be near i64::MAX
        total / self.page_size + i64::from(total % self.page_size != 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub predicate: ExpensePredicate,
    pub sort: ExpenseSort,
    pub window: PageWindow,
}

/// Outcome of reading one optional raw parameter
enum Param<T> {
    Absent,
    Valid(T),
    Invalid,
}

impl<T> Param<T> {
    fn read(raw: Option<&str>, parse: impl FnOnce(&str) -> Option<T>) -> Self {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Param::Absent,
            Some(s) => parse(s).map_or(Param::Invalid, Param::Valid),
        }
    }

    fn valid(self) -> Option<T> {
        match self {
            Param::Valid(value) => Some(value),
            _ => None,
        }
    }
}

/// Parse a calendar date, accepting `YYYY-MM-DD` or an RFC 3339 timestamp
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

fn parse_positive(s: &str) -> Option<i64> {
    s.parse::<i64>().ok().filter(|n| *n > 0)
}

/// Compile raw list parameters for `owner`.
///
/// Only fails under [`InputPolicy::Strict`], naming every malformed parameter.
pub fn compile(
    owner: Uuid,
    query: &ExpenseQuery,
    policy: QueryPolicy,
) -> Result<CompiledQuery, AppError> {
    let mut invalid = Vec::new();

    let page = Param::read(query.page.as_deref(), parse_positive);
    let page_size = Param::read(query.limit.as_deref(), parse_positive);
    let raw_category = query.category.as_deref().map(str::trim);
    let category = Param::read(raw_category, |s| {
        if s == ALL_CATEGORIES {
            Some(None)
        } else {
            ExpenseCategory::parse(s).map(Some)
        }
    });
    let start = Param::read(query.start_date.as_deref(), parse_date);
    let end = Param::read(query.end_date.as_deref(), parse_date);

    for (name, is_invalid) in [
        ("page", matches!(page, Param::Invalid)),
        ("limit", matches!(page_size, Param::Invalid)),
        ("category", matches!(category, Param::Invalid)),
        ("startDate", matches!(start, Param::Invalid)),
        ("endDate", matches!(end, Param::Invalid)),
    ] {
        if is_invalid {
            invalid.push(name);
        }
    }

    if policy.input == InputPolicy::Strict && !invalid.is_empty() {
        return Err(AppError::invalid_fields(&invalid));
    }

    let window = PageWindow {
        page: page.valid().unwrap_or(1),
        page_size: page_size.valid().unwrap_or(DEFAULT_PAGE_SIZE),
    };

    let mut predicate = ExpensePredicate::for_owner(owner);

    // Lenient keeps an unknown label as an equality that matches nothing
    let category_label = match category {
        Param::Valid(Some(known)) => Some(known.as_str().to_string()),
        Param::Invalid => raw_category.map(str::to_string),
        _ => None,
    };
    if let Some(label) = category_label {
        predicate = predicate.with(Clause::CategoryEquals(label));
    }

    let (from, to) = (start.valid(), end.valid());
    let date_clause = match policy.date_range {
        DateRangePolicy::BothRequired => from.zip(to).map(|(from, to)| Clause::DateInRange {
            from: Some(from),
            to: Some(to),
        }),
        DateRangePolicy::OpenEnded if from.is_some() || to.is_some() => {
            Some(Clause::DateInRange { from, to })
        }
        DateRangePolicy::OpenEnded => None,
    };
    if let Some(clause) = date_clause {
        predicate = predicate.with(clause);
    }

    if let Some(needle) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        predicate = predicate.with(Clause::text_match_any(
            needle,
            vec![TextField::Title, TextField::Description],
        ));
    }

    Ok(CompiledQuery {
        predicate,
        sort: ExpenseSort::default(),
        window,
    })
}
