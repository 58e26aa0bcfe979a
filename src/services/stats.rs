//! Monthly spending statistics.
//!
//! Filters the full expense list down to one calendar month, totals it, derives
//! a per-day average and groups amounts by category. Pure and synchronous:
//! callers fetch the expense snapshot first and pass "now" in explicitly.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;

use crate::models::{CategoryRegistry, Expense};
use crate::month::{month_range, MonthKey, TimeRange};

/// Which day count the monthly total is divided by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AverageBasis {
    /// Today's day of month, whichever month is selected.
    #[default]
    CurrentDay,
    /// Days elapsed in the selected month: all of them for past months,
    /// today's day for the current month, none for future months.
    SelectedMonth,
}

impl AverageBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentDay => "current-day",
            Self::SelectedMonth => "selected-month",
        }
    }
}

impl FromStr for AverageBasis {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current-day" => Ok(Self::CurrentDay),
            "selected-month" => Ok(Self::SelectedMonth),
            _ => Err(()),
        }
    }
}

/// One slice of the category breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub category_id: String,
    pub name: String,
    pub emoji: String,
    pub color: String,
    pub total_cents: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyStats {
    pub month: MonthKey,
    pub label: String,
    pub range: TimeRange,
    pub expense_count: usize,
    pub total_cents: i64,
    pub average_basis: AverageBasis,
    /// Day count used for the average; `None` when no day of the month has elapsed.
    pub days_counted: Option<u32>,
    /// `None` for an empty month, which renders the "no expenses" branch instead.
    pub average_per_day_cents: Option<i64>,
    pub by_category: BTreeMap<String, i64>,
    pub rows: Vec<CategoryRow>,
}

impl MonthlyStats {
    pub fn is_empty(&self) -> bool {
        self.expense_count == 0
    }
}

/// Expenses created within `range`, both ends inclusive.
pub fn monthly_subset(expenses: &[Expense], range: TimeRange) -> Vec<&Expense> {
    expenses
        .iter()
        .filter(|e| range.contains(e.created_at))
        .collect()
}

/// Sum of amounts, saturating at `i64::MAX` rather than wrapping.
pub fn total_cents<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> i64 {
    expenses
        .into_iter()
        .fold(0_i64, |acc, e| acc.saturating_add(e.amount_cents))
}

/// Summed amount per category id. Sums saturate like [`total_cents`].
pub fn group_by_category<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
) -> BTreeMap<String, i64> {
    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    for expense in expenses {
        let total = totals.entry(expense.category_id.clone()).or_insert(0);
        *total = total.saturating_add(expense.amount_cents);
    }
    totals
}

/// Number of days the monthly total is spread over, per `basis`.
pub fn days_for_average(basis: AverageBasis, selected: MonthKey, today: MonthDay) -> Option<u32> {
    match basis {
        AverageBasis::CurrentDay => Some(today.day),
        AverageBasis::SelectedMonth => {
            let selected = selected.normalized();
            match selected.cmp(&today.month) {
                std::cmp::Ordering::Less => Some(selected.days_in_month()),
                std::cmp::Ordering::Equal => Some(today.day),
                std::cmp::Ordering::Greater => None,
            }
        }
    }
}

/// Today's month and day of month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthDay {
    pub month: MonthKey,
    pub day: u32,
}

impl MonthDay {
    pub fn of<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> Self {
        let date = now.with_timezone(tz).date_naive();
        Self {
            month: MonthKey::from_date(date),
            day: date.day(),
        }
    }
}

/// Resolve each grouped category to display rows, largest amount first.
pub fn category_rows(
    grouped: &BTreeMap<String, i64>,
    total_cents: i64,
    registry: &CategoryRegistry,
) -> Vec<CategoryRow> {
    let mut rows: Vec<CategoryRow> = grouped
        .iter()
        .map(|(category_id, &total)| {
            let display = registry.resolve(category_id);
            CategoryRow {
                category_id: category_id.clone(),
                name: display.name,
                emoji: display.emoji,
                color: display.color,
                total_cents: total,
                percentage: if total_cents > 0 {
                    (total as f64 / total_cents as f64) * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_cents
            .cmp(&a.total_cents)
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}

pub fn monthly_stats<Tz: TimeZone>(
    expenses: &[Expense],
    month: MonthKey,
    now: DateTime<Utc>,
    tz: &Tz,
    basis: AverageBasis,
    registry: &CategoryRegistry,
) -> MonthlyStats {
    let month = month.normalized();
    let range = month_range(month, tz);
    let subset = monthly_subset(expenses, range);

    let total_cents = total_cents(subset.iter().copied());
    let days_counted = days_for_average(basis, month, MonthDay::of(now, tz));
    let average_per_day_cents = match days_counted {
        Some(days) if days > 0 && !subset.is_empty() => {
            Some((total_cents as f64 / f64::from(days)).round() as i64)
        }
        _ => None,
    };

    let by_category = group_by_category(subset.iter().copied());
    let rows = category_rows(&by_category, total_cents, registry);

    tracing::debug!(
        month = %month.label(),
        expenses = subset.len(),
        total_cents,
        "Computed monthly stats"
    );

    MonthlyStats {
        month,
        label: month.label(),
        range,
        expense_count: subset.len(),
        total_cents,
        average_basis: basis,
        days_counted,
        average_per_day_cents,
        by_category,
        rows,
    }
}
