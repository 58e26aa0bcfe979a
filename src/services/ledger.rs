//! The daily ledger: one day's expenses, newest first.
//!
//! [`Ledger`] holds the add/delete rules on an in-memory list. The
//! `load_day` / `record` / `remove` helpers write those same operations
//! through to the expense store, so the daily page and the statistics page
//! read from one source of truth.

use chrono::{NaiveDate, TimeZone};
use rusqlite::Connection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::queries::expenses;
use crate::models::{Expense, ExpenseDraft};
use crate::month::day_range;
use crate::services::stats;

#[derive(Debug, Clone)]
pub struct Ledger {
    day: NaiveDate,
    entries: Vec<Expense>,
}

impl Ledger {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            entries: Vec::new(),
        }
    }

    /// Build from stored entries. The sort is stable, so entries sharing a
    /// timestamp keep the store's newest-first order.
    pub fn from_entries(day: NaiveDate, mut entries: Vec<Expense>) -> Self {
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self { day, entries }
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn entries(&self) -> &[Expense] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_cents(&self) -> i64 {
        stats::total_cents(&self.entries)
    }

    /// Prepend a new entry stamped with a fresh id and the clock's time.
    ///
    /// An empty title or amount (or an unparseable amount) leaves the ledger
    /// untouched and returns `None`.
    pub fn add(&mut self, draft: &ExpenseDraft, clock: &dyn Clock) -> Option<&Expense> {
        let new_expense = draft.validate()?;
        let expense = new_expense.into_expense(Uuid::new_v4().to_string(), clock.now_millis());
        self.entries.insert(0, expense);
        self.entries.first()
    }

    /// Remove the entry with `id`. Unknown ids are a no-op.
    pub fn delete(&mut self, id: &str) -> Option<Expense> {
        let position = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(position))
    }
}

/// Load the ledger for a local calendar day from the store.
pub fn load_day<Tz: TimeZone>(
    conn: &Connection,
    day: NaiveDate,
    tz: &Tz,
) -> rusqlite::Result<Ledger> {
    let range = day_range(day, tz);
    let entries = expenses::list_expenses_between(conn, range.start, range.end)?;
    debug!(%day, count = entries.len(), "Loaded ledger");
    Ok(Ledger::from_entries(day, entries))
}

/// Add to the ledger and persist the new entry. `Ok(None)` means the draft was rejected.
pub fn record(
    conn: &Connection,
    ledger: &mut Ledger,
    draft: &ExpenseDraft,
    clock: &dyn Clock,
) -> rusqlite::Result<Option<Expense>> {
    let Some(expense) = ledger.add(draft, clock).cloned() else {
        debug!("Ignored incomplete expense draft");
        return Ok(None);
    };
    expenses::insert_expense(conn, &expense)?;
    info!(expense_id = %expense.id, amount_cents = expense.amount_cents, "Recorded expense");
    Ok(Some(expense))
}

/// Delete from the ledger and the store. Returns whether anything was removed.
pub fn remove(conn: &Connection, ledger: &mut Ledger, id: &str) -> rusqlite::Result<bool> {
    match ledger.delete(id) {
        Some(expense) => {
            expenses::delete_expense(conn, &expense.id)?;
            info!(expense_id = %expense.id, "Removed expense");
            Ok(true)
        }
        None => {
            debug!(expense_id = %id, "Delete ignored, not in ledger");
            Ok(false)
        }
    }
}
