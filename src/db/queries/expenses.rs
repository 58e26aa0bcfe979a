use crate::models::expense::Expense;
use rusqlite::{params, Connection, Row};
use tracing::{debug, trace};

const EXPENSE_COLUMNS: &str = "id, category_id, title, description, amount_cents, created_at";

/// Newest first. Entries sharing a millisecond fall back to insertion order
/// via `rowid`, which only grows for the rows still present.
const NEWEST_FIRST: &str = "ORDER BY created_at DESC, rowid DESC";

fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        category_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        amount_cents: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Every stored expense, newest first. Callers do their own filtering.
pub fn list_expenses(conn: &Connection) -> rusqlite::Result<Vec<Expense>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EXPENSE_COLUMNS} FROM expenses {NEWEST_FIRST}"
    ))?;
    let expenses = stmt
        .query_map([], expense_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    debug!(count = expenses.len(), "Listed expenses");
    Ok(expenses)
}

/// Expenses with `start <= created_at <= end`, newest first.
pub fn list_expenses_between(
    conn: &Connection,
    start: i64,
    end: i64,
) -> rusqlite::Result<Vec<Expense>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EXPENSE_COLUMNS} FROM expenses
         WHERE created_at >= ? AND created_at <= ?
         {NEWEST_FIRST}"
    ))?;
    let expenses = stmt
        .query_map(params![start, end], expense_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    trace!(start, end, count = expenses.len(), "Listed expenses in range");
    Ok(expenses)
}

pub fn insert_expense(conn: &Connection, expense: &Expense) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO expenses (id, category_id, title, description, amount_cents, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            expense.id,
            expense.category_id,
            expense.title,
            expense.description,
            expense.amount_cents,
            expense.created_at
        ],
    )?;
    debug!(expense_id = %expense.id, category = %expense.category_id, "Created expense");
    Ok(())
}

pub fn delete_expense(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM expenses WHERE id = ?", [id])?;
    if rows > 0 {
        debug!(expense_id = %id, "Deleted expense");
    }
    Ok(rows > 0)
}

pub fn count_expenses(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use std::path::Path;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, Path::new("migrations")).unwrap();
        conn
    }

    fn expense(id: &str, created_at: i64) -> Expense {
        Expense {
            id: id.into(),
            category_id: "food".into(),
            title: format!("Lunch {}", id),
            description: Some("with team".into()),
            amount_cents: 1250,
            created_at,
        }
    }

    #[test]
    fn test_insert_and_list() {
        let conn = conn();
        insert_expense(&conn, &expense("a", 1_000)).unwrap();

        assert_eq!(list_expenses(&conn).unwrap(), vec![expense("a", 1_000)]);
        assert_eq!(count_expenses(&conn).unwrap(), 1);
    }

    #[test]
    fn test_same_millisecond_keeps_insertion_order() {
        let conn = conn();
        // Ids chosen so that sorting by id would give the opposite order.
        for id in ["z-first", "m-second", "a-third"] {
            insert_expense(&conn, &expense(id, 5_000)).unwrap();
        }

        let ids: Vec<String> = list_expenses(&conn).unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["a-third", "m-second", "z-first"]);

        delete_expense(&conn, "a-third").unwrap();
        insert_expense(&conn, &expense("b-fourth", 5_000)).unwrap();
        let ids: Vec<String> = list_expenses_between(&conn, 5_000, 5_000)
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, ["b-fourth", "m-second", "z-first"]);
    }

    #[test]
    fn test_list_newest_first() {
        let conn = conn();
        insert_expense(&conn, &expense("old", 1_000)).unwrap();
        insert_expense(&conn, &expense("new", 3_000)).unwrap();
        insert_expense(&conn, &expense("mid", 2_000)).unwrap();

        let ids: Vec<String> = list_expenses(&conn).unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_range_is_inclusive() {
        let conn = conn();
        for (id, at) in [("before", 999), ("start", 1_000), ("end", 2_000), ("after", 2_001)] {
            insert_expense(&conn, &expense(id, at)).unwrap();
        }

        let ids: Vec<String> = list_expenses_between(&conn, 1_000, 2_000)
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["end", "start"]);
    }

    #[test]
    fn test_delete() {
        let conn = conn();
        insert_expense(&conn, &expense("a", 1_000)).unwrap();
        assert!(delete_expense(&conn, "a").unwrap());
        assert!(!delete_expense(&conn, "a").unwrap());
        assert_eq!(count_expenses(&conn).unwrap(), 0);
    }

    #[test]
    fn test_negative_amount_rejected_by_schema() {
        let conn = conn();
        let mut bad = expense("neg", 1_000);
        bad.amount_cents = -1;
        assert!(insert_expense(&conn, &bad).is_err());
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = conn();
        assert_eq!(run_migrations(&conn, Path::new("migrations")).unwrap(), 0);
    }
}
