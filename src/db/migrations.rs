use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

/// Apply every `*.sql` file in `migrations_dir` that has not been applied yet,
/// in file-name order. Returns the number of files applied.
pub fn run_migrations(conn: &Connection, migrations_dir: &Path) -> rusqlite::Result<usize> {
    tracing::debug!(dir = %migrations_dir.display(), "Checking for database migrations");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let files = migration_files(migrations_dir);
    tracing::debug!(count = files.len(), "Found migration files");

    let mut applied = 0;
    for path in files {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        let already_applied: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM _migrations WHERE name = ?)",
            [&name],
            |row| row.get(0),
        )?;
        if already_applied {
            continue;
        }

        let sql = fs::read_to_string(&path)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        tracing::info!(migration = %name, "Applying migration");
        conn.execute_batch(&sql)?;
        conn.execute("INSERT INTO _migrations (name) VALUES (?)", [&name])?;
        applied += 1;
    }

    if applied > 0 {
        tracing::info!(count = applied, "Migrations applied successfully");
    } else {
        tracing::debug!("No new migrations to apply");
    }

    Ok(applied)
}

fn migration_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "sql"))
            .collect(),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Migrations directory not readable");
            Vec::new()
        }
    };
    files.sort();
    files
}
