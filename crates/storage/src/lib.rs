use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{Book, BookId, BookPatch};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every in-memory connection is its own database, so keep exactly one.
        let max_connections = if database_url.starts_with("sqlite::memory:") {
            1
        } else {
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_book(&self, title: &str, stock: i64) -> Result<Book> {
        let row = sqlx::query(
            "INSERT INTO books (title, stock) VALUES (?, ?) RETURNING id, title, stock",
        )
        .bind(title)
        .bind(stock)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert book")?;
        Ok(book_from_row(&row))
    }

    pub async fn get_book(&self, book_id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query("SELECT id, title, stock FROM books WHERE id = ?")
            .bind(book_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(book_from_row))
    }

    /// Lists books in id order. `search` is a case-insensitive substring match
    /// on the title; callers pass `None` for "no filter".
    pub async fn list_books(&self, search: Option<&str>) -> Result<Vec<Book>> {
        let rows = sqlx::query("SELECT id, title, stock FROM books ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .context("failed to list books")?;
        let books = rows.iter().map(book_from_row);
        // SQLite's lower() only folds ASCII.
        Ok(match search.map(str::to_lowercase) {
            Some(needle) => books
                .filter(|book| book.title.to_lowercase().contains(&needle))
                .collect(),
            None => books.collect(),
        })
    }

    pub async fn count_books(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Applies the set fields of `patch`; returns `None` when the book does not exist.
    pub async fn update_book(&self, book_id: BookId, patch: &BookPatch) -> Result<Option<Book>> {
        let row = sqlx::query(
            "UPDATE books
             SET title = COALESCE(?, title),
                 stock = COALESCE(?, stock)
             WHERE id = ?
             RETURNING id, title, stock",
        )
        .bind(patch.title.as_deref())
        .bind(patch.stock)
        .bind(book_id.0)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to update book {}", book_id.0))?;
        Ok(row.as_ref().map(book_from_row))
    }

    pub async fn delete_book(&self, book_id: BookId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(book_id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete book {}", book_id.0))?;
        Ok(result.rows_affected() > 0)
    }
}

fn book_from_row(row: &SqliteRow) -> Book {
    Book {
        id: BookId(row.get::<i64, _>(0)),
        title: row.get::<String, _>(1),
        stock: row.get::<i64, _>(2),
    }
}

pub fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
