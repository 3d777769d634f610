use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Sqlite, SqlitePool};

/// Connect to the SQLite database, creating the file and schema on first run.
pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    if !Sqlite::database_exists(url).await.unwrap_or(false) {
        Sqlite::create_database(url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Uniqueness of user email/login and transaction public ids is enforced
/// here; the services translate constraint violations into conflicts.
async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            login TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            public_id TEXT NOT NULL UNIQUE,
            amount REAL NOT NULL,
            status TEXT NOT NULL,
            date TEXT NOT NULL,
            description TEXT,
            currency TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transactions_status_amount ON transactions (status, amount)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions (date)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_amount ON transactions (amount)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Fresh in-memory database with a unique name per test. Shared cache keeps
/// it alive across the pool's connections.
#[cfg(test)]
pub async fn connect_test() -> SqlitePool {
    let test_id = uuid::Uuid::new_v4().to_string();
    let url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);
    connect(&url).await.expect("Failed to create test database")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_is_idempotent() {
        let pool = connect_test().await;
        // Running the schema again must not fail on existing tables/indexes.
        init_schema(&pool).await.expect("second init failed");
    }

    #[tokio::test]
    async fn unique_indexes_are_in_place() {
        let pool = connect_test().await;

        sqlx::query("INSERT INTO transactions (public_id, amount, status, date, created_at, updated_at) VALUES ('t-1', 1.0, 'pending', '2024-01-01 00:00:00+00:00', '2024-01-01 00:00:00+00:00', '2024-01-01 00:00:00+00:00')")
            .execute(&pool)
            .await
            .expect("first insert failed");

        let duplicate = sqlx::query("INSERT INTO transactions (public_id, amount, status, date, created_at, updated_at) VALUES ('t-1', 2.0, 'failed', '2024-01-02 00:00:00+00:00', '2024-01-02 00:00:00+00:00', '2024-01-02 00:00:00+00:00')")
            .execute(&pool)
            .await;

        let err = duplicate.expect_err("duplicate public_id must be rejected");
        let db_err = err.as_database_error().expect("expected a database error");
        assert!(db_err.is_unique_violation());
    }
}
