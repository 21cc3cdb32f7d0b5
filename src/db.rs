use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Create a SeaORM connection to the SQLite database.
///
/// SQLite allows one writer at a time, so the pool is kept small; sqlx turns
/// foreign key enforcement on for every connection it opens.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(4)
        .min_connections(1)
        .sqlx_logging(false);
    let conn = Database::connect(options).await?;
    Ok(conn)
}

/// Execute every `*.sql` file in `dir`, in filename order.
///
/// Migration files only use `IF NOT EXISTS` DDL, so running them again is a no-op.
pub async fn run_migrations(conn: &DatabaseConnection, dir: impl AsRef<Path>) -> Result<()> {
    let mut entries = fs::read_dir(dir.as_ref()).await?;
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();

    let pool = conn.get_sqlite_connection_pool();
    for file in files {
        let sql = fs::read_to_string(&file).await?;
        sqlx::raw_sql(&sql).execute(pool).await?;
        tracing::debug!(file = %file.display(), "migration applied");
    }

    Ok(())
}

/// Cheap liveness probe used by the health endpoint.
pub async fn ping(conn: &DatabaseConnection) -> Result<(), sqlx::Error> {
    let pool = conn.get_sqlite_connection_pool();
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}
