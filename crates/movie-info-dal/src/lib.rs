pub mod error;
pub mod movie_info;

pub use error::Error;
pub use sqlx::Error as SqlxError;
use sqlx::sqlite::SqlitePoolOptions;

use crate::error::Result;

pub type ChosenDB = sqlx::Sqlite;
pub type Pool = sqlx::Pool<ChosenDB>;

// One JSON document per record, keyed by an opaque string id.
pub(crate) const SCHEMA: &str =
    r#"CREATE TABLE IF NOT EXISTS "movieInfos" (id TEXT PRIMARY KEY, doc TEXT NOT NULL)"#;

pub async fn new_pool(database_url: &str) -> Result<Pool, Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(50)
        .connect(database_url)
        .await?;
    sqlx::query(SCHEMA).execute(&pool).await?;
    Ok(pool)
}
