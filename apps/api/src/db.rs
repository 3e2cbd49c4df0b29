use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the item table backing `PgItemStore` if it does not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            table_name TEXT NOT NULL,
            id         TEXT NOT NULL,
            data       JSONB NOT NULL,
            PRIMARY KEY (table_name, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    info!("Item table ready");
    Ok(())
}
