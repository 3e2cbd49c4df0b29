use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::store::{item_id, ItemStore, Table};

/// Item store over a single Postgres `items` table with a JSONB payload.
#[derive(Clone)]
pub struct PgItemStore {
    pool: PgPool,
}

impl PgItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn get(&self, table: Table, id: &str) -> Result<Option<Value>, AppError> {
        Ok(
            sqlx::query_scalar("SELECT data FROM items WHERE table_name = $1 AND id = $2")
                .bind(table.as_str())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn put(&self, table: Table, item: &Value) -> Result<(), AppError> {
        let id = item_id(item)?;
        sqlx::query(
            r#"
            INSERT INTO items (table_name, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (table_name, id) DO UPDATE SET data = EXCLUDED.data
            "#,
        )
        .bind(table.as_str())
        .bind(id)
        .bind(item)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn scan(&self, table: Table) -> Result<Vec<Value>, AppError> {
        Ok(
            sqlx::query_scalar("SELECT data FROM items WHERE table_name = $1 ORDER BY id")
                .bind(table.as_str())
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn delete(&self, table: Table, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM items WHERE table_name = $1 AND id = $2")
            .bind(table.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn replace(
        &self,
        table: Table,
        item: &Value,
        expected_updated_at: Option<&str>,
    ) -> Result<(), AppError> {
        let id = item_id(item)?;
        // Compare-and-swap on the stored updatedAt; a concurrent writer leaves zero rows.
        let result = sqlx::query(
            r#"
            UPDATE items SET data = $3
            WHERE table_name = $1 AND id = $2
              AND (data->>'updatedAt') IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(table.as_str())
        .bind(id)
        .bind(item)
        .bind(expected_updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "{} {id} was modified concurrently",
                table.as_str()
            )));
        }
        Ok(())
    }
}
