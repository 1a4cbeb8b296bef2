//! Database repository for production lines.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::lines::{LineCreateDBRequest, LineDBResponse, LineUpdateDBRequest},
    },
    types::{LineId, abbrev_uuid},
};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Lines<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Lines<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Lines<'c> {
    type CreateRequest = LineCreateDBRequest;
    type UpdateRequest = LineUpdateDBRequest;
    type Response = LineDBResponse;
    type Id = LineId;

    #[instrument(skip(self, request), fields(line_name = %request.line_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let line = sqlx::query_as::<_, LineDBResponse>(
            r#"
            INSERT INTO lines (line_name, line_description)
            VALUES ($1, $2)
            RETURNING id, line_name, line_description, created_at, updated_at
            "#,
        )
        .bind(&request.line_name)
        .bind(&request.line_description)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(line)
    }

    #[instrument(skip(self), fields(line_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let line = sqlx::query_as::<_, LineDBResponse>(
            "SELECT id, line_name, line_description, created_at, updated_at FROM lines WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(line)
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self) -> Result<Vec<Self::Response>> {
        let lines = sqlx::query_as::<_, LineDBResponse>(
            "SELECT id, line_name, line_description, created_at, updated_at FROM lines ORDER BY line_name, created_at",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(lines)
    }

    #[instrument(skip(self), fields(line_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM lines WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(line_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let line = sqlx::query_as::<_, LineDBResponse>(
            r#"
            UPDATE lines SET
                line_name = COALESCE($2, line_name),
                line_description = COALESCE($3, line_description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, line_name, line_description, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&request.line_name)
        .bind(&request.line_description)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(line)
    }
}
