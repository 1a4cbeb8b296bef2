//! Database repository for shifts.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::shifts::{ShiftCreateDBRequest, ShiftDBResponse, ShiftUpdateDBRequest},
    },
    types::{ShiftId, abbrev_uuid},
};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Shifts<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Shifts<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Shifts<'c> {
    type CreateRequest = ShiftCreateDBRequest;
    type UpdateRequest = ShiftUpdateDBRequest;
    type Response = ShiftDBResponse;
    type Id = ShiftId;

    #[instrument(skip(self, request), fields(shift_name = %request.shift_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let shift = sqlx::query_as::<_, ShiftDBResponse>(
            r#"
            INSERT INTO shifts (shift_name, start_time, end_time)
            VALUES ($1, $2, $3)
            RETURNING id, shift_name, start_time, end_time, created_at, updated_at
            "#,
        )
        .bind(&request.shift_name)
        .bind(request.start_time)
        .bind(request.end_time)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(shift)
    }

    #[instrument(skip(self), fields(shift_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let shift = sqlx::query_as::<_, ShiftDBResponse>(
            "SELECT id, shift_name, start_time, end_time, created_at, updated_at FROM shifts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(shift)
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self) -> Result<Vec<Self::Response>> {
        let shifts = sqlx::query_as::<_, ShiftDBResponse>(
            "SELECT id, shift_name, start_time, end_time, created_at, updated_at FROM shifts ORDER BY start_time",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(shifts)
    }

    #[instrument(skip(self), fields(shift_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM shifts WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(shift_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let shift = sqlx::query_as::<_, ShiftDBResponse>(
            r#"
            UPDATE shifts SET
                shift_name = COALESCE($2, shift_name),
                start_time = COALESCE($3, start_time),
                end_time = COALESCE($4, end_time),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, shift_name, start_time, end_time, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&request.shift_name)
        .bind(request.start_time)
        .bind(request.end_time)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(shift)
    }
}
