//! Database repository for stations.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::stations::{StationCreateDBRequest, StationDBResponse, StationUpdateDBRequest},
    },
    types::{StationId, abbrev_uuid},
};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Stations<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Stations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Stations<'c> {
    type CreateRequest = StationCreateDBRequest;
    type UpdateRequest = StationUpdateDBRequest;
    type Response = StationDBResponse;
    type Id = StationId;

    #[instrument(skip(self, request), fields(station_name = %request.station_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let station = sqlx::query_as::<_, StationDBResponse>(
            r#"
            INSERT INTO stations (station_name, station_description)
            VALUES ($1, $2)
            RETURNING id, station_name, station_description, created_at, updated_at
            "#,
        )
        .bind(&request.station_name)
        .bind(&request.station_description)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(station)
    }

    #[instrument(skip(self), fields(station_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let station = sqlx::query_as::<_, StationDBResponse>(
            "SELECT id, station_name, station_description, created_at, updated_at FROM stations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(station)
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self) -> Result<Vec<Self::Response>> {
        let stations = sqlx::query_as::<_, StationDBResponse>(
            "SELECT id, station_name, station_description, created_at, updated_at FROM stations ORDER BY station_name, created_at",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(stations)
    }

    #[instrument(skip(self), fields(station_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM stations WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(station_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let station = sqlx::query_as::<_, StationDBResponse>(
            r#"
            UPDATE stations SET
                station_name = COALESCE($2, station_name),
                station_description = COALESCE($3, station_description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, station_name, station_description, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&request.station_name)
        .bind(&request.station_description)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(station)
    }
}
