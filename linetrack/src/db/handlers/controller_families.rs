//! Database repository for controller families.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::controller_families::{ControllerFamilyCreateDBRequest, ControllerFamilyDBResponse, ControllerFamilyUpdateDBRequest},
    },
    types::{ControllerFamilyId, abbrev_uuid},
};
use sqlx::PgConnection;
use tracing::instrument;

const COLUMNS: &str = "id, family_name, description, production_time, created_at, updated_at";

pub struct ControllerFamilies<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ControllerFamilies<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for ControllerFamilies<'c> {
    type CreateRequest = ControllerFamilyCreateDBRequest;
    type UpdateRequest = ControllerFamilyUpdateDBRequest;
    type Response = ControllerFamilyDBResponse;
    type Id = ControllerFamilyId;

    #[instrument(skip(self, request), fields(family_name = %request.family_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let family = sqlx::query_as::<_, ControllerFamilyDBResponse>(&format!(
            "INSERT INTO controller_families (family_name, description, production_time) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        ))
        .bind(&request.family_name)
        .bind(&request.description)
        .bind(request.production_time)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(family)
    }

    #[instrument(skip(self), fields(controller_family_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let family = sqlx::query_as::<_, ControllerFamilyDBResponse>(&format!("SELECT {COLUMNS} FROM controller_families WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(family)
    }

    #[instrument(skip(self), err)]
    async fn list(&mut self) -> Result<Vec<Self::Response>> {
        let families = sqlx::query_as::<_, ControllerFamilyDBResponse>(&format!(
            "SELECT {COLUMNS} FROM controller_families ORDER BY family_name, created_at"
        ))
        .fetch_all(&mut *self.db)
        .await?;

        Ok(families)
    }

    #[instrument(skip(self), fields(controller_family_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM controller_families WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(controller_family_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let family = sqlx::query_as::<_, ControllerFamilyDBResponse>(&format!(
            r#"
            UPDATE controller_families SET
                family_name = COALESCE($2, family_name),
                description = COALESCE($3, description),
                production_time = COALESCE($4, production_time),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&request.family_name)
        .bind(&request.description)
        .bind(request.production_time)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_production_time_round_trip(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = ControllerFamilies::new(&mut conn);

        let family = repo
            .create(&ControllerFamilyCreateDBRequest {
                family_name: "CF-100".to_string(),
                description: None,
                production_time: NaiveTime::from_hms_opt(1, 30, 0).unwrap(),
            })
            .await
            .unwrap();

        let fetched = repo.get_by_id(family.id).await.unwrap().unwrap();
        assert_eq!(fetched.production_time, NaiveTime::from_hms_opt(1, 30, 0).unwrap());

        let updated = repo
            .update(
                family.id,
                &ControllerFamilyUpdateDBRequest {
                    production_time: Some(NaiveTime::from_hms_opt(0, 45, 0).unwrap()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.family_name, "CF-100");
        assert_eq!(updated.production_time, NaiveTime::from_hms_opt(0, 45, 0).unwrap());
    }
}
