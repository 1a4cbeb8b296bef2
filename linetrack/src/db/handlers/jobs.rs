//! Database repository for jobs.
//!
//! A job is started `open` with `start_time = NOW()` and later completed, which stamps
//! `end_time`. Completion is one conditional `UPDATE`, so a job cannot be completed twice.

use crate::{
    api::models::jobs::JobStatus,
    db::{
        errors::{DbError, Result},
        models::jobs::{JobCreateDBRequest, JobDBResponse, JobFilter},
    },
    types::{JobId, abbrev_uuid},
};
use sqlx::PgConnection;
use tracing::instrument;

const COLUMNS: &str = "id, line_id, user_id, shift_id, station_id, job_date, start_time, end_time, status, created_at";

#[derive(Debug)]
pub enum Completion {
    Completed(JobDBResponse),
    AlreadyCompleted(JobDBResponse),
}

pub struct Jobs<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Jobs<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(line_id = %abbrev_uuid(&request.line_id), user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn start(&mut self, request: &JobCreateDBRequest) -> Result<JobDBResponse> {
        let job = sqlx::query_as::<_, JobDBResponse>(&format!(
            r#"
            INSERT INTO jobs (line_id, user_id, shift_id, station_id, job_date)
            VALUES ($1, $2, $3, $4, COALESCE($5, NOW()))
            RETURNING {COLUMNS}
            "#
        ))
        .bind(request.line_id)
        .bind(request.user_id)
        .bind(request.shift_id)
        .bind(request.station_id)
        .bind(request.job_date)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(job)
    }

    #[instrument(skip(self), fields(job_id = %abbrev_uuid(&id)), err)]
    pub async fn complete(&mut self, id: JobId) -> Result<Completion> {
        let completed = sqlx::query_as::<_, JobDBResponse>(&format!(
            r#"
            UPDATE jobs SET end_time = NOW(), status = 'completed'
            WHERE id = $1 AND status = 'open'
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        match completed {
            Some(job) => Ok(Completion::Completed(job)),
            None => self.get_by_id(id).await?.map(Completion::AlreadyCompleted).ok_or(DbError::NotFound),
        }
    }

    #[instrument(skip(self), fields(job_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: JobId) -> Result<Option<JobDBResponse>> {
        let job = sqlx::query_as::<_, JobDBResponse>(&format!("SELECT {COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(job)
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self, filter: &JobFilter) -> Result<Vec<JobDBResponse>> {
        let jobs = sqlx::query_as::<_, JobDBResponse>(&format!(
            r#"
            SELECT {COLUMNS} FROM jobs
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::job_status IS NULL OR status = $2)
            ORDER BY job_date DESC, id
            "#
        ))
        .bind(filter.user_id)
        .bind(filter.status)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_line, create_test_shift, create_test_user};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_job_lifecycle(pool: PgPool) {
        let line = create_test_line(&pool, "Line A").await;
        let user = create_test_user(&pool, "E1").await;
        let shift = create_test_shift(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Jobs::new(&mut conn);

        let job = repo
            .start(&JobCreateDBRequest {
                line_id: line.id,
                user_id: user.id,
                shift_id: shift.id,
                station_id: None,
                job_date: None,
            })
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Open);
        assert!(job.end_time.is_none());

        let Completion::Completed(done) = repo.complete(job.id).await.unwrap() else {
            panic!("first completion should succeed");
        };
        assert_eq!(done.status, JobStatus::Completed);
        assert!(done.end_time.unwrap() >= done.start_time);

        assert!(matches!(repo.complete(job.id).await.unwrap(), Completion::AlreadyCompleted(_)));
        assert!(matches!(repo.complete(uuid::Uuid::new_v4()).await.unwrap_err(), DbError::NotFound));

        let open = repo
            .list(&JobFilter {
                user_id: Some(user.id),
                status: Some(JobStatus::Open),
            })
            .await
            .unwrap();
        assert!(open.is_empty());
        assert_eq!(repo.list(&JobFilter::default()).await.unwrap().len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_start_with_unknown_line_is_foreign_key_violation(pool: PgPool) {
        let user = create_test_user(&pool, "E1").await;
        let shift = create_test_shift(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        let err = Jobs::new(&mut conn)
            .start(&JobCreateDBRequest {
                line_id: uuid::Uuid::new_v4(),
                user_id: user.id,
                shift_id: shift.id,
                station_id: None,
                job_date: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
