//! Resolves the controller family baseline for a user's completed jobs.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{errors::Result, models::efficiency::EfficiencyJobRow},
    types::{UserId, abbrev_uuid},
};

pub struct Efficiency<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Efficiency<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Completed jobs of a user, each joined with the controller family assignment of its
    /// line whose `[start_date, end_date)` contains `job_date`.
    ///
    /// Jobs with no such assignment are left out. Family assignments on one line never
    /// overlap, so at most one row matches. Rows written before that was enforced may still
    /// overlap; the most recently started one is used then and a warning is logged.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn completed_jobs_with_baseline(&mut self, user_id: UserId) -> Result<Vec<EfficiencyJobRow>> {
        let rows = sqlx::query_as::<_, EfficiencyJobRow>(
            r#"
            SELECT j.id AS job_id, j.user_id, j.line_id,
                   m.controller_family_id, m.family_name, m.production_time, m.match_count,
                   j.job_date, j.start_time, j.end_time
            FROM jobs j
            CROSS JOIN LATERAL (
                SELECT a.controller_family_id, cf.family_name, cf.production_time,
                       COUNT(*) OVER () AS match_count
                FROM line_controller_family_assignments a
                JOIN controller_families cf ON cf.id = a.controller_family_id
                WHERE a.line_id = j.line_id
                  AND a.start_date <= j.job_date
                  AND (a.end_date IS NULL OR a.end_date > j.job_date)
                ORDER BY a.start_date DESC
                LIMIT 1
            ) m
            WHERE j.user_id = $1
              AND j.status = 'completed'
              AND j.end_time IS NOT NULL
            ORDER BY j.job_date, j.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        for row in rows.iter().filter(|r| r.match_count > 1) {
            tracing::warn!(
                job_id = %row.job_id,
                line_id = %row.line_id,
                matches = row.match_count,
                "Overlapping controller family assignments at job date, using the most recently started"
            );
        }

        Ok(rows)
    }
}
