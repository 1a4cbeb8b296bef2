//! Database repository for time-bounded line assignments.
//!
//! [`Assignments`] is generic over an [`AssignmentKind`], which fixes the table, the resource
//! column and the [`ConflictPolicy`]. Every mutating operation runs inside its own
//! transaction (a savepoint if the caller already opened one) and starts by locking the
//! resource row with `SELECT ... FOR UPDATE`, so concurrent assigns on the same resource are
//! serialised by the database. The partial unique index over open intervals backs this up
//! at the storage level. Kinds that allow one resource per line also lock the line row and
//! have a second index over the line's open intervals.
//!
//! An assignment is *active* while `end_date IS NULL OR end_date > NOW()`.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use sqlx::{Connection, PgConnection};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{
        errors::{DbError, Result},
        models::assignments::{
            AllocatedResourceDBResponse, AssignOutcome, AssignmentCreateDBRequest, AssignmentDBResponse, AssignmentKind, ConflictPolicy,
        },
    },
    types::{AssignmentId, LineId, abbrev_uuid},
};

const ACTIVE: &str = "(end_date IS NULL OR end_date > NOW())";

/// Assignments closed or cancelled by a supersede or release
#[derive(Debug, Clone, Default)]
pub struct Closed {
    pub closed: Vec<AssignmentId>,
    pub cancelled: Vec<AssignmentId>,
}

impl Closed {
    pub fn is_empty(&self) -> bool {
        self.closed.is_empty() && self.cancelled.is_empty()
    }
}

pub struct Assignments<'c, K: AssignmentKind> {
    db: &'c mut PgConnection,
    _kind: PhantomData<K>,
}

impl<'c, K: AssignmentKind> Assignments<'c, K> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db, _kind: PhantomData }
    }

    fn returning() -> String {
        format!("id, line_id, {} AS resource_id, start_date, end_date, created_at", K::RESOURCE_COLUMN)
    }

    fn active_conflict(resource_id: Uuid, line_id: Option<LineId>) -> DbError {
        DbError::ActiveAssignment {
            entity_type: K::RESOURCE,
            entity_id: resource_id,
            line_id,
        }
    }

    /// Assign a resource to a line.
    ///
    /// The interval is `[start_date or NOW(), end_date)`. What happens when the resource
    /// already has an active assignment depends on `K::POLICY`:
    ///
    /// - [`ConflictPolicy::Reject`]: fails with [`DbError::ActiveAssignment`] naming the
    ///   holding line.
    /// - [`ConflictPolicy::Supersede`]: assignments that have not started are deleted. The
    ///   running one is closed at the new start, or at `NOW()` if the new start lies in the
    ///   future. A new start at or before the running assignment's start fails with
    ///   [`DbError::StartsBeforeCurrent`], and an interval that has already ended fails with
    ///   [`DbError::EndsInPast`]. Either way the running assignment is left untouched.
    ///
    /// When `K::LINE_INDEX` is set the line row is locked too, and an assignment of the same
    /// kind on that line overlapping the new interval fails with [`DbError::LineOccupied`].
    ///
    /// Returns [`DbError::NotFound`] if the resource does not exist.
    #[instrument(skip(self, request), fields(
        resource = K::RESOURCE,
        resource_id = %abbrev_uuid(&request.resource_id),
        line_id = %abbrev_uuid(&request.line_id),
    ), err)]
    pub async fn assign(&mut self, request: &AssignmentCreateDBRequest) -> Result<AssignOutcome> {
        let mut tx = self.db.begin().await?;

        lock_resource::<K>(&mut tx, request.resource_id).await?;
        if K::LINE_INDEX.is_some() {
            lock_line(&mut tx, request.line_id).await?;
        }

        let superseded = match K::POLICY {
            ConflictPolicy::Reject => {
                let holder: Option<LineId> = sqlx::query_scalar(&format!(
                    "SELECT line_id FROM {} WHERE {} = $1 AND {ACTIVE} ORDER BY start_date DESC LIMIT 1",
                    K::TABLE,
                    K::RESOURCE_COLUMN
                ))
                .bind(request.resource_id)
                .fetch_optional(&mut *tx)
                .await?;

                if let Some(line_id) = holder {
                    return Err(Self::active_conflict(request.resource_id, Some(line_id)));
                }
                Closed::default()
            }
            ConflictPolicy::Supersede => supersede::<K>(&mut tx, request).await?,
        };

        if K::LINE_INDEX.is_some() {
            ensure_line_free::<K>(&mut tx, request).await?;
        }

        let assignment = Self::insert(&mut tx, request).await?;

        tx.commit().await?;

        if !superseded.is_empty() {
            tracing::info!(
                closed = superseded.closed.len(),
                cancelled = superseded.cancelled.len(),
                "Superseded previous {} assignment",
                K::RESOURCE
            );
        }

        Ok(AssignOutcome {
            assignment,
            closed: superseded.closed,
            cancelled: superseded.cancelled,
        })
    }

    /// Insert the row as is. Violations of the open-interval indexes become
    /// [`DbError::ActiveAssignment`] and [`DbError::LineOccupied`] with no holder.
    async fn insert(conn: &mut PgConnection, request: &AssignmentCreateDBRequest) -> Result<AssignmentDBResponse> {
        sqlx::query_as::<_, AssignmentDBResponse>(&format!(
            "INSERT INTO {} (line_id, {}, start_date, end_date) VALUES ($1, $2, COALESCE($3, NOW()), $4) RETURNING {}",
            K::TABLE,
            K::RESOURCE_COLUMN,
            Self::returning()
        ))
        .bind(request.line_id)
        .bind(request.resource_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match DbError::from(e) {
            err @ DbError::UniqueViolation { .. } if err.constraint() == Some(K::OPEN_INDEX) => {
                Self::active_conflict(request.resource_id, None)
            }
            err @ DbError::UniqueViolation { .. } if err.constraint().is_some() && err.constraint() == K::LINE_INDEX => {
                DbError::LineOccupied {
                    entity_type: K::RESOURCE,
                    line_id: request.line_id,
                    holder_id: None,
                }
            }
            err => err,
        })
    }

    /// End the resource's active assignment now.
    ///
    /// Returns [`DbError::NotFound`] if the resource does not exist or holds no active
    /// assignment.
    #[instrument(skip(self), fields(resource = K::RESOURCE, resource_id = %abbrev_uuid(&resource_id)), err)]
    pub async fn release(&mut self, resource_id: Uuid) -> Result<Closed> {
        let mut tx = self.db.begin().await?;

        lock_resource::<K>(&mut tx, resource_id).await?;
        let released = close_active::<K>(&mut tx, resource_id, None).await?;
        if released.is_empty() {
            return Err(DbError::NotFound);
        }

        tx.commit().await?;
        Ok(released)
    }

    /// The resource's active assignment, if any
    #[instrument(skip(self), fields(resource = K::RESOURCE, resource_id = %abbrev_uuid(&resource_id)), err)]
    pub async fn get_active(&mut self, resource_id: Uuid) -> Result<Option<AssignmentDBResponse>> {
        let assignment = sqlx::query_as::<_, AssignmentDBResponse>(&format!(
            "SELECT {} FROM {} WHERE {} = $1 AND {ACTIVE} ORDER BY start_date DESC LIMIT 1",
            Self::returning(),
            K::TABLE,
            K::RESOURCE_COLUMN
        ))
        .bind(resource_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(assignment)
    }

    #[instrument(skip(self), fields(resource = K::RESOURCE, resource_id = %abbrev_uuid(&resource_id)), err)]
    pub async fn resource_exists(&mut self, resource_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(&format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", K::RESOURCE_TABLE))
            .bind(resource_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }

    /// Every assignment the resource ever had, newest first
    #[instrument(skip(self), fields(resource = K::RESOURCE, resource_id = %abbrev_uuid(&resource_id)), err)]
    pub async fn history(&mut self, resource_id: Uuid) -> Result<Vec<AssignmentDBResponse>> {
        let assignments = sqlx::query_as::<_, AssignmentDBResponse>(&format!(
            "SELECT {} FROM {} WHERE {} = $1 ORDER BY start_date DESC",
            Self::returning(),
            K::TABLE,
            K::RESOURCE_COLUMN
        ))
        .bind(resource_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(assignments)
    }

    /// Active assignments with line and resource names, optionally for one line only
    #[instrument(skip(self), fields(resource = K::RESOURCE), err)]
    pub async fn list_allocated(&mut self, line_id: Option<LineId>) -> Result<Vec<AllocatedResourceDBResponse>> {
        let allocated = sqlx::query_as::<_, AllocatedResourceDBResponse>(&format!(
            r#"
            SELECT a.id AS assignment_id, a.line_id, l.line_name,
                   r.id AS resource_id, r.{name} AS resource_name,
                   a.start_date, a.end_date
            FROM {table} a
            JOIN lines l ON l.id = a.line_id
            JOIN {resources} r ON r.id = a.{column}
            WHERE (a.end_date IS NULL OR a.end_date > NOW())
              AND ($1::uuid IS NULL OR a.line_id = $1)
            ORDER BY l.line_name, r.{name}
            "#,
            name = K::RESOURCE_NAME_COLUMN,
            table = K::TABLE,
            resources = K::RESOURCE_TABLE,
            column = K::RESOURCE_COLUMN,
        ))
        .bind(line_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(allocated)
    }

    /// Resources with no active assignment. A resource that was never assigned is free.
    #[instrument(skip(self), fields(resource = K::RESOURCE), err)]
    pub async fn list_free(&mut self) -> Result<Vec<K::Resource>> {
        let free = sqlx::query_as::<_, K::Resource>(&format!(
            r#"
            SELECT r.*
            FROM {resources} r
            WHERE NOT EXISTS (
                SELECT 1 FROM {table} a
                WHERE a.{column} = r.id AND (a.end_date IS NULL OR a.end_date > NOW())
            )
            ORDER BY r.{name}
            "#,
            resources = K::RESOURCE_TABLE,
            table = K::TABLE,
            column = K::RESOURCE_COLUMN,
            name = K::RESOURCE_NAME_COLUMN,
        ))
        .fetch_all(&mut *self.db)
        .await?;

        Ok(free)
    }

    /// Free and allocated resources read from one `REPEATABLE READ` snapshot, so the two
    /// halves are disjoint and together cover every resource.
    ///
    /// Must be called on a connection that is not already inside a transaction.
    #[instrument(skip(self), fields(resource = K::RESOURCE), err)]
    pub async fn partition(&mut self) -> Result<(Vec<K::Resource>, Vec<AllocatedResourceDBResponse>)> {
        let mut tx = self.db.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let (free, allocated) = {
            let mut repo = Assignments::<K>::new(&mut tx);
            let free = repo.list_free().await?;
            let allocated = repo.list_allocated(None).await?;
            (free, allocated)
        };

        tx.commit().await?;
        Ok((free, allocated))
    }
}

/// Lock the resource row for the rest of the transaction
async fn lock_resource<K: AssignmentKind>(conn: &mut PgConnection, resource_id: Uuid) -> Result<()> {
    sqlx::query_scalar::<_, Uuid>(&format!("SELECT id FROM {} WHERE id = $1 FOR UPDATE", K::RESOURCE_TABLE))
        .bind(resource_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(DbError::NotFound)?;
    Ok(())
}

/// Lock the line row so assigns onto the same line are serialised. A missing line is left to
/// the foreign key on insert.
async fn lock_line(conn: &mut PgConnection, line_id: LineId) -> Result<()> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM lines WHERE id = $1 FOR UPDATE")
        .bind(line_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(())
}

/// Fail if the line holds another assignment of this kind overlapping the requested interval
async fn ensure_line_free<K: AssignmentKind>(conn: &mut PgConnection, request: &AssignmentCreateDBRequest) -> Result<()> {
    let holder: Option<Uuid> = sqlx::query_scalar(&format!(
        r#"
        SELECT {column} FROM {table}
        WHERE line_id = $1
          AND start_date < COALESCE($3, 'infinity'::timestamptz)
          AND COALESCE(end_date, 'infinity'::timestamptz) > COALESCE($2, NOW())
        ORDER BY start_date DESC
        LIMIT 1
        "#,
        table = K::TABLE,
        column = K::RESOURCE_COLUMN,
    ))
    .bind(request.line_id)
    .bind(request.start_date)
    .bind(request.end_date)
    .fetch_optional(&mut *conn)
    .await?;

    match holder {
        Some(holder_id) => Err(DbError::LineOccupied {
            entity_type: K::RESOURCE,
            line_id: request.line_id,
            holder_id: Some(holder_id),
        }),
        None => Ok(()),
    }
}

/// The resource's running assignment, with the requested interval evaluated against the
/// transaction's `NOW()`
#[derive(Debug, sqlx::FromRow)]
struct Running {
    line_id: LineId,
    start_date: DateTime<Utc>,
    cut: DateTime<Utc>,
    ends_in_past: bool,
}

/// Make room for a move, rejecting requests that would rewrite the running assignment's past
async fn supersede<K: AssignmentKind>(conn: &mut PgConnection, request: &AssignmentCreateDBRequest) -> Result<Closed> {
    let running = sqlx::query_as::<_, Running>(&format!(
        r#"
        SELECT line_id, start_date,
               LEAST(COALESCE($2, NOW()), NOW()) AS cut,
               COALESCE($3 <= NOW(), FALSE) AS ends_in_past
        FROM {table}
        WHERE {column} = $1 AND {ACTIVE} AND start_date < NOW()
        ORDER BY start_date DESC
        LIMIT 1
        "#,
        table = K::TABLE,
        column = K::RESOURCE_COLUMN,
    ))
    .bind(request.resource_id)
    .bind(request.start_date)
    .bind(request.end_date)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(running) = running {
        if running.start_date >= running.cut {
            return Err(DbError::StartsBeforeCurrent {
                entity_type: K::RESOURCE,
                entity_id: request.resource_id,
                line_id: running.line_id,
                current_start: running.start_date,
            });
        }
        if running.ends_in_past {
            return Err(DbError::EndsInPast {
                entity_type: K::RESOURCE,
                entity_id: request.resource_id,
                line_id: running.line_id,
            });
        }
    }

    close_active::<K>(conn, request.resource_id, request.start_date).await
}

/// Delete the resource's active assignments that have not started yet and close the running
/// ones at `LEAST(cut, NOW())`.
///
/// Callers must make sure `cut` is after the running assignment's start.
async fn close_active<K: AssignmentKind>(conn: &mut PgConnection, resource_id: Uuid, cut: Option<DateTime<Utc>>) -> Result<Closed> {
    let cancelled: Vec<AssignmentId> = sqlx::query_scalar(&format!(
        "DELETE FROM {} WHERE {} = $1 AND {ACTIVE} AND start_date >= NOW() RETURNING id",
        K::TABLE,
        K::RESOURCE_COLUMN,
    ))
    .bind(resource_id)
    .fetch_all(&mut *conn)
    .await?;

    let closed: Vec<AssignmentId> = sqlx::query_scalar(&format!(
        r#"
        UPDATE {table} SET end_date = LEAST(COALESCE($2, NOW()), NOW())
        WHERE {column} = $1 AND {ACTIVE} AND start_date < NOW()
        RETURNING id
        "#,
        table = K::TABLE,
        column = K::RESOURCE_COLUMN,
    ))
    .bind(resource_id)
    .bind(cut)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Closed { closed, cancelled })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::assignments::{ControllerFamilyLink, StationLink};
    use crate::test_utils::{create_test_family, create_test_line, create_test_station};
    use chrono::Duration;
    use sqlx::PgPool;
    use std::collections::HashSet;

    fn request(resource_id: Uuid, line_id: LineId) -> AssignmentCreateDBRequest {
        AssignmentCreateDBRequest {
            resource_id,
            line_id,
            start_date: None,
            end_date: None,
        }
    }

    async fn active_count<K: AssignmentKind>(pool: &PgPool, resource_id: Uuid) -> i64 {
        sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE {} = $1 AND {ACTIVE}",
            K::TABLE,
            K::RESOURCE_COLUMN
        ))
        .bind(resource_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reject_policy_conflicts_while_active(pool: PgPool) {
        let line_a = create_test_line(&pool, "Line A").await;
        let line_b = create_test_line(&pool, "Line B").await;
        let family = create_test_family(&pool, "CF-1", "01:30:00").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::<ControllerFamilyLink>::new(&mut conn);

        let now = Utc::now();
        let first = repo
            .assign(&AssignmentCreateDBRequest {
                resource_id: family.id,
                line_id: line_a.id,
                start_date: Some(now - Duration::hours(1)),
                end_date: Some(now + Duration::hours(8)),
            })
            .await
            .unwrap();
        assert!(first.closed.is_empty());

        // starts before the first interval ends
        let err = repo
            .assign(&AssignmentCreateDBRequest {
                resource_id: family.id,
                line_id: line_b.id,
                start_date: Some(now + Duration::hours(2)),
                end_date: None,
            })
            .await
            .unwrap_err();

        match err {
            DbError::ActiveAssignment { entity_id, line_id, .. } => {
                assert_eq!(entity_id, family.id);
                assert_eq!(line_id, Some(line_a.id));
            }
            other => panic!("expected ActiveAssignment, got {other:?}"),
        }
        assert_eq!(active_count::<ControllerFamilyLink>(&pool, family.id).await, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_reject_policy_allows_assign_after_release(pool: PgPool) {
        let line_a = create_test_line(&pool, "Line A").await;
        let line_b = create_test_line(&pool, "Line B").await;
        let family = create_test_family(&pool, "CF-1", "01:30:00").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::<ControllerFamilyLink>::new(&mut conn);

        let mut first = request(family.id, line_a.id);
        first.start_date = Some(Utc::now() - Duration::hours(1));
        repo.assign(&first).await.unwrap();

        let released = repo.release(family.id).await.unwrap();
        assert_eq!(released.closed.len(), 1);
        assert!(matches!(repo.release(family.id).await.unwrap_err(), DbError::NotFound));

        let second = repo.assign(&request(family.id, line_b.id)).await.unwrap();
        assert_eq!(second.assignment.line_id, line_b.id);
        assert_eq!(repo.history(family.id).await.unwrap().len(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_supersede_policy_closes_previous(pool: PgPool) {
        let line_a = create_test_line(&pool, "Line A").await;
        let line_b = create_test_line(&pool, "Line B").await;
        let station = create_test_station(&pool, "ST-1").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::<StationLink>::new(&mut conn);

        let mut first = request(station.id, line_a.id);
        first.start_date = Some(Utc::now() - Duration::hours(3));
        let first = repo.assign(&first).await.unwrap();

        let second = repo.assign(&request(station.id, line_b.id)).await.unwrap();
        assert_eq!(second.closed, vec![first.assignment.id]);
        assert!(second.cancelled.is_empty());

        let active = repo.get_active(station.id).await.unwrap().unwrap();
        assert_eq!(active.id, second.assignment.id);
        assert_eq!(active.line_id, line_b.id);

        let history = repo.history(station.id).await.unwrap();
        let closed = history.iter().find(|a| a.id == first.assignment.id).unwrap();
        assert!(closed.end_date.is_some());
        assert_eq!(active_count::<StationLink>(&pool, station.id).await, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_supersede_policy_cancels_unstarted(pool: PgPool) {
        let line_a = create_test_line(&pool, "Line A").await;
        let line_b = create_test_line(&pool, "Line B").await;
        let station = create_test_station(&pool, "ST-1").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::<StationLink>::new(&mut conn);

        let mut scheduled = request(station.id, line_a.id);
        scheduled.start_date = Some(Utc::now() + Duration::days(1));
        let scheduled = repo.assign(&scheduled).await.unwrap();

        let now = repo.assign(&request(station.id, line_b.id)).await.unwrap();
        assert_eq!(now.cancelled, vec![scheduled.assignment.id]);
        assert_eq!(repo.history(station.id).await.unwrap().len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_assign_unknown_resource_is_not_found(pool: PgPool) {
        let line = create_test_line(&pool, "Line A").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::<ControllerFamilyLink>::new(&mut conn);

        let err = repo.assign(&request(Uuid::new_v4(), line.id)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_end_before_start_is_check_violation(pool: PgPool) {
        let line = create_test_line(&pool, "Line A").await;
        let family = create_test_family(&pool, "CF-1", "00:10:00").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::<ControllerFamilyLink>::new(&mut conn);

        let now = Utc::now();
        let err = repo
            .assign(&AssignmentCreateDBRequest {
                resource_id: family.id,
                line_id: line.id,
                start_date: Some(now),
                end_date: Some(now - Duration::minutes(5)),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_concurrent_assigns_leave_one_active(pool: PgPool) {
        let line_a = create_test_line(&pool, "Line A").await;
        let line_b = create_test_line(&pool, "Line B").await;
        let family = create_test_family(&pool, "CF-1", "01:00:00").await;

        let spawn_assign = |line_id: LineId| {
            let pool = pool.clone();
            let family_id = family.id;
            tokio::spawn(async move {
                let mut conn = pool.acquire().await.unwrap();
                Assignments::<ControllerFamilyLink>::new(&mut conn)
                    .assign(&request(family_id, line_id))
                    .await
            })
        };

        let (first, second) = tokio::join!(spawn_assign(line_a.id), spawn_assign(line_b.id));
        let results = [first.unwrap(), second.unwrap()];

        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(DbError::ActiveAssignment { .. })))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 1);
        assert_eq!(active_count::<ControllerFamilyLink>(&pool, family.id).await, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_partition_is_disjoint_and_complete(pool: PgPool) {
        let line = create_test_line(&pool, "Line A").await;
        let assigned = create_test_station(&pool, "ST-1").await;
        let released = create_test_station(&pool, "ST-2").await;
        let never = create_test_station(&pool, "ST-3").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::<StationLink>::new(&mut conn);
        repo.assign(&request(assigned.id, line.id)).await.unwrap();
        let mut old = request(released.id, line.id);
        old.start_date = Some(Utc::now() - Duration::hours(2));
        repo.assign(&old).await.unwrap();
        repo.release(released.id).await.unwrap();

        let (free, allocated) = repo.partition().await.unwrap();
        let free: HashSet<Uuid> = free.iter().map(|s| s.id).collect();
        let allocated: HashSet<Uuid> = allocated.iter().map(|a| a.resource_id).collect();

        assert!(free.is_disjoint(&allocated));
        let all: HashSet<Uuid> = [assigned.id, released.id, never.id].into_iter().collect();
        assert_eq!(free.union(&allocated).copied().collect::<HashSet<_>>(), all);
        assert_eq!(allocated, [assigned.id].into_iter().collect());

        let for_line = repo.list_allocated(Some(line.id)).await.unwrap();
        assert_eq!(for_line.len(), 1);
        assert_eq!(for_line[0].resource_name, "ST-1");
        assert_eq!(for_line[0].line_name, "Line A");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_supersede_rejects_start_before_running_assignment(pool: PgPool) {
        let line_a = create_test_line(&pool, "Line A").await;
        let line_b = create_test_line(&pool, "Line B").await;
        let station = create_test_station(&pool, "ST-1").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::<StationLink>::new(&mut conn);

        let now = Utc::now();
        let mut running = request(station.id, line_a.id);
        running.start_date = Some(now - Duration::hours(3));
        let running = repo.assign(&running).await.unwrap().assignment;

        for end_date in [Some(now - Duration::hours(9)), None] {
            let err = repo
                .assign(&AssignmentCreateDBRequest {
                    resource_id: station.id,
                    line_id: line_b.id,
                    start_date: Some(now - Duration::hours(10)),
                    end_date,
                })
                .await
                .unwrap_err();
            match err {
                DbError::StartsBeforeCurrent {
                    entity_id,
                    line_id,
                    current_start,
                    ..
                } => {
                    assert_eq!(entity_id, station.id);
                    assert_eq!(line_id, line_a.id);
                    assert_eq!(current_start, running.start_date);
                }
                other => panic!("expected StartsBeforeCurrent, got {other:?}"),
            }
        }

        let active = repo.get_active(station.id).await.unwrap().unwrap();
        assert_eq!(active.id, running.id);
        assert!(active.end_date.is_none());
        assert_eq!(repo.history(station.id).await.unwrap().len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_supersede_rejects_move_that_already_ended(pool: PgPool) {
        let line_a = create_test_line(&pool, "Line A").await;
        let line_b = create_test_line(&pool, "Line B").await;
        let station = create_test_station(&pool, "ST-1").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::<StationLink>::new(&mut conn);

        let now = Utc::now();
        let mut running = request(station.id, line_a.id);
        running.start_date = Some(now - Duration::hours(10));
        let running = repo.assign(&running).await.unwrap().assignment;

        let err = repo
            .assign(&AssignmentCreateDBRequest {
                resource_id: station.id,
                line_id: line_b.id,
                start_date: Some(now - Duration::hours(3)),
                end_date: Some(now - Duration::hours(2)),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::EndsInPast { line_id, .. } if line_id == line_a.id));

        let active = repo.get_active(station.id).await.unwrap().unwrap();
        assert_eq!(active.id, running.id);
        assert!(active.end_date.is_none());
        assert_eq!(active_count::<StationLink>(&pool, station.id).await, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_supersede_backdated_move_closes_at_new_start(pool: PgPool) {
        let line_a = create_test_line(&pool, "Line A").await;
        let line_b = create_test_line(&pool, "Line B").await;
        let station = create_test_station(&pool, "ST-1").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::<StationLink>::new(&mut conn);

        let now = Utc::now();
        let mut first = request(station.id, line_a.id);
        first.start_date = Some(now - Duration::hours(10));
        let first = repo.assign(&first).await.unwrap().assignment;

        let mut moved = request(station.id, line_b.id);
        moved.start_date = Some(now - Duration::hours(3));
        let moved = repo.assign(&moved).await.unwrap();
        assert_eq!(moved.closed, vec![first.id]);
        assert!(moved.cancelled.is_empty());

        let history = repo.history(station.id).await.unwrap();
        let closed = history.iter().find(|a| a.id == first.id).unwrap();
        assert_eq!(closed.end_date, Some(moved.assignment.start_date));
        assert_eq!(repo.get_active(station.id).await.unwrap().unwrap().line_id, line_b.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_line_holds_one_family_at_a_time(pool: PgPool) {
        let line = create_test_line(&pool, "Line A").await;
        let first = create_test_family(&pool, "CF-A", "00:10:00").await;
        let second = create_test_family(&pool, "CF-B", "00:20:00").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Assignments::<ControllerFamilyLink>::new(&mut conn);

        let now = Utc::now();
        repo.assign(&AssignmentCreateDBRequest {
            resource_id: first.id,
            line_id: line.id,
            start_date: Some(now - Duration::hours(10)),
            end_date: Some(now - Duration::hours(5)),
        })
        .await
        .unwrap();

        // overlaps the closed interval
        let mut overlapping = request(second.id, line.id);
        overlapping.start_date = Some(now - Duration::hours(7));
        let err = repo.assign(&overlapping).await.unwrap_err();
        match err {
            DbError::LineOccupied { line_id, holder_id, .. } => {
                assert_eq!(line_id, line.id);
                assert_eq!(holder_id, Some(first.id));
            }
            other => panic!("expected LineOccupied, got {other:?}"),
        }

        // starts exactly where the first one ended
        let mut next = request(second.id, line.id);
        next.start_date = Some(now - Duration::hours(5));
        repo.assign(&next).await.unwrap();

        let err = repo.assign(&request(first.id, line.id)).await.unwrap_err();
        assert!(matches!(err, DbError::LineOccupied { holder_id: Some(h), .. } if h == second.id));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_concurrent_family_assigns_to_one_line(pool: PgPool) {
        let line = create_test_line(&pool, "Line A").await;
        let first = create_test_family(&pool, "CF-A", "00:10:00").await;
        let second = create_test_family(&pool, "CF-B", "00:10:00").await;

        let spawn_assign = |family_id: Uuid| {
            let pool = pool.clone();
            let line_id = line.id;
            tokio::spawn(async move {
                let mut conn = pool.acquire().await.unwrap();
                Assignments::<ControllerFamilyLink>::new(&mut conn)
                    .assign(&request(family_id, line_id))
                    .await
            })
        };

        let (a, b) = tokio::join!(spawn_assign(first.id), spawn_assign(second.id));
        let results = [a.unwrap(), b.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(DbError::LineOccupied { .. })))
                .count(),
            1
        );
        let on_line = Assignments::<ControllerFamilyLink>::new(&mut pool.acquire().await.unwrap())
            .list_allocated(Some(line.id))
            .await
            .unwrap();
        assert_eq!(on_line.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_concurrent_station_moves_leave_one_active(pool: PgPool) {
        let line_a = create_test_line(&pool, "Line A").await;
        let line_b = create_test_line(&pool, "Line B").await;
        let station = create_test_station(&pool, "ST-1").await;

        let spawn_assign = |line_id: LineId| {
            let pool = pool.clone();
            let station_id = station.id;
            tokio::spawn(async move {
                let mut conn = pool.acquire().await.unwrap();
                Assignments::<StationLink>::new(&mut conn)
                    .assign(&request(station_id, line_id))
                    .await
            })
        };

        let (first, second) = tokio::join!(spawn_assign(line_a.id), spawn_assign(line_b.id));
        let outcomes = [first.unwrap().unwrap(), second.unwrap().unwrap()];

        // whichever commits second supersedes the other
        let superseded: usize = outcomes.iter().map(|o| o.closed.len() + o.cancelled.len()).sum();
        assert_eq!(superseded, 1);
        assert_eq!(active_count::<StationLink>(&pool, station.id).await, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_insert_maps_open_index_violations(pool: PgPool) {
        let line_a = create_test_line(&pool, "Line A").await;
        let line_b = create_test_line(&pool, "Line B").await;
        let station = create_test_station(&pool, "ST-1").await;
        let first = create_test_family(&pool, "CF-A", "00:10:00").await;
        let second = create_test_family(&pool, "CF-B", "00:10:00").await;
        let mut conn = pool.acquire().await.unwrap();

        Assignments::<StationLink>::insert(&mut conn, &request(station.id, line_a.id))
            .await
            .unwrap();
        let err = Assignments::<StationLink>::insert(&mut conn, &request(station.id, line_b.id))
            .await
            .unwrap_err();
        match err {
            DbError::ActiveAssignment { entity_id, line_id, .. } => {
                assert_eq!(entity_id, station.id);
                assert_eq!(line_id, None);
            }
            other => panic!("expected ActiveAssignment, got {other:?}"),
        }

        Assignments::<ControllerFamilyLink>::insert(&mut conn, &request(first.id, line_a.id))
            .await
            .unwrap();
        let err = Assignments::<ControllerFamilyLink>::insert(&mut conn, &request(second.id, line_a.id))
            .await
            .unwrap_err();
        match err {
            DbError::LineOccupied { line_id, holder_id, .. } => {
                assert_eq!(line_id, line_a.id);
                assert_eq!(holder_id, None);
            }
            other => panic!("expected LineOccupied, got {other:?}"),
        }
    }
}
