//! Request flow shared by the controller family and station assignment endpoints.
//!
//! The line is looked up before the assignment transaction is opened so that an unknown line
//! and an unknown resource produce different 404s.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    db::{
        errors::DbError,
        handlers::{Assignments, Lines, Repository, assignments::Closed},
        models::assignments::{AssignOutcome, AssignmentCreateDBRequest, AssignmentDBResponse, AssignmentKind},
    },
    errors::{Error, Result},
};

fn resource_not_found<K: AssignmentKind>(resource_id: Uuid) -> impl FnOnce(DbError) -> Error {
    move |e| match e {
        DbError::NotFound => Error::not_found(K::RESOURCE, resource_id),
        e => e.into(),
    }
}

pub(crate) async fn assign<K: AssignmentKind>(conn: &mut PgConnection, request: &AssignmentCreateDBRequest) -> Result<AssignOutcome> {
    if Lines::new(&mut *conn).get_by_id(request.line_id).await?.is_none() {
        return Err(Error::not_found("Line", request.line_id));
    }

    Assignments::<K>::new(conn)
        .assign(request)
        .await
        .map_err(resource_not_found::<K>(request.resource_id))
}

/// Fails with 404 when the resource is unknown or holds no active assignment
pub(crate) async fn release<K: AssignmentKind>(conn: &mut PgConnection, resource_id: Uuid) -> Result<Closed> {
    Assignments::<K>::new(conn).release(resource_id).await.map_err(|e| match e {
        DbError::NotFound => Error::NotFound {
            resource: format!("Active assignment for {}", K::RESOURCE),
            id: resource_id.to_string(),
        },
        e => e.into(),
    })
}

pub(crate) async fn history<K: AssignmentKind>(conn: &mut PgConnection, resource_id: Uuid) -> Result<Vec<AssignmentDBResponse>> {
    let mut repo = Assignments::<K>::new(conn);
    if !repo.resource_exists(resource_id).await? {
        return Err(Error::not_found(K::RESOURCE, resource_id));
    }

    Ok(repo.history(resource_id).await?)
}
