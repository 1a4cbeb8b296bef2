use crate::{
    AppState,
    api::{
        extract::{ApiJson, ApiPath},
        handlers::assignments,
        models::{
            assignments::{AllocatedFamilyResponse, FamilyAssignRequest, FamilyAssignmentResponse, ReleaseResponse},
            controller_families::{ControllerFamilyCreate, ControllerFamilyResponse, ControllerFamilyUpdate},
            envelope::ApiResponse,
        },
    },
    db::{
        errors::DbError,
        handlers::{Assignments, ControllerFamilies, Repository},
        models::{
            assignments::{AssignmentCreateDBRequest, ControllerFamilyLink},
            controller_families::{ControllerFamilyCreateDBRequest, ControllerFamilyUpdateDBRequest},
        },
    },
    errors::{Error, Result},
    types::ControllerFamilyId,
};
use axum::{Json, extract::State, http::StatusCode};

#[utoipa::path(
    post,
    path = "/controller_family/add",
    tag = "controller_families",
    summary = "Create a controller family",
    request_body = ControllerFamilyCreate,
    responses(
        (status = 201, description = "Controller family created", body = ApiResponse<ControllerFamilyResponse>),
        (status = 400, description = "Invalid request, e.g. production_time not HH:MM:SS"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn add_family(
    State(state): State<AppState>,
    ApiJson(create): ApiJson<ControllerFamilyCreate>,
) -> Result<(StatusCode, Json<ApiResponse<ControllerFamilyResponse>>)> {
    let request = ControllerFamilyCreateDBRequest::try_from(create)?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let family = ControllerFamilies::new(&mut conn).create(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(ControllerFamilyResponse::from(family)).with_message("Controller family created successfully")),
    ))
}

#[utoipa::path(
    get,
    path = "/controller_family/getall",
    tag = "controller_families",
    summary = "List controller families",
    responses(
        (status = 200, description = "All controller families", body = ApiResponse<Vec<ControllerFamilyResponse>>),
        (status = 404, description = "No controller families exist"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_families(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<ControllerFamilyResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let families = ControllerFamilies::new(&mut conn).list().await?;

    if families.is_empty() {
        return Err(Error::none_found("Controller Families"));
    }
    Ok(Json(ApiResponse::data(families.into_iter().map(ControllerFamilyResponse::from).collect())))
}

#[utoipa::path(
    get,
    path = "/controller_family/get/{id}",
    tag = "controller_families",
    summary = "Get a controller family",
    params(("id" = String, Path, description = "Controller family ID")),
    responses(
        (status = 200, description = "The controller family", body = ApiResponse<ControllerFamilyResponse>),
        (status = 404, description = "Controller family not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_family(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ControllerFamilyId>,
) -> Result<Json<ApiResponse<ControllerFamilyResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let family = ControllerFamilies::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Controller Family", id))?;

    Ok(Json(ApiResponse::data(family.into())))
}

#[utoipa::path(
    put,
    path = "/controller_family/update/{id}",
    tag = "controller_families",
    summary = "Update a controller family",
    params(("id" = String, Path, description = "Controller family ID")),
    request_body = ControllerFamilyUpdate,
    responses(
        (status = 200, description = "Controller family updated", body = ApiResponse<ControllerFamilyResponse>),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Controller family not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_family(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ControllerFamilyId>,
    ApiJson(update): ApiJson<ControllerFamilyUpdate>,
) -> Result<Json<ApiResponse<ControllerFamilyResponse>>> {
    let request = ControllerFamilyUpdateDBRequest::try_from(update)?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let family = ControllerFamilies::new(&mut conn).update(id, &request).await.map_err(|e| match e {
        DbError::NotFound => Error::not_found("Controller Family", id),
        e => e.into(),
    })?;

    Ok(Json(
        ApiResponse::data(ControllerFamilyResponse::from(family)).with_message("Controller family updated successfully"),
    ))
}

#[utoipa::path(
    delete,
    path = "/controller_family/delete/{id}",
    tag = "controller_families",
    summary = "Delete a controller family",
    params(("id" = String, Path, description = "Controller family ID")),
    responses(
        (status = 200, description = "Controller family deleted"),
        (status = 404, description = "Controller family not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_family(State(state): State<AppState>, ApiPath(id): ApiPath<ControllerFamilyId>) -> Result<Json<ApiResponse<()>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if !ControllerFamilies::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("Controller Family", id));
    }
    Ok(Json(ApiResponse::message("Controller family deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/controller_family/assign",
    tag = "controller_families",
    summary = "Assign a controller family to a line",
    description = "Rejected while the family holds an active assignment on any line, or while the line has another family assigned for an overlapping period.",
    request_body = FamilyAssignRequest,
    responses(
        (status = 201, description = "Assignment created", body = ApiResponse<FamilyAssignmentResponse>),
        (status = 400, description = "Family already assigned, line already occupied, or invalid interval"),
        (status = 404, description = "Line or controller family not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn assign_family(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<FamilyAssignRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FamilyAssignmentResponse>>)> {
    let request = AssignmentCreateDBRequest::try_from(&request)?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let outcome = assignments::assign::<ControllerFamilyLink>(&mut conn, &request).await?;

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::data(FamilyAssignmentResponse::from(outcome.assignment))
                .with_message("Controller family assigned to line successfully"),
        ),
    ))
}

#[utoipa::path(
    put,
    path = "/controller_family/release/{controller_family_id}",
    tag = "controller_families",
    summary = "End a controller family's active assignment now",
    params(("controller_family_id" = String, Path, description = "Controller family ID")),
    responses(
        (status = 200, description = "Assignment released", body = ApiResponse<ReleaseResponse>),
        (status = 404, description = "Controller family has no active assignment"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn release_family(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ControllerFamilyId>,
) -> Result<Json<ApiResponse<ReleaseResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let released = assignments::release::<ControllerFamilyLink>(&mut conn, id).await?;

    Ok(Json(
        ApiResponse::data(ReleaseResponse::from(released)).with_message("Controller family released successfully"),
    ))
}

#[utoipa::path(
    get,
    path = "/controller_family/history/{id}",
    tag = "controller_families",
    summary = "Assignment history of a controller family, newest first",
    params(("id" = String, Path, description = "Controller family ID")),
    responses(
        (status = 200, description = "Assignment history", body = ApiResponse<Vec<FamilyAssignmentResponse>>),
        (status = 404, description = "Controller family not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn family_history(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ControllerFamilyId>,
) -> Result<Json<ApiResponse<Vec<FamilyAssignmentResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let history = assignments::history::<ControllerFamilyLink>(&mut conn, id).await?;

    Ok(Json(ApiResponse::data(history.into_iter().map(FamilyAssignmentResponse::from).collect())))
}

#[utoipa::path(
    get,
    path = "/controller_family/getAllocatedFamilies",
    tag = "controller_families",
    summary = "Active (line, controller family) pairs",
    responses(
        (status = 200, description = "Allocated families, possibly empty", body = ApiResponse<Vec<AllocatedFamilyResponse>>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn allocated_families(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<AllocatedFamilyResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let allocated = Assignments::<ControllerFamilyLink>::new(&mut conn).list_allocated(None).await?;

    Ok(Json(ApiResponse::data(allocated.into_iter().map(AllocatedFamilyResponse::from).collect())))
}

#[utoipa::path(
    get,
    path = "/controller_family/getFreeFamilies",
    tag = "controller_families",
    summary = "Controller families with no active assignment",
    responses(
        (status = 200, description = "Free families, possibly empty", body = ApiResponse<Vec<ControllerFamilyResponse>>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn free_families(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<ControllerFamilyResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let free = Assignments::<ControllerFamilyLink>::new(&mut conn).list_free().await?;

    Ok(Json(ApiResponse::data(free.into_iter().map(ControllerFamilyResponse::from).collect())))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{
            assignments::{AllocatedFamilyResponse, FamilyAssignmentResponse},
            controller_families::ControllerFamilyResponse,
            envelope::ApiResponse,
        },
        test_utils::*,
    };
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;
    use uuid::Uuid;

    #[sqlx::test]
    #[test_log::test]
    async fn test_add_family_validates_production_time(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;

        let response = app
            .post("/controller_family/add")
            .json(&json!({"family_name": "CF-90", "production_time": "1h30m"}))
            .await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["message"], json!("Invalid production_time format. Please use HH:mm:ss"));

        let response = app
            .post("/controller_family/add")
            .json(&json!({"family_name": "CF-90", "production_time": "01:30:00"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: ApiResponse<ControllerFamilyResponse> = response.json();
        assert_eq!(created.data.unwrap().production_time.to_string(), "01:30:00");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_assign_conflicts_until_released(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let line_a = create_test_line(&pool, "Line A").await;
        let line_b = create_test_line(&pool, "Line B").await;
        let family = create_test_family(&pool, "CF-1", "00:45:00").await;

        let response = app
            .post("/controller_family/assign")
            .json(&json!({"line_id": line_a.id, "controller_family_id": family.id}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let assigned: ApiResponse<FamilyAssignmentResponse> = response.json();
        let assigned = assigned.data.unwrap();
        assert_eq!(assigned.line_id, line_a.id);
        assert!(assigned.end_date.is_none());

        let response = app
            .post("/controller_family/assign")
            .json(&json!({"line_id": line_b.id, "controller_family_id": family.id}))
            .await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(
            body["message"],
            json!(format!("Controller Family {} is already assigned to Line {}", family.id, line_a.id))
        );

        app.put(&format!("/controller_family/release/{}", family.id)).await.assert_status_ok();
        app.put(&format!("/controller_family/release/{}", family.id))
            .await
            .assert_status_not_found();

        app.post("/controller_family/assign")
            .json(&json!({"line_id": line_b.id, "controller_family_id": family.id}))
            .await
            .assert_status(StatusCode::CREATED);

        let response = app.get(&format!("/controller_family/history/{}", family.id)).await;
        response.assert_status_ok();
        let history: ApiResponse<Vec<FamilyAssignmentResponse>> = response.json();
        let lines: Vec<Uuid> = history.data.unwrap().iter().map(|a| a.line_id).collect();
        assert_eq!(lines, vec![line_b.id, line_a.id]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_assign_reports_which_entity_is_missing(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let line = create_test_line(&pool, "Line A").await;
        let family = create_test_family(&pool, "CF-1", "00:45:00").await;

        let response = app
            .post("/controller_family/assign")
            .json(&json!({"line_id": Uuid::new_v4(), "controller_family_id": family.id}))
            .await;
        response.assert_status_not_found();
        let body: Value = response.json();
        assert!(body["message"].as_str().unwrap().starts_with("Line with ID"));

        let response = app
            .post("/controller_family/assign")
            .json(&json!({"line_id": line.id, "controller_family_id": Uuid::new_v4()}))
            .await;
        response.assert_status_not_found();
        let body: Value = response.json();
        assert!(body["message"].as_str().unwrap().starts_with("Controller Family with ID"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_assign_rejects_inverted_interval(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let line = create_test_line(&pool, "Line A").await;
        let family = create_test_family(&pool, "CF-1", "00:45:00").await;

        let response = app
            .post("/controller_family/assign")
            .json(&json!({
                "line_id": line.id,
                "controller_family_id": family.id,
                "start_date": "2026-03-02 06:00:00",
                "end_date": "2026-03-01 06:00:00",
            }))
            .await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["message"], json!("end_date must be after start_date"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_free_and_allocated_families(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;

        // nothing exists yet: both listings are empty but successful
        let response = app.get("/controller_family/getFreeFamilies").await;
        response.assert_status_ok();
        let response = app.get("/controller_family/getAllocatedFamilies").await;
        response.assert_status_ok();
        let allocated: ApiResponse<Vec<AllocatedFamilyResponse>> = response.json();
        assert!(allocated.data.unwrap().is_empty());

        let line = create_test_line(&pool, "Line A").await;
        let busy = create_test_family(&pool, "CF-A", "00:10:00").await;
        let idle = create_test_family(&pool, "CF-B", "00:10:00").await;
        app.post("/controller_family/assign")
            .json(&json!({"line_id": line.id, "controller_family_id": busy.id}))
            .await
            .assert_status(StatusCode::CREATED);

        let free: ApiResponse<Vec<ControllerFamilyResponse>> = app.get("/controller_family/getFreeFamilies").await.json();
        assert_eq!(free.data.unwrap().iter().map(|f| f.id).collect::<Vec<_>>(), vec![idle.id]);

        let allocated: ApiResponse<Vec<AllocatedFamilyResponse>> = app.get("/controller_family/getAllocatedFamilies").await.json();
        let allocated = allocated.data.unwrap();
        assert_eq!(allocated.len(), 1);
        assert_eq!(allocated[0].controller_family_id, busy.id);
        assert_eq!(allocated[0].family_name, "CF-A");
        assert_eq!(allocated[0].line_name, "Line A");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_line_takes_one_family_at_a_time(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let line = create_test_line(&pool, "Line A").await;
        let first = create_test_family(&pool, "CF-A", "00:10:00").await;
        let second = create_test_family(&pool, "CF-B", "00:10:00").await;

        app.post("/controller_family/assign")
            .json(&json!({"line_id": line.id, "controller_family_id": first.id}))
            .await
            .assert_status(StatusCode::CREATED);

        let response = app
            .post("/controller_family/assign")
            .json(&json!({"line_id": line.id, "controller_family_id": second.id}))
            .await;
        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(
            body["message"],
            json!(format!(
                "Line {} already has Controller Family {} assigned for an overlapping period",
                line.id, first.id
            ))
        );

        app.put(&format!("/controller_family/release/{}", first.id)).await.assert_status_ok();
        app.post("/controller_family/assign")
            .json(&json!({"line_id": line.id, "controller_family_id": second.id}))
            .await
            .assert_status(StatusCode::CREATED);
    }
}
