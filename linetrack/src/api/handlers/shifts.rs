use crate::{
    AppState,
    api::{
        extract::{ApiJson, ApiPath},
        models::{
            envelope::ApiResponse,
            shifts::{ShiftCreate, ShiftResponse, ShiftUpdate},
        },
    },
    db::{
        errors::DbError,
        handlers::{Repository, Shifts},
        models::shifts::{ShiftCreateDBRequest, ShiftUpdateDBRequest},
    },
    errors::{Error, Result},
    types::ShiftId,
};
use axum::{Json, extract::State, http::StatusCode};

#[utoipa::path(
    post,
    path = "/shift/addshift",
    tag = "shifts",
    summary = "Create a shift",
    request_body = ShiftCreate,
    responses(
        (status = 201, description = "Shift created", body = ApiResponse<ShiftResponse>),
        (status = 400, description = "Times not HH:MM:SS"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn add_shift(
    State(state): State<AppState>,
    ApiJson(create): ApiJson<ShiftCreate>,
) -> Result<(StatusCode, Json<ApiResponse<ShiftResponse>>)> {
    let request = ShiftCreateDBRequest::try_from(create)?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let shift = Shifts::new(&mut conn).create(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(ShiftResponse::from(shift)).with_message("Shift created successfully")),
    ))
}

#[utoipa::path(
    get,
    path = "/shift/getall",
    tag = "shifts",
    summary = "List shifts",
    responses(
        (status = 200, description = "All shifts", body = ApiResponse<Vec<ShiftResponse>>),
        (status = 404, description = "No shifts exist"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_shifts(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<ShiftResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let shifts = Shifts::new(&mut conn).list().await?;

    if shifts.is_empty() {
        return Err(Error::none_found("Shifts"));
    }
    Ok(Json(ApiResponse::data(shifts.into_iter().map(ShiftResponse::from).collect())))
}

#[utoipa::path(
    get,
    path = "/shift/get/{id}",
    tag = "shifts",
    summary = "Get a shift",
    params(("id" = String, Path, description = "Shift ID")),
    responses(
        (status = 200, description = "The shift", body = ApiResponse<ShiftResponse>),
        (status = 404, description = "Shift not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_shift(State(state): State<AppState>, ApiPath(id): ApiPath<ShiftId>) -> Result<Json<ApiResponse<ShiftResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let shift = Shifts::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Shift", id))?;

    Ok(Json(ApiResponse::data(shift.into())))
}

#[utoipa::path(
    put,
    path = "/shift/updateshift/{id}",
    tag = "shifts",
    summary = "Update a shift",
    params(("id" = String, Path, description = "Shift ID")),
    request_body = ShiftUpdate,
    responses(
        (status = 200, description = "Shift updated", body = ApiResponse<ShiftResponse>),
        (status = 400, description = "Times not HH:MM:SS"),
        (status = 404, description = "Shift not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_shift(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ShiftId>,
    ApiJson(update): ApiJson<ShiftUpdate>,
) -> Result<Json<ApiResponse<ShiftResponse>>> {
    let request = ShiftUpdateDBRequest::try_from(update)?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let shift = Shifts::new(&mut conn).update(id, &request).await.map_err(|e| match e {
        DbError::NotFound => Error::not_found("Shift", id),
        e => e.into(),
    })?;

    Ok(Json(ApiResponse::data(ShiftResponse::from(shift)).with_message("Shift updated successfully")))
}
