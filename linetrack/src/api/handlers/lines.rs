use crate::{
    AppState,
    api::{
        extract::{ApiJson, ApiPath},
        models::{
            envelope::ApiResponse,
            lines::{LineCreate, LineResponse, LineUpdate},
        },
    },
    db::{
        errors::DbError,
        handlers::{Lines, Repository},
    },
    errors::{Error, Result},
    types::LineId,
};
use axum::{Json, extract::State, http::StatusCode};

#[utoipa::path(
    post,
    path = "/line/addline",
    tag = "lines",
    summary = "Create a line",
    request_body = LineCreate,
    responses(
        (status = 201, description = "Line created", body = ApiResponse<LineResponse>),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn add_line(
    State(state): State<AppState>,
    ApiJson(create): ApiJson<LineCreate>,
) -> Result<(StatusCode, Json<ApiResponse<LineResponse>>)> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let line = Lines::new(&mut conn).create(&create.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(LineResponse::from(line)).with_message("Line created successfully")),
    ))
}

#[utoipa::path(
    get,
    path = "/line/getall",
    tag = "lines",
    summary = "List lines",
    responses(
        (status = 200, description = "All lines", body = ApiResponse<Vec<LineResponse>>),
        (status = 404, description = "No lines exist"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_lines(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<LineResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let lines = Lines::new(&mut conn).list().await?;

    if lines.is_empty() {
        return Err(Error::none_found("Lines"));
    }
    Ok(Json(ApiResponse::data(lines.into_iter().map(LineResponse::from).collect())))
}

#[utoipa::path(
    get,
    path = "/line/get/{id}",
    tag = "lines",
    summary = "Get a line",
    params(("id" = String, Path, description = "Line ID")),
    responses(
        (status = 200, description = "The line", body = ApiResponse<LineResponse>),
        (status = 404, description = "Line not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_line(State(state): State<AppState>, ApiPath(id): ApiPath<LineId>) -> Result<Json<ApiResponse<LineResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let line = Lines::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Line", id))?;

    Ok(Json(ApiResponse::data(line.into())))
}

#[utoipa::path(
    put,
    path = "/line/updateline/{id}",
    tag = "lines",
    summary = "Update a line",
    params(("id" = String, Path, description = "Line ID")),
    request_body = LineUpdate,
    responses(
        (status = 200, description = "Line updated", body = ApiResponse<LineResponse>),
        (status = 404, description = "Line not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_line(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<LineId>,
    ApiJson(update): ApiJson<LineUpdate>,
) -> Result<Json<ApiResponse<LineResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let line = Lines::new(&mut conn).update(id, &update.into()).await.map_err(|e| match e {
        DbError::NotFound => Error::not_found("Line", id),
        e => e.into(),
    })?;

    Ok(Json(ApiResponse::data(LineResponse::from(line)).with_message("Line updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/line/deleteline/{id}",
    tag = "lines",
    summary = "Delete a line",
    params(("id" = String, Path, description = "Line ID")),
    responses(
        (status = 200, description = "Line deleted"),
        (status = 400, description = "Line still has recorded jobs"),
        (status = 404, description = "Line not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_line(State(state): State<AppState>, ApiPath(id): ApiPath<LineId>) -> Result<Json<ApiResponse<()>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if !Lines::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("Line", id));
    }
    Ok(Json(ApiResponse::message("Line deleted successfully")))
}
