use crate::{
    AppState,
    api::{
        extract::{ApiJson, ApiPath},
        handlers::assignments,
        models::{
            assignments::{AllocatedStationResponse, ReleaseResponse, StationAssignRequest, StationAssignmentResponse, StationPartition},
            envelope::ApiResponse,
            stations::{StationCreate, StationResponse, StationUpdate},
        },
    },
    db::{
        errors::DbError,
        handlers::{Assignments, Lines, Repository, Stations},
        models::assignments::{AssignmentCreateDBRequest, StationLink},
    },
    errors::{Error, Result},
    types::{LineId, StationId},
};
use axum::{Json, extract::State, http::StatusCode};

#[utoipa::path(
    post,
    path = "/station/addstation",
    tag = "stations",
    summary = "Create a station",
    request_body = StationCreate,
    responses(
        (status = 201, description = "Station created", body = ApiResponse<StationResponse>),
        (status = 400, description = "Invalid request"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn add_station(
    State(state): State<AppState>,
    ApiJson(create): ApiJson<StationCreate>,
) -> Result<(StatusCode, Json<ApiResponse<StationResponse>>)> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let station = Stations::new(&mut conn).create(&create.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(StationResponse::from(station)).with_message("Station created successfully")),
    ))
}

#[utoipa::path(
    get,
    path = "/station/getall",
    tag = "stations",
    summary = "List stations",
    responses(
        (status = 200, description = "All stations", body = ApiResponse<Vec<StationResponse>>),
        (status = 404, description = "No stations exist"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_stations(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<StationResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let stations = Stations::new(&mut conn).list().await?;

    if stations.is_empty() {
        return Err(Error::none_found("Stations"));
    }
    Ok(Json(ApiResponse::data(stations.into_iter().map(StationResponse::from).collect())))
}

#[utoipa::path(
    get,
    path = "/station/get/{id}",
    tag = "stations",
    summary = "Get a station",
    params(("id" = String, Path, description = "Station ID")),
    responses(
        (status = 200, description = "The station", body = ApiResponse<StationResponse>),
        (status = 404, description = "Station not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_station(State(state): State<AppState>, ApiPath(id): ApiPath<StationId>) -> Result<Json<ApiResponse<StationResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let station = Stations::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Station", id))?;

    Ok(Json(ApiResponse::data(station.into())))
}

#[utoipa::path(
    put,
    path = "/station/updatestation/{id}",
    tag = "stations",
    summary = "Update a station",
    params(("id" = String, Path, description = "Station ID")),
    request_body = StationUpdate,
    responses(
        (status = 200, description = "Station updated", body = ApiResponse<StationResponse>),
        (status = 404, description = "Station not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_station(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<StationId>,
    ApiJson(update): ApiJson<StationUpdate>,
) -> Result<Json<ApiResponse<StationResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let station = Stations::new(&mut conn).update(id, &update.into()).await.map_err(|e| match e {
        DbError::NotFound => Error::not_found("Station", id),
        e => e.into(),
    })?;

    Ok(Json(ApiResponse::data(StationResponse::from(station)).with_message("Station updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/station/delete/{id}",
    tag = "stations",
    summary = "Delete a station",
    params(("id" = String, Path, description = "Station ID")),
    responses(
        (status = 200, description = "Station deleted"),
        (status = 404, description = "Station not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_station(State(state): State<AppState>, ApiPath(id): ApiPath<StationId>) -> Result<Json<ApiResponse<()>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if !Stations::new(&mut conn).delete(id).await? {
        return Err(Error::not_found("Station", id));
    }
    Ok(Json(ApiResponse::message("Station deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/station/assignStation",
    tag = "stations",
    summary = "Move a station to a line",
    description = "The station's running assignment is closed at the new start (or now, if that is later) and any that has not started is cancelled, in the same transaction. A start at or before the running assignment's start, or an interval that has already ended, is rejected.",
    request_body = StationAssignRequest,
    responses(
        (status = 201, description = "Station assigned", body = ApiResponse<StationAssignmentResponse>),
        (status = 400, description = "Invalid interval, or a move that would rewrite the running assignment"),
        (status = 404, description = "Line or station not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn assign_station(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<StationAssignRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StationAssignmentResponse>>)> {
    let request = AssignmentCreateDBRequest::try_from(&request)?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let outcome = assignments::assign::<StationLink>(&mut conn, &request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(StationAssignmentResponse::from(outcome)).with_message("Station assigned to line successfully")),
    ))
}

#[utoipa::path(
    put,
    path = "/station/release/{station_id}",
    tag = "stations",
    summary = "End a station's active assignment now",
    params(("station_id" = String, Path, description = "Station ID")),
    responses(
        (status = 200, description = "Assignment released", body = ApiResponse<ReleaseResponse>),
        (status = 404, description = "Station has no active assignment"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn release_station(State(state): State<AppState>, ApiPath(id): ApiPath<StationId>) -> Result<Json<ApiResponse<ReleaseResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let released = assignments::release::<StationLink>(&mut conn, id).await?;

    Ok(Json(ApiResponse::data(ReleaseResponse::from(released)).with_message("Station released successfully")))
}

#[utoipa::path(
    get,
    path = "/station/history/{id}",
    tag = "stations",
    summary = "Assignment history of a station, newest first",
    params(("id" = String, Path, description = "Station ID")),
    responses(
        (status = 200, description = "Assignment history", body = ApiResponse<Vec<StationAssignmentResponse>>),
        (status = 404, description = "Station not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn station_history(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<StationId>,
) -> Result<Json<ApiResponse<Vec<StationAssignmentResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let history = assignments::history::<StationLink>(&mut conn, id).await?;

    Ok(Json(ApiResponse::data(history.into_iter().map(StationAssignmentResponse::from).collect())))
}

#[utoipa::path(
    get,
    path = "/station/getStationsByLine/{line_id}",
    tag = "stations",
    summary = "Stations actively assigned to a line",
    params(("line_id" = String, Path, description = "Line ID")),
    responses(
        (status = 200, description = "Stations on the line", body = ApiResponse<Vec<AllocatedStationResponse>>),
        (status = 404, description = "Line not found or no stations assigned to it"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn stations_by_line(
    State(state): State<AppState>,
    ApiPath(line_id): ApiPath<LineId>,
) -> Result<Json<ApiResponse<Vec<AllocatedStationResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if Lines::new(&mut conn).get_by_id(line_id).await?.is_none() {
        return Err(Error::not_found("Line", line_id));
    }
    let stations = Assignments::<StationLink>::new(&mut conn).list_allocated(Some(line_id)).await?;

    if stations.is_empty() {
        return Err(Error::none_found("stations for this line"));
    }
    Ok(Json(ApiResponse::data(stations.into_iter().map(AllocatedStationResponse::from).collect())))
}

#[utoipa::path(
    get,
    path = "/station/getAllStations",
    tag = "stations",
    summary = "Every station, split into free and allocated",
    description = "Both halves are read from one snapshot, so no station appears in both or in neither.",
    responses(
        (status = 200, description = "Station partition", body = ApiResponse<StationPartition>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn all_stations(State(state): State<AppState>) -> Result<Json<ApiResponse<StationPartition>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let (free, allocated) = Assignments::<StationLink>::new(&mut conn).partition().await?;

    Ok(Json(ApiResponse::data(StationPartition {
        free: free.into_iter().map(StationResponse::from).collect(),
        allocated: allocated.into_iter().map(AllocatedStationResponse::from).collect(),
    })))
}
