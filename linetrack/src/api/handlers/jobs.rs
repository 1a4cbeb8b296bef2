use crate::{
    AppState,
    api::{
        extract::{ApiJson, ApiPath, ApiQuery},
        models::{
            envelope::ApiResponse,
            jobs::{JobResponse, ListJobsQuery, StartJob},
        },
    },
    db::{
        errors::DbError,
        handlers::{Jobs, jobs::Completion},
        models::jobs::JobCreateDBRequest,
    },
    errors::{Error, Result},
    types::JobId,
};
use axum::{Json, extract::State, http::StatusCode};

#[utoipa::path(
    post,
    path = "/job/start",
    tag = "jobs",
    summary = "Start a job",
    description = "The job is opened with `start_time = now()`. `job_date` defaults to now and decides which controller family baseline the job is measured against.",
    request_body = StartJob,
    responses(
        (status = 201, description = "Job started", body = ApiResponse<JobResponse>),
        (status = 400, description = "Invalid request or unknown line, user, shift or station"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn start_job(
    State(state): State<AppState>,
    ApiJson(start): ApiJson<StartJob>,
) -> Result<(StatusCode, Json<ApiResponse<JobResponse>>)> {
    let request = JobCreateDBRequest::try_from(start)?;
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let job = Jobs::new(&mut conn).start(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(JobResponse::from(job)).with_message("Job started successfully")),
    ))
}

#[utoipa::path(
    put,
    path = "/job/complete/{job_id}",
    tag = "jobs",
    summary = "Complete a job",
    params(("job_id" = String, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job completed", body = ApiResponse<JobResponse>),
        (status = 400, description = "Job already completed"),
        (status = 404, description = "Job not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn complete_job(State(state): State<AppState>, ApiPath(job_id): ApiPath<JobId>) -> Result<Json<ApiResponse<JobResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let completion = Jobs::new(&mut conn).complete(job_id).await.map_err(|e| match e {
        DbError::NotFound => Error::not_found("Job", job_id),
        e => e.into(),
    })?;

    match completion {
        Completion::Completed(job) => Ok(Json(ApiResponse::data(JobResponse::from(job)).with_message("Job completed successfully"))),
        Completion::AlreadyCompleted(_) => Err(Error::Conflict {
            message: "Job has already been completed".to_string(),
        }),
    }
}

#[utoipa::path(
    get,
    path = "/job/get/{id}",
    tag = "jobs",
    summary = "Get a job",
    params(("id" = String, Path, description = "Job ID")),
    responses(
        (status = 200, description = "The job", body = ApiResponse<JobResponse>),
        (status = 404, description = "Job not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_job(State(state): State<AppState>, ApiPath(id): ApiPath<JobId>) -> Result<Json<ApiResponse<JobResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let job = Jobs::new(&mut conn).get_by_id(id).await?.ok_or_else(|| Error::not_found("Job", id))?;

    Ok(Json(ApiResponse::data(job.into())))
}

#[utoipa::path(
    get,
    path = "/job/getall",
    tag = "jobs",
    summary = "List jobs, newest job_date first",
    params(ListJobsQuery),
    responses(
        (status = 200, description = "Matching jobs", body = ApiResponse<Vec<JobResponse>>),
        (status = 404, description = "No jobs match"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_jobs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListJobsQuery>,
) -> Result<Json<ApiResponse<Vec<JobResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let jobs = Jobs::new(&mut conn).list(&query.into()).await?;

    if jobs.is_empty() {
        return Err(Error::none_found("Jobs"));
    }
    Ok(Json(ApiResponse::data(jobs.into_iter().map(JobResponse::from).collect())))
}
