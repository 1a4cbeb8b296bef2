use crate::{
    AppState,
    api::{
        extract::ApiQuery,
        models::{
            efficiency::{EfficiencyQuery, EfficiencyRecord},
            envelope::ApiResponse,
        },
    },
    db::handlers::{Efficiency, Repository, Users},
    errors::{Error, Result},
};
use axum::{Json, body::Bytes, extract::State};

/// `user_id` from a JSON body if one was sent, otherwise from the query string
fn requested_user(query: EfficiencyQuery, body: &[u8]) -> Result<EfficiencyQuery> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(query);
    }

    let from_body: EfficiencyQuery = serde_json::from_slice(body).map_err(|e| Error::BadRequest {
        message: format!("Invalid request body: {e}"),
    })?;
    Ok(EfficiencyQuery {
        user_id: from_body.user_id.or(query.user_id),
    })
}

#[utoipa::path(
    get,
    path = "/userEfficiency/getefficiency",
    tag = "efficiency",
    summary = "Actual vs expected duration of a user's completed jobs",
    description = "Each completed job is compared with the production_time of the controller family assigned to its line at job_date. Jobs with no such assignment are left out.",
    params(EfficiencyQuery),
    request_body(content = EfficiencyQuery, description = "Alternative to the query parameter"),
    responses(
        (status = 200, description = "Efficiency records, possibly empty", body = ApiResponse<Vec<EfficiencyRecord>>),
        (status = 400, description = "user_id missing or malformed"),
        (status = 404, description = "User not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_efficiency(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EfficiencyQuery>,
    body: Bytes,
) -> Result<Json<ApiResponse<Vec<EfficiencyRecord>>>> {
    let user_id = requested_user(query, &body)?.user_id.ok_or_else(|| Error::BadRequest {
        message: "user_id is required".to_string(),
    })?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Users::new(&mut conn).get_by_id(user_id).await?.is_none() {
        return Err(Error::not_found("User", user_id));
    }

    let rows = Efficiency::new(&mut conn).completed_jobs_with_baseline(user_id).await?;
    let records = rows.into_iter().map(EfficiencyRecord::from).collect();

    Ok(Json(ApiResponse::data(records).with_message("Efficiency data retrieved successfully")))
}
