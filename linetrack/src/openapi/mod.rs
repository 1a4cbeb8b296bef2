//! OpenAPI documentation for the HTTP API, served through Scalar at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Session token as a bearer header or as the session cookie
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "BearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session token returned by `POST /user/login`"))
                        .build(),
                ),
            );
            components.add_security_scheme(
                "CookieAuth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "linetrack_session",
                    "Session cookie set by `POST /user/login`",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "linetrack",
        description = "Manufacturing line job tracking: line assignments of controller families and stations, jobs, and operator efficiency."
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::controller_families::add_family,
        api::handlers::controller_families::list_families,
        api::handlers::controller_families::get_family,
        api::handlers::controller_families::update_family,
        api::handlers::controller_families::delete_family,
        api::handlers::controller_families::assign_family,
        api::handlers::controller_families::release_family,
        api::handlers::controller_families::family_history,
        api::handlers::controller_families::allocated_families,
        api::handlers::controller_families::free_families,
        api::handlers::stations::add_station,
        api::handlers::stations::list_stations,
        api::handlers::stations::get_station,
        api::handlers::stations::update_station,
        api::handlers::stations::delete_station,
        api::handlers::stations::assign_station,
        api::handlers::stations::release_station,
        api::handlers::stations::station_history,
        api::handlers::stations::stations_by_line,
        api::handlers::stations::all_stations,
        api::handlers::lines::add_line,
        api::handlers::lines::list_lines,
        api::handlers::lines::get_line,
        api::handlers::lines::update_line,
        api::handlers::lines::delete_line,
        api::handlers::shifts::add_shift,
        api::handlers::shifts::list_shifts,
        api::handlers::shifts::get_shift,
        api::handlers::shifts::update_shift,
        api::handlers::users::add_user,
        api::handlers::users::update_user,
        api::handlers::users::login,
        api::handlers::users::logout,
        api::handlers::users::get_current_user,
        api::handlers::users::delete_user,
        api::handlers::users::list_users,
        api::handlers::jobs::start_job,
        api::handlers::jobs::complete_job,
        api::handlers::jobs::get_job,
        api::handlers::jobs::list_jobs,
        api::handlers::efficiency::get_efficiency,
    ),
    components(
        schemas(
            api::models::controller_families::ControllerFamilyCreate,
            api::models::controller_families::ControllerFamilyUpdate,
            api::models::controller_families::ControllerFamilyResponse,
            api::models::stations::StationCreate,
            api::models::stations::StationUpdate,
            api::models::stations::StationResponse,
            api::models::lines::LineCreate,
            api::models::lines::LineUpdate,
            api::models::lines::LineResponse,
            api::models::shifts::ShiftCreate,
            api::models::shifts::ShiftUpdate,
            api::models::shifts::ShiftResponse,
            api::models::assignments::FamilyAssignRequest,
            api::models::assignments::StationAssignRequest,
            api::models::assignments::FamilyAssignmentResponse,
            api::models::assignments::StationAssignmentResponse,
            api::models::assignments::AllocatedFamilyResponse,
            api::models::assignments::AllocatedStationResponse,
            api::models::assignments::StationPartition,
            api::models::assignments::ReleaseResponse,
            api::models::users::Role,
            api::models::users::UserCreate,
            api::models::users::UserUpdate,
            api::models::users::UserResponse,
            api::models::users::LoginRequest,
            api::models::users::LoginResponse,
            api::models::jobs::JobStatus,
            api::models::jobs::StartJob,
            api::models::jobs::JobResponse,
            api::models::efficiency::EfficiencyQuery,
            api::models::efficiency::EfficiencyRecord,
        )
    ),
    tags(
        (name = "controller_families", description = "Controller families and their line assignments. A family holds at most one active assignment and must be released before it moves."),
        (name = "stations", description = "Stations and their line assignments. Assigning a station closes its previous assignment."),
        (name = "lines", description = "Production lines"),
        (name = "shifts", description = "Shift definitions"),
        (name = "users", description = "Accounts and sessions"),
        (name = "jobs", description = "Job start and completion"),
        (name = "efficiency", description = "Actual vs expected job durations"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_engine_paths_and_security() {
        let doc = ApiDoc::openapi();

        for path in [
            "/controller_family/assign",
            "/controller_family/getFreeFamilies",
            "/station/assignStation",
            "/station/getAllStations",
            "/userEfficiency/getefficiency",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("BearerAuth"));
        assert!(components.security_schemes.contains_key("CookieAuth"));
    }
}
