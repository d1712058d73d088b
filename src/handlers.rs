use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use http::header;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    AppState,
    auth::verify_token,
    error::ApiError,
    models::{Occurrence, ServiceDay},
    occurrence,
    validation::validate_count,
};

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OccurrenceQuery {
    pub from: Option<NaiveDate>,
    #[serde(default = "default_count")]
    pub count: usize,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PreviewRequest {
    pub service: ServiceDay,
    #[schema(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    pub count: Option<usize>,
}

fn default_count() -> usize {
    4
}

type BearerHeader = Option<TypedHeader<Authorization<Bearer>>>;

fn authorize(state: &AppState, auth: BearerHeader, token: Option<&str>) -> Result<(), ApiError> {
    let auth_header = auth.map(|TypedHeader(a)| a);
    verify_token(&state.settings, auth_header, token)
}

fn local_now(state: &AppState) -> NaiveDateTime {
    Utc::now().with_timezone(&state.tz).naive_local()
}

fn find_service<'a>(state: &'a AppState, id: &str) -> Result<&'a ServiceDay, ApiError> {
    state
        .catalog
        .get(id)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown service '{id}'")))
}

fn compute(
    state: &AppState,
    service: &ServiceDay,
    from: Option<NaiveDate>,
    count: usize,
) -> Result<Vec<Occurrence>, ApiError> {
    let count = validate_count(count, state.settings.max_occurrences)?;
    let from = from.unwrap_or_else(|| local_now(state).date());
    let dates = occurrence::occurrences(service, from, count, state.settings.horizon_days)?;
    Ok(dates
        .into_iter()
        .map(|date| Occurrence::new(service, date))
        .collect())
}

#[utoipa::path(get, path = "/", tag = "services")]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Church Rides Service Schedule API",
        "endpoints": {
            "/services": "List configured service days",
            "/services/{id}/occurrences": "Upcoming dates for a service",
            "/services/{id}/next": "Default date for a new ride request",
            "/services/{id}/occurrences.ical": "Upcoming dates as iCal file",
            "/occurrences/preview": "Evaluate an unsaved service definition"
        }
    }))
}

#[utoipa::path(get, path = "/healthz/live", tag = "services")]
pub async fn healthz_live() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(get, path = "/healthz/ready", tag = "services")]
pub async fn healthz_ready() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(
    get,
    path = "/services",
    params(
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Configured service days", body = [ServiceDay]),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "services"
)]
pub async fn list_services(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    Ok(Json(state.catalog.all().to_vec()))
}

#[utoipa::path(
    get,
    path = "/services/{id}",
    params(
        ("id" = String, Path, description = "Service id"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Service day definition", body = ServiceDay),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Unknown service")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "services"
)]
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let service = find_service(&state, &id)?;
    Ok(Json(service.clone()))
}

#[utoipa::path(
    get,
    path = "/services/{id}/occurrences",
    params(
        ("id" = String, Path, description = "Service id"),
        ("from" = Option<String>, Query, description = "Reference date (YYYY-MM-DD), defaults to today"),
        ("count" = Option<usize>, Query, description = "Number of dates (1 to max_occurrences)"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Upcoming occurrences, possibly fewer than requested", body = [Occurrence]),
        (status = 400, description = "Invalid count"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Unknown service")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "services"
)]
pub async fn get_occurrences(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth: BearerHeader,
    Query(query): Query<OccurrenceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let service = find_service(&state, &id)?;
    let occurrences = compute(&state, service, query.from, query.count)?;
    Ok(Json(occurrences))
}

#[utoipa::path(
    get,
    path = "/services/{id}/next",
    params(
        ("id" = String, Path, description = "Service id"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Default date for a new ride request", body = Occurrence),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Unknown service or no upcoming date")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "services"
)]
pub async fn get_next(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let service = find_service(&state, &id)?;
    let date = occurrence::default_request_date(
        service,
        local_now(&state),
        state.settings.horizon_days,
    )?
    .ok_or_else(|| ApiError::NotFound(format!("No upcoming date for '{id}'")))?;
    Ok(Json(Occurrence::new(service, date)))
}

#[utoipa::path(
    get,
    path = "/services/{id}/occurrences.ical",
    params(
        ("id" = String, Path, description = "Service id"),
        ("from" = Option<String>, Query, description = "Reference date (YYYY-MM-DD), defaults to today"),
        ("count" = Option<usize>, Query, description = "Number of dates (1 to max_occurrences)"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "iCal file", content_type = "text/calendar"),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Unknown service or no upcoming dates")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "services"
)]
pub async fn get_ical(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth: BearerHeader,
    Query(query): Query<OccurrenceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let service = find_service(&state, &id)?;
    let occurrences = compute(&state, service, query.from, query.count)?;

    if occurrences.is_empty() {
        return Err(ApiError::NotFound(format!("No upcoming dates for '{id}'")));
    }

    let body = state.exporter.generate(service, &occurrences);
    let disposition = format!("attachment; filename={}.ics", service.id);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/calendar".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

#[utoipa::path(
    post,
    path = "/occurrences/preview",
    params(
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    request_body = PreviewRequest,
    responses(
        (status = 200, description = "Occurrences of the submitted definition", body = [Occurrence]),
        (status = 400, description = "Misconfigured service definition or invalid count"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "services"
)]
pub async fn preview_occurrences(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
    Json(request): Json<PreviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let count = request.count.unwrap_or_else(default_count);
    let occurrences = compute(&state, &request.service, request.from, count)?;
    info!(
        service = %request.service.id,
        found = occurrences.len(),
        "previewed service definition"
    );
    Ok(Json(occurrences))
}
