use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use chrono::{NaiveDate, Utc};
use http::header;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    AppState,
    auth::verify_token,
    error::ApiError,
    filter::ClassFilter,
    models::{ClassDefinition, Occurrence},
    recurrence::{ExpansionWindow, expand, expand_all},
    validation::{bounded_window, parse_id_list, resolve_window, validate_class},
};

type BearerHeader = Option<TypedHeader<Authorization<Bearer>>>;

#[derive(Debug, Deserialize)]
pub struct ClassesQuery {
    pub season: Option<String>,
    pub room: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub season: Option<String>,
    pub room: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub token: Option<String>,
}

/// A class that has not been saved yet, expanded over an optional window.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub class: ClassDefinition,
    #[schema(value_type = Option<String>, format = "date", example = "2024-06-03")]
    pub start: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date", example = "2024-06-30")]
    pub end: Option<NaiveDate>,
}

fn authorize(state: &AppState, auth: BearerHeader, query_token: Option<&str>) -> Result<(), ApiError> {
    let header = auth.map(|TypedHeader(a)| a);
    verify_token(&state.settings.auth_token, header.as_ref(), query_token)
}

fn studio_today(state: &AppState) -> NaiveDate {
    Utc::now().with_timezone(&state.timezone).date_naive()
}

async fn load_occurrences(
    state: &AppState,
    studio_id: &str,
    query: &CalendarQuery,
) -> Result<(ExpansionWindow, Vec<Occurrence>), ApiError> {
    let window = resolve_window(
        query.start.as_deref(),
        query.end.as_deref(),
        studio_today(state),
    )?;
    let filter = ClassFilter::new(
        parse_id_list(query.season.as_deref()),
        parse_id_list(query.room.as_deref()),
    );

    let classes = state.store.fetch_classes(studio_id, &filter).await?;
    let occurrences = expand_all(&classes, window)?;
    info!(
        studio_id,
        classes = classes.len(),
        occurrences = occurrences.len(),
        start = %window.start(),
        end = %window.end(),
        "expanded calendar"
    );
    Ok((window, occurrences))
}

#[utoipa::path(get, path = "/", tag = "schedule")]
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Studio Schedule API",
        "endpoints": {
            "/studios/{studio_id}/classes": "Get filtered class definitions as JSON",
            "/studios/{studio_id}/calendar": "Get class occurrences as JSON",
            "/studios/{studio_id}/calendar.ical": "Download class occurrences as iCal file",
            "/studios/{studio_id}/classes/{class_id}/occurrences": "Get occurrences of one class",
            "/preview": "Expand an unsaved class definition"
        }
    }))
}

#[utoipa::path(get, path = "/healthz/live", tag = "schedule")]
pub async fn healthz_live() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(get, path = "/healthz/ready", tag = "schedule")]
pub async fn healthz_ready() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(
    get,
    path = "/studios/{studio_id}/classes",
    params(
        ("studio_id" = String, Path, description = "Studio (tenant) identifier"),
        ("season" = Option<String>, Query, description = "Comma separated season ids, or `all`"),
        ("room" = Option<String>, Query, description = "Comma separated room ids, or `all`"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Classes passing the filter", body = [ClassDefinition]),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "schedule"
)]
pub async fn list_classes(
    State(state): State<AppState>,
    Path(studio_id): Path<String>,
    auth: BearerHeader,
    Query(query): Query<ClassesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;

    let filter = ClassFilter::new(
        parse_id_list(query.season.as_deref()),
        parse_id_list(query.room.as_deref()),
    );
    let classes = state.store.fetch_classes(&studio_id, &filter).await?;
    Ok(Json(classes))
}

#[utoipa::path(
    get,
    path = "/studios/{studio_id}/calendar",
    params(
        ("studio_id" = String, Path, description = "Studio (tenant) identifier"),
        ("season" = Option<String>, Query, description = "Comma separated season ids, or `all`"),
        ("room" = Option<String>, Query, description = "Comma separated room ids, or `all`"),
        ("start" = Option<String>, Query, description = "First date (YYYY-MM-DD), defaults to today"),
        ("end" = Option<String>, Query, description = "Last date (YYYY-MM-DD), defaults to one month after start"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Occurrences in chronological order", body = [Occurrence]),
        (status = 400, description = "Malformed window"),
        (status = 401, description = "Invalid authentication token"),
        (status = 422, description = "A stored class has an invalid schedule")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "schedule"
)]
pub async fn get_calendar(
    State(state): State<AppState>,
    Path(studio_id): Path<String>,
    auth: BearerHeader,
    Query(query): Query<CalendarQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let (_, occurrences) = load_occurrences(&state, &studio_id, &query).await?;
    Ok(Json(occurrences))
}

#[utoipa::path(
    get,
    path = "/studios/{studio_id}/calendar.ical",
    params(
        ("studio_id" = String, Path, description = "Studio (tenant) identifier"),
        ("season" = Option<String>, Query, description = "Comma separated season ids, or `all`"),
        ("room" = Option<String>, Query, description = "Comma separated room ids, or `all`"),
        ("start" = Option<String>, Query, description = "First date (YYYY-MM-DD), defaults to today"),
        ("end" = Option<String>, Query, description = "Last date (YYYY-MM-DD), defaults to one month after start"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "iCal file", content_type = "text/calendar"),
        (status = 400, description = "Malformed window"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "schedule"
)]
pub async fn get_calendar_ical(
    State(state): State<AppState>,
    Path(studio_id): Path<String>,
    auth: BearerHeader,
    Query(query): Query<CalendarQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let (window, occurrences) = load_occurrences(&state, &studio_id, &query).await?;

    let body = state.exporter.generate(&occurrences);
    let disposition = format!(
        "attachment; filename={studio_id}_{}_{}.ics",
        window.start().format("%Y%m%d"),
        window.end().format("%Y%m%d")
    );
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
    get,
    path = "/studios/{studio_id}/classes/{class_id}/occurrences",
    params(
        ("studio_id" = String, Path, description = "Studio (tenant) identifier"),
        ("class_id" = String, Path, description = "Class identifier"),
        ("start" = Option<String>, Query, description = "First date (YYYY-MM-DD), defaults to today"),
        ("end" = Option<String>, Query, description = "Last date (YYYY-MM-DD), defaults to one month after start"),
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    responses(
        (status = 200, description = "Occurrences of the class", body = [Occurrence]),
        (status = 401, description = "Invalid authentication token"),
        (status = 404, description = "Class not found"),
        (status = 422, description = "The class has an invalid schedule")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "schedule"
)]
pub async fn get_class_occurrences(
    State(state): State<AppState>,
    Path((studio_id, class_id)): Path<(String, String)>,
    auth: BearerHeader,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    let window = resolve_window(
        query.start.as_deref(),
        query.end.as_deref(),
        studio_today(&state),
    )?;

    let class = state.store.fetch_class(&studio_id, &class_id).await?;
    let occurrences = expand_all(std::slice::from_ref(&class), window)?;
    Ok(Json(occurrences))
}

#[utoipa::path(
    post,
    path = "/preview",
    params(
        ("token" = Option<String>, Query, description = "Authentication token (alternative to Bearer header)")
    ),
    request_body = PreviewRequest,
    responses(
        (status = 200, description = "Occurrences the class would produce", body = [Occurrence]),
        (status = 400, description = "Malformed class or window"),
        (status = 401, description = "Invalid authentication token")
    ),
    security(("bearer_auth" = []), ("query_token" = [])),
    tag = "schedule"
)]
pub async fn preview(
    State(state): State<AppState>,
    auth: BearerHeader,
    Query(query): Query<TokenQuery>,
    Json(request): Json<PreviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, auth, query.token.as_deref())?;
    validate_class(&request.class)?;

    let start = request.start.unwrap_or_else(|| studio_today(&state));
    let window = bounded_window(start, request.end)?;
    let occurrences = expand(&request.class, window.start(), window.end())?;
    Ok(Json(occurrences))
}
