pub mod auth;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod ical;
pub mod models;
pub mod openapi;
pub mod recurrence;
pub mod schedule;
pub mod settings;
pub mod store;
pub mod validation;
pub mod weekday;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use chrono_tz::Tz;
use config::ConfigError;
use handlers::{
    get_calendar, get_calendar_ical, get_class_occurrences, healthz_live, healthz_ready,
    list_classes, preview, root,
};
use tower_http::LatencyUnit;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::ical::ICalExporter;
use crate::openapi::ApiDoc;
use crate::settings::Settings;
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub(crate) settings: Settings,
    pub(crate) store: Arc<DocumentStore>,
    pub(crate) exporter: Arc<ICalExporter>,
    pub(crate) timezone: Tz,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, ConfigError> {
        let timezone = settings.studio_timezone()?;
        Ok(Self {
            store: Arc::new(DocumentStore::new(settings.store_url.clone())),
            exporter: Arc::new(ICalExporter::new(settings.calendar_name.clone(), timezone)),
            timezone,
            settings,
        })
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .init();

    let state = AppState::new(settings)?;
    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    info!(
        store_url = %state.settings.store_url,
        timezone = %state.timezone,
        "Starting Studio Schedule API on {addr}"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz/live", get(healthz_live))
        .route("/healthz/ready", get(healthz_ready))
        .route("/studios/{studio_id}/classes", get(list_classes))
        .route("/studios/{studio_id}/calendar", get(get_calendar))
        .route("/studios/{studio_id}/calendar.ical", get(get_calendar_ical))
        .route(
            "/studios/{studio_id}/classes/{class_id}/occurrences",
            get(get_class_occurrences),
        )
        .route("/preview", post(preview))
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    router.layer(trace_layer).layer(CorsLayer::permissive())
}
