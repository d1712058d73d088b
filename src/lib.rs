pub mod auth;
pub mod catalog;
pub mod error;
pub mod handlers;
pub mod ical;
pub mod models;
pub mod occurrence;
pub mod openapi;
pub mod settings;
pub mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use chrono_tz::Tz;
use handlers::{
    get_ical, get_next, get_occurrences, get_service, healthz_live, healthz_ready, list_services,
    preview_occurrences, root,
};
use tower_http::LatencyUnit;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::catalog::ServiceCatalog;
use crate::ical::ICalExporter;
use crate::openapi::ApiDoc;
use crate::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub tz: Tz,
    pub catalog: Arc<ServiceCatalog>,
    pub exporter: Arc<ICalExporter>,
}

impl AppState {
    pub fn new(settings: Settings, catalog: ServiceCatalog) -> Result<Self, config::ConfigError> {
        let tz = settings.tz()?;
        let exporter = ICalExporter::new(settings.church_name.clone());
        Ok(Self {
            settings,
            tz,
            catalog: Arc::new(catalog),
            exporter: Arc::new(exporter),
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

    let catalog = ServiceCatalog::load(&settings.services_file)?;
    let state = AppState::new(settings, catalog)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    let app = build_router(state);

    info!("Starting Church Rides API on {addr}");
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
        .route("/services", get(list_services))
        .route("/services/{id}", get(get_service))
        .route("/services/{id}/next", get(get_next))
        .route("/services/{id}/occurrences", get(get_occurrences))
        .route("/services/{id}/occurrences.ical", get(get_ical))
        .route("/occurrences/preview", post(preview_occurrences))
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    router.layer(CorsLayer::permissive()).layer(trace_layer)
}
