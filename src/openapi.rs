use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers::PreviewRequest;
use crate::models::{Frequency, Occurrence, Ordinal, ServiceCategory, ServiceDay};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
        components.add_security_scheme(
            "query_token",
            SecurityScheme::ApiKey(ApiKey::Query(ApiKeyValue::new("token"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz_live,
        crate::handlers::healthz_ready,
        crate::handlers::list_services,
        crate::handlers::get_service,
        crate::handlers::get_occurrences,
        crate::handlers::get_next,
        crate::handlers::get_ical,
        crate::handlers::preview_occurrences
    ),
    components(schemas(
        ServiceDay,
        ServiceCategory,
        Frequency,
        Ordinal,
        Occurrence,
        PreviewRequest
    )),
    tags(
        (name = "services", description = "Service day schedule operations")
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;
