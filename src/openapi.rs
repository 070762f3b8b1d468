use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers::PreviewRequest;
use crate::models::{ClassDefinition, ClassType, Occurrence};
use crate::recurrence::ExpansionWindow;

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
        crate::handlers::list_classes,
        crate::handlers::get_calendar,
        crate::handlers::get_calendar_ical,
        crate::handlers::get_class_occurrences,
        crate::handlers::preview
    ),
    components(schemas(ClassDefinition, ClassType, Occurrence, ExpansionWindow, PreviewRequest)),
    tags(
        (name = "schedule", description = "Studio class schedule operations")
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;
