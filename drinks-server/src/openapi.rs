use crate::api::{drinks, health};
use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const DRINKS_TAG: &str = "Drinks API";

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::ready_check,
        drinks::list_drinks,
        drinks::list_drink_details,
        drinks::create_drink,
        drinks::update_drink,
        drinks::delete_drink,
    ),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = DRINKS_TAG, description = "Drink catalog, protected routes require a bearer token with the matching scope"),
    ),
    info(
        title = "Coffee Shop Drinks API",
        description = "Drink menu backend with scope-gated mutations",
        version = "1.0.0"
    )
)]
pub(crate) struct ApiDoc;
