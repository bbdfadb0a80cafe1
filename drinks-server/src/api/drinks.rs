use crate::auth::{require_scope, AuthErrorBody, Claims, ScopeGate};
use crate::errors::{ApiError, ErrorBody};
use crate::models::{
    CreateDrink, DeleteResponse, Drink, DrinksResponse, DrinksShortResponse, UpdateDrink,
};
use crate::openapi::DRINKS_TAG;
use crate::state::AppState;
use crate::store::StoreError;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    middleware,
    routing::{delete, get, patch, post, MethodRouter},
    Extension, Json, Router,
};
use log::{debug, error, info, warn};

pub(crate) const GET_DRINKS_DETAIL: &str = "get:drinks-detail";
pub(crate) const POST_DRINKS: &str = "post:drinks";
pub(crate) const PATCH_DRINKS: &str = "patch:drinks";
pub(crate) const DELETE_DRINKS: &str = "delete:drinks";

/// Drink catalog routes, each mutating route behind its own scope
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/drinks",
            get(list_drinks)
                .merge(gated(post(create_drink), state, POST_DRINKS))
                .fallback(method_not_allowed),
        )
        .route(
            "/drinks-detail",
            gated(get(list_drink_details), state, GET_DRINKS_DETAIL).fallback(method_not_allowed),
        )
        .route(
            "/drinks/{id}",
            gated(patch(update_drink), state, PATCH_DRINKS)
                .merge(gated(delete(delete_drink), state, DELETE_DRINKS))
                .fallback(method_not_allowed),
        )
}

fn gated(
    route: MethodRouter<AppState>,
    state: &AppState,
    scope: &'static str,
) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn_with_state(
        ScopeGate::new(state.verifier.clone(), scope),
        require_scope,
    ))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Every drink, or 404 when the table is empty
async fn load_all(state: &AppState) -> Result<Vec<Drink>, ApiError> {
    let drinks = state.store.list().await.map_err(|e| {
        error!("Failed to list drinks: {}", e);
        ApiError::ServerError
    })?;
    if drinks.is_empty() {
        debug!("No drinks stored");
        return Err(ApiError::NotFound);
    }
    Ok(drinks)
}

/// Rejects an unparsable `{id}` the same way as an unknown one
fn drink_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    id.map(|Path(id)| id).map_err(|e| {
        debug!("Invalid drink id: {}", e);
        ApiError::NotFound
    })
}

fn mutation_failed(action: &str, id: i64, err: StoreError) -> ApiError {
    match err {
        StoreError::Unavailable(_) => {
            error!("Failed to {} drink {}: {}", action, id, err);
            ApiError::ServerError
        }
        StoreError::Conflict(_) => {
            warn!("Failed to {} drink {}: {}", action, id, err);
            ApiError::Unprocessable
        }
        _ => {
            error!("Failed to {} drink {}: {}", action, id, err);
            ApiError::Unprocessable
        }
    }
}

/// List all drinks without ingredient names
#[utoipa::path(
    get,
    path = "/drinks",
    tag = DRINKS_TAG,
    responses(
        (status = 200, description = "Public view of every drink", body = DrinksShortResponse),
        (status = 404, description = "No drinks stored", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub(crate) async fn list_drinks(
    State(state): State<AppState>,
) -> Result<Json<DrinksShortResponse>, ApiError> {
    let drinks = load_all(&state).await?;
    Ok(Json(DrinksShortResponse {
        success: true,
        drinks: drinks.iter().map(Drink::short).collect(),
    }))
}

/// List all drinks with full recipes
#[utoipa::path(
    get,
    path = "/drinks-detail",
    tag = DRINKS_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer token granting get:drinks-detail"),
    ),
    responses(
        (status = 200, description = "Detailed view of every drink", body = DrinksResponse),
        (status = 401, description = "Missing or invalid token", body = AuthErrorBody),
        (status = 403, description = "Scope not granted", body = AuthErrorBody),
        (status = 404, description = "No drinks stored", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub(crate) async fn list_drink_details(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<DrinksResponse>, ApiError> {
    debug!("Listing drink details for {}", claims.subject());
    let drinks = load_all(&state).await?;
    Ok(Json(DrinksResponse {
        success: true,
        drinks,
    }))
}

/// Create a drink with a unique title
#[utoipa::path(
    post,
    path = "/drinks",
    tag = DRINKS_TAG,
    request_body = CreateDrink,
    params(
        ("Authorization" = String, Header, description = "Bearer token granting post:drinks"),
    ),
    responses(
        (status = 200, description = "The created drink", body = DrinksResponse),
        (status = 400, description = "Missing fields or duplicate title", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = AuthErrorBody),
        (status = 403, description = "Scope not granted", body = AuthErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    )
)]
pub(crate) async fn create_drink(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Result<Json<CreateDrink>, JsonRejection>,
) -> Result<Json<DrinksResponse>, ApiError> {
    let Json(body) = body.map_err(|e| {
        warn!("Rejected drink body: {}", e);
        ApiError::BadRequest
    })?;
    let new_drink = body.validate().map_err(|reason| {
        warn!("Rejected drink body: {}", reason);
        ApiError::BadRequest
    })?;

    let exists = state
        .store
        .title_exists(&new_drink.title)
        .await
        .map_err(|e| {
            error!("Failed to look up drink title: {}", e);
            ApiError::ServerError
        })?;
    if exists {
        warn!("Drink '{}' already exists", new_drink.title);
        return Err(ApiError::BadRequest);
    }

    let drink = state.store.insert(&new_drink).await.map_err(|e| match e {
        StoreError::Conflict(_) => {
            warn!("Drink '{}' already exists: {}", new_drink.title, e);
            ApiError::BadRequest
        }
        _ => {
            error!("Failed to insert drink '{}': {}", new_drink.title, e);
            ApiError::ServerError
        }
    })?;

    info!(
        "Drink {} '{}' created by {}",
        drink.id,
        drink.title,
        claims.subject()
    );
    Ok(Json(DrinksResponse {
        success: true,
        drinks: vec![drink],
    }))
}

/// Change the title and/or recipe of a drink
#[utoipa::path(
    patch,
    path = "/drinks/{id}",
    tag = DRINKS_TAG,
    request_body = UpdateDrink,
    params(
        ("id" = i64, Path, description = "Drink id"),
        ("Authorization" = String, Header, description = "Bearer token granting patch:drinks"),
    ),
    responses(
        (status = 200, description = "The updated drink", body = DrinksResponse),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = AuthErrorBody),
        (status = 403, description = "Scope not granted", body = AuthErrorBody),
        (status = 404, description = "Unknown drink", body = ErrorBody),
        (status = 422, description = "Store rejected the update", body = ErrorBody)
    )
)]
pub(crate) async fn update_drink(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateDrink>, JsonRejection>,
) -> Result<Json<DrinksResponse>, ApiError> {
    let id = drink_id(id)?;
    let Json(body) = body.map_err(|e| {
        warn!("Rejected update of drink {}: {}", id, e);
        ApiError::BadRequest
    })?;
    let patch = body.validate().map_err(|reason| {
        warn!("Rejected update of drink {}: {}", id, reason);
        ApiError::BadRequest
    })?;

    let drink = state
        .store
        .update(id, &patch)
        .await
        .map_err(|e| mutation_failed("update", id, e))?
        .ok_or(ApiError::NotFound)?;

    info!("Drink {} updated by {}", id, claims.subject());
    Ok(Json(DrinksResponse {
        success: true,
        drinks: vec![drink],
    }))
}

/// Remove a drink
#[utoipa::path(
    delete,
    path = "/drinks/{id}",
    tag = DRINKS_TAG,
    params(
        ("id" = i64, Path, description = "Drink id"),
        ("Authorization" = String, Header, description = "Bearer token granting delete:drinks"),
    ),
    responses(
        (status = 200, description = "Id of the removed drink", body = DeleteResponse),
        (status = 401, description = "Missing or invalid token", body = AuthErrorBody),
        (status = 403, description = "Scope not granted", body = AuthErrorBody),
        (status = 404, description = "Unknown drink", body = ErrorBody),
        (status = 422, description = "Store rejected the delete", body = ErrorBody)
    )
)]
pub(crate) async fn delete_drink(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = drink_id(id)?;
    let deleted = state
        .store
        .delete(id)
        .await
        .map_err(|e| mutation_failed("delete", id, e))?;
    if !deleted {
        return Err(ApiError::NotFound);
    }

    info!("Drink {} deleted by {}", id, claims.subject());
    Ok(Json(DeleteResponse {
        success: true,
        delete: id,
    }))
}
