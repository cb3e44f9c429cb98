use axum::{
    async_trait,
    extract::{FromRequestParts, Json, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::{errors::CheckoutError, services::validation::CheckoutInput, AppState};

/// Header carrying the authenticated customer id, injected by the gateway
/// in front of this service. Session resolution itself lives upstream.
const CUSTOMER_ID_HEADER: &str = "x-customer-id";

pub fn checkout_routes() -> Router<Arc<AppState>> {
    Router::new().route("/", post(place_order))
}

/// The authenticated customer, as asserted by the upstream gateway.
pub struct CurrentCustomer(pub Uuid);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentCustomer {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CUSTOMER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| unauthorized("missing customer identity"))?;
        let id = Uuid::parse_str(raw).map_err(|_| unauthorized("malformed customer identity"))?;
        Ok(Self(id))
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized", "message": message })),
    )
        .into_response()
}

async fn place_order(
    State(state): State<Arc<AppState>>,
    CurrentCustomer(customer_id): CurrentCustomer,
    Json(input): Json<CheckoutInput>,
) -> Result<impl IntoResponse, CheckoutError> {
    let cart = state.carts.get_cart(customer_id).await?;
    let order_number = state.checkout.place_order(customer_id, input, cart).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "order_number": order_number })),
    ))
}
