//! HTTP API: authenticated DM delivery and health

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use relay_wire::{
    is_account_id, HealthResponse, SendDmRequest, SendDmResponse, API_KEY_HEADER, HEALTH_PATH,
    SEND_DM_PATH,
};
use tower_http::trace::TraceLayer;

use crate::discord::{DirectMessage, DiscordApi};
use crate::rate_limit::{self, RateLimiter};
use crate::RelayError;

pub const INVALID_DISCORD_ID: &str = "Invalid discord_id parameter";

/// Shared state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub discord: Arc<dyn DiscordApi>,
    pub api_key: Arc<str>,
    pub limiter: Arc<RateLimiter>,
}

/// Build the relay's axum router
pub fn build_router(state: AppState) -> Router {
    // Layers run bottom-up: the limiter sees every request, auth runs next
    let send_dm = Router::new()
        .route(SEND_DM_PATH, post(send_dm_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.limiter),
            rate_limit::enforce,
        ));

    Router::new()
        .merge(send_dm)
        .route(HEALTH_PATH, get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn reply(status: StatusCode, body: SendDmResponse) -> Response {
    (status, Json(body)).into_response()
}

/// Case-insensitive comparison against the configured key
async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if keys_match(key, &state.api_key) => next.run(request).await,
        Some(_) => {
            tracing::warn!("Invalid API key provided");
            reply(StatusCode::UNAUTHORIZED, SendDmResponse::error("Unauthorized"))
        }
        None => {
            tracing::warn!("Missing API key in request");
            reply(StatusCode::UNAUTHORIZED, SendDmResponse::error("Unauthorized"))
        }
    }
}

/// Case-insensitive comparison that does not stop at the first difference
fn keys_match(provided: &str, expected: &str) -> bool {
    let provided = provided.to_lowercase();
    let expected = expected.to_lowercase();
    if expected.is_empty() || provided.len() != expected.len() {
        return false;
    }
    provided
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

async fn send_dm_handler(
    State(state): State<AppState>,
    payload: Result<Json<SendDmRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(request) => request,
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            return reply(
                StatusCode::BAD_REQUEST,
                SendDmResponse::error(rejection.body_text()),
            );
        }
    };

    let discord_id = match request.discord_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            return reply(
                StatusCode::BAD_REQUEST,
                SendDmResponse::error("Missing discord_id parameter"),
            )
        }
    };
    if !is_account_id(&discord_id) {
        tracing::warn!("Rejected malformed Discord id {:?}", discord_id);
        return reply(
            StatusCode::BAD_REQUEST,
            SendDmResponse::error(INVALID_DISCORD_ID),
        );
    }

    let Some(message) = direct_message(&request) else {
        return reply(
            StatusCode::BAD_REQUEST,
            SendDmResponse::error("Missing message or embed_data parameter"),
        );
    };

    match state.discord.send_dm(&discord_id, &message).await {
        Ok(()) => {
            tracing::info!("Delivered DM to Discord user {}", discord_id);
            reply(StatusCode::OK, SendDmResponse::ok())
        }
        Err(e) => {
            tracing::error!("Error sending message to user {}: {}", discord_id, e);
            let (status, error) = error_response(&e);
            reply(status, SendDmResponse::error(error))
        }
    }
}

/// The embed is used when asked for, or when it is all there is
fn direct_message(request: &SendDmRequest) -> Option<DirectMessage> {
    let text = request.message.as_deref().filter(|m| !m.is_empty());
    match (&request.embed_data, text) {
        (Some(embed), _) if request.use_embed == Some(true) => Some(DirectMessage::embed(embed)),
        (Some(embed), None) => Some(DirectMessage::embed(embed)),
        (_, Some(text)) => Some(DirectMessage::Text(text.to_string())),
        (None, None) => None,
    }
}

fn error_response(error: &RelayError) -> (StatusCode, String) {
    match error {
        RelayError::Discord(discord) => {
            let (status, message) = discord.client_response();
            (
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message,
            )
        }
        other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
