//! axum routes for the page and the JSON endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::api_connection::ChatProvider;
use crate::config::ModelSettings;
use crate::feast::{FeastRequest, RecipeCard};
use crate::page::render_page;
use crate::recipe_generator::Recipe;
use crate::recipe_ranker::RankedRecipe;
use crate::session::{drive, lock_session, Session, SessionError};

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn ChatProvider>,
    pub settings: Arc<ModelSettings>,
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn new(provider: Arc<dyn ChatProvider>, settings: ModelSettings) -> Self {
        Self {
            provider,
            settings: Arc::new(settings),
            session: Arc::new(Mutex::new(Session::new())),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeastResponse {
    pub recipes: Vec<Recipe>,
    pub rankings: Vec<RankedRecipe>,
    pub cards: Vec<RecipeCard>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/generate", post(generate_from_form))
        .route("/api/recipes", post(generate_from_json))
        .route("/health", get(health))
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&lock_session(&state.session)))
}

async fn health() -> &'static str {
    "ok"
}

/// Builds a request from urlencoded fields; `dietary` and `cuisine` may repeat.
pub fn feast_request_from_form(fields: Vec<(String, String)>) -> FeastRequest {
    let mut request = FeastRequest::default();
    for (key, value) in fields {
        match key.as_str() {
            "ingredients" => request.ingredients = value,
            "dietary" => request.dietary_restrictions.push(value),
            "cuisine" => request.cuisine_preferences.push(value),
            _ => {}
        }
    }
    request
}

async fn generate_from_form(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let request = feast_request_from_form(fields);
    match drive(
        &state.session,
        state.provider.as_ref(),
        &state.settings,
        request,
    )
    .await
    {
        Err(SessionError::Busy) => {
            let html = render_page(&lock_session(&state.session));
            (StatusCode::CONFLICT, Html(html)).into_response()
        }
        // Failures are recorded in the session and shown on the page.
        Ok(_) | Err(SessionError::Flow(_)) => Redirect::to("/").into_response(),
    }
}

async fn generate_from_json(
    State(state): State<AppState>,
    Json(request): Json<FeastRequest>,
) -> Response {
    match drive(
        &state.session,
        state.provider.as_ref(),
        &state.settings,
        request,
    )
    .await
    {
        Ok(outcome) => {
            let cards = outcome.cards();
            Json(FeastResponse {
                recipes: outcome.recipes,
                rankings: outcome.rankings,
                cards,
            })
            .into_response()
        }
        Err(err @ SessionError::Busy) => {
            (StatusCode::CONFLICT, Json(json!({ "error": err.to_string() }))).into_response()
        }
        Err(err @ SessionError::Flow(_)) => {
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": err.to_string() }))).into_response()
        }
    }
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "Fridge Feast listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_form_fields_collect_preferences() {
        let request = feast_request_from_form(vec![
            ("ingredients".to_string(), "eggs, milk".to_string()),
            ("dietary".to_string(), "vegan".to_string()),
            ("cuisine".to_string(), "Italian".to_string()),
            ("cuisine".to_string(), "Mexican".to_string()),
            ("unknown".to_string(), "ignored".to_string()),
        ]);
        assert_eq!(request.ingredients, "eggs, milk");
        assert_eq!(request.dietary_restrictions, vec!["vegan"]);
        assert_eq!(request.cuisine_preferences, vec!["Italian", "Mexican"]);
    }
}
