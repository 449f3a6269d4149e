//! HTTP route handlers for the todolists server.
//!
//! This module provides the HTTP API endpoints:
//!
//! - `GET /` - Redirect to `/lists`
//! - `GET /lists` - All lists of the session, in display order
//! - `POST /lists` - Create a list
//! - `GET /lists/{list_id}` - One list with its items in display order
//! - `POST /lists/{list_id}` - Rename a list
//! - `POST /lists/{list_id}/delete` - Delete a list
//! - `POST /lists/{list_id}/complete_all` - Mark every item of a list completed
//! - `POST /lists/{list_id}/todos` - Add an item to a list
//! - `POST /lists/{list_id}/todos/{todo_id}/toggle` - Set an item's completion state
//! - `POST /lists/{list_id}/todos/{todo_id}/delete` - Delete an item
//! - `GET /health` - Health check endpoint
//!
//! # Sessions
//!
//! Every route except `/health` runs behind [`session_middleware`]. A client
//! that presents a live token in the `X-Session-Token` header keeps using
//! that session; any other request starts a new, empty one. The token in use
//! is always echoed back in the `X-Session-Token` response header.
//!
//! # Example
//!
//! ```rust,no_run
//! use todolists_server::config::Config;
//! use todolists_server::routes::{create_router, AppState};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("failed to load config");
//!     let state = AppState::new(config);
//!     let app = create_router(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5003").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::ordering::{
    find_item_by_id_mut, find_list_by_id, find_list_by_id_mut, is_list_complete,
    mark_all_complete, sort_for_display, validate_item_title, validate_list_title,
};
use crate::session::SessionStore;
use crate::types::{Item, ListDetail, ListSummary, TodoList};

// ============================================================================
// Constants
// ============================================================================

/// Header carrying the session token in both directions.
pub const HEADER_SESSION_TOKEN: &str = "x-session-token";

/// Maximum request body size (16 KiB).
const MAX_BODY_SIZE: usize = 16 * 1024;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<Config>,

    /// Per-client list storage.
    pub sessions: SessionStore,

    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Creates application state with a session store sized from `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let sessions = SessionStore::new(config.session_store_config());
        Self::with_sessions(config, sessions)
    }

    /// Creates application state around an existing session store.
    #[must_use]
    pub fn with_sessions(config: Config, sessions: SessionStore) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
            start_time: Instant::now(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("sessions", &self.sessions)
            .field("start_time", &self.start_time)
            .finish()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Creates the application router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/", get(index))
        .route("/lists", get(get_lists).post(create_list))
        .route("/lists/{list_id}", get(show_list).post(update_list_title))
        .route("/lists/{list_id}/delete", post(delete_list))
        .route("/lists/{list_id}/complete_all", post(complete_all))
        .route("/lists/{list_id}/todos", post(create_todo))
        .route("/lists/{list_id}/todos/{todo_id}/toggle", post(toggle_todo))
        .route("/lists/{list_id}/todos/{todo_id}/delete", post(delete_todo))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    Router::new()
        .merge(session_routes)
        .route("/health", get(get_health))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Session binding
// ============================================================================

/// Token of the session the current request operates on.
///
/// Inserted into request extensions by [`session_middleware`].
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

/// Resolves the request's session, creating one if needed.
///
/// Responds `503` without calling the handler when a new session is needed
/// but the store is full.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(HEADER_SESSION_TOKEN)
        .and_then(|v| v.to_str().ok())
        .filter(|token| state.sessions.touch(token))
        .map(str::to_owned);

    let token = match presented {
        Some(token) => token,
        None => match state.sessions.create_session() {
            Ok(token) => {
                debug!(session_count = state.sessions.len(), "Started new session");
                token
            }
            Err(err) => return ServerError::from(err).into_response(),
        },
    };

    request.extensions_mut().insert(SessionToken(token.clone()));
    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&token) {
        response.headers_mut().insert(HEADER_SESSION_TOKEN, value);
    }

    response
}

// ============================================================================
// Guards
// ============================================================================

/// Looks up a list for mutation, failing with `404` when absent.
pub fn require_list<'a>(lists: &'a mut [TodoList], list_id: &str) -> Result<&'a mut TodoList> {
    find_list_by_id_mut(list_id, lists).ok_or_else(ServerError::list_not_found)
}

/// Looks up an item of `list` for mutation, failing with `404` when absent.
pub fn require_item<'a>(list: &'a mut TodoList, item_id: &str) -> Result<&'a mut Item> {
    find_item_by_id_mut(item_id, &mut list.items).ok_or_else(ServerError::item_not_found)
}

// ============================================================================
// Request / Response Types
// ============================================================================

/// Body of list create/rename and item create requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleRequest {
    pub title: String,
}

/// Body of an item toggle request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub completed: bool,
}

/// Response body of `GET /lists`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListsResponse {
    pub lists: Vec<ListSummary>,
}

/// Response body of every mutating endpoint.
///
/// `message` is the notification to show the user.
#[derive(Debug, Serialize, Deserialize)]
pub struct MutationResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
}

impl MutationResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            list: None,
            item: None,
        }
    }

    fn with_list(mut self, list: ListDetail) -> Self {
        self.list = Some(list);
        self
    }

    fn with_item(mut self, item: Item) -> Self {
        self.item = Some(item);
        self
    }
}

// ============================================================================
// Lists
// ============================================================================

async fn index() -> Redirect {
    Redirect::to("/lists")
}

/// GET /lists - All lists, incomplete first, each group by title.
async fn get_lists(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<Json<ListsResponse>> {
    let lists: Vec<ListSummary> = state.sessions.with_lists(&token, |lists| {
        sort_for_display(lists, is_list_complete)
            .into_iter()
            .map(ListSummary::from)
            .collect()
    })?;

    Ok(Json(ListsResponse { lists }))
}

/// POST /lists - Create a list.
///
/// # Responses
///
/// - `201 Created` - List created
/// - `422 Unprocessable Entity` - Title is a duplicate or has an invalid length
async fn create_list(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    Json(body): Json<TitleRequest>,
) -> Result<(StatusCode, Json<MutationResponse>)> {
    let title = body.title.trim();

    let list = state.sessions.with_lists(&token, |lists| {
        validate_list_title(title, lists.iter())
            .map_err(|err| ServerError::validation(err, title))?;

        let list = TodoList::new(title);
        let detail = ListDetail::from(&list);
        lists.push(list);
        Ok::<_, ServerError>(detail)
    })??;

    info!(list_id = %list.id, "List created");

    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::new("The list has been created.").with_list(list)),
    ))
}

/// GET /lists/{list_id} - One list with items in display order.
async fn show_list(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    Path(list_id): Path<String>,
) -> Result<Json<ListDetail>> {
    let detail = state.sessions.with_lists(&token, |lists| {
        find_list_by_id(&list_id, lists)
            .map(ListDetail::from)
            .ok_or_else(ServerError::list_not_found)
    })??;

    Ok(Json(detail))
}

/// POST /lists/{list_id} - Rename a list.
///
/// The new title must not match any *other* list's title.
async fn update_list_title(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    Path(list_id): Path<String>,
    Json(body): Json<TitleRequest>,
) -> Result<Json<MutationResponse>> {
    let title = body.title.trim();

    let detail = state.sessions.with_lists(&token, |lists| {
        require_list(lists, &list_id)?;

        validate_list_title(title, lists.iter().filter(|list| list.id != list_id))
            .map_err(|err| ServerError::validation(err, title))?;

        let list = require_list(lists, &list_id)?;
        list.title = title.to_string();
        Ok::<_, ServerError>(ListDetail::from(&*list))
    })??;

    info!(list_id = %list_id, "List renamed");

    Ok(Json(
        MutationResponse::new("The title of the list has been updated.").with_list(detail),
    ))
}

/// POST /lists/{list_id}/delete - Delete a list and all its items.
async fn delete_list(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    Path(list_id): Path<String>,
) -> Result<Json<MutationResponse>> {
    let removed = state.sessions.with_lists(&token, |lists| {
        let index = lists
            .iter()
            .position(|list| list.id == list_id)
            .ok_or_else(ServerError::list_not_found)?;
        Ok::<_, ServerError>(lists.remove(index))
    })??;

    info!(
        list_id = %list_id,
        item_count = removed.items.len(),
        "List deleted"
    );

    Ok(Json(MutationResponse::new("The list has been deleted.")))
}

/// POST /lists/{list_id}/complete_all - Mark every item completed.
async fn complete_all(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    Path(list_id): Path<String>,
) -> Result<Json<MutationResponse>> {
    let (changed, detail) = state.sessions.with_lists(&token, |lists| {
        let list = require_list(lists, &list_id)?;
        let changed = mark_all_complete(list);
        Ok::<_, ServerError>((changed, ListDetail::from(&*list)))
    })??;

    info!(list_id = %list_id, changed = changed, "List items marked completed");

    Ok(Json(
        MutationResponse::new("The list items have all been marked completed.")
            .with_list(detail),
    ))
}

// ============================================================================
// Items
// ============================================================================

/// POST /lists/{list_id}/todos - Add an item.
///
/// # Responses
///
/// - `201 Created` - Item created
/// - `404 Not Found` - Unknown list
/// - `422 Unprocessable Entity` - Title has an invalid length
async fn create_todo(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    Path(list_id): Path<String>,
    Json(body): Json<TitleRequest>,
) -> Result<(StatusCode, Json<MutationResponse>)> {
    let title = body.title.trim();

    let item = state.sessions.with_lists(&token, |lists| {
        let list = require_list(lists, &list_id)?;
        validate_item_title(title).map_err(|err| ServerError::validation(err, title))?;

        let item = Item::new(title);
        list.items.push(item.clone());
        Ok::<_, ServerError>(item)
    })??;

    info!(list_id = %list_id, item_id = %item.id, "List item created");

    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::new("The list item has been created.").with_item(item)),
    ))
}

/// POST /lists/{list_id}/todos/{todo_id}/toggle - Set an item's completion state.
async fn toggle_todo(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    Path((list_id, todo_id)): Path<(String, String)>,
    Json(body): Json<ToggleRequest>,
) -> Result<Json<MutationResponse>> {
    let item = state.sessions.with_lists(&token, |lists| {
        let list = require_list(lists, &list_id)?;
        let item = require_item(list, &todo_id)?;
        item.completed = body.completed;
        Ok::<_, ServerError>(item.clone())
    })??;

    info!(
        list_id = %list_id,
        item_id = %todo_id,
        completed = item.completed,
        "List item toggled"
    );

    Ok(Json(
        MutationResponse::new("The list item has been toggled.").with_item(item),
    ))
}

/// POST /lists/{list_id}/todos/{todo_id}/delete - Delete an item.
async fn delete_todo(
    State(state): State<AppState>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    Path((list_id, todo_id)): Path<(String, String)>,
) -> Result<Json<MutationResponse>> {
    state.sessions.with_lists(&token, |lists| {
        let list = require_list(lists, &list_id)?;
        let index = list
            .items
            .iter()
            .position(|item| item.id == todo_id)
            .ok_or_else(ServerError::item_not_found)?;
        list.items.remove(index);
        Ok::<_, ServerError>(())
    })??;

    info!(list_id = %list_id, item_id = %todo_id, "List item deleted");

    Ok(Json(MutationResponse::new("The list item has been deleted.")))
}

// ============================================================================
// GET /health - Health Check
// ============================================================================

/// Response body for health check endpoint.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Server status (always "ok" if responding).
    pub status: String,

    /// Number of sessions currently stored.
    pub sessions: usize,

    /// Server uptime in seconds.
    pub uptime_seconds: u64,
}

/// GET /health - Health check endpoint.
///
/// Does not create a session.
async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        sessions: state.sessions.len(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

// ============================================================================
// Tests
// ============================================================================
