use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use http::{Method, StatusCode};
use room_ai::{
    CredentialStore, LanguageModel, PlacementError, Settings, place_object, validate_api_key,
};
use room_core::{HistoryEntry, SceneObject, SceneStore, default_model_scale, keywords_by_asset};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub type SharedState = Arc<AppState>;

/// Everything one designer session needs behind the HTTP surface.
pub struct AppState {
    settings: Settings,
    client: Mutex<Box<dyn LanguageModel + Send>>,
    store: Mutex<SceneStore>,
    api_key: Mutex<Option<String>>,
    credentials: Arc<dyn CredentialStore>,
    busy: AtomicBool,
}

impl AppState {
    pub fn new(
        settings: Settings,
        client: Box<dyn LanguageModel + Send>,
        credentials: Arc<dyn CredentialStore>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            settings,
            client: Mutex::new(client),
            store: Mutex::new(SceneStore::new()),
            api_key: Mutex::new(api_key),
            credentials,
            busy: AtomicBool::new(false),
        }
    }

    fn replace_api_key(&self, key: &str) -> Result<(), ApiError> {
        let mut current = lock(&self.api_key);
        self.credentials
            .save(key)
            .map_err(|err| ApiError::internal(err.to_string()))?;
        *current = Some(key.to_string());
        Ok(())
    }

    fn forget_api_key(&self) {
        let mut current = lock(&self.api_key);
        *current = None;
        self.clear_stored_key();
    }

    /// Drops the key a failed request was made with. A key replaced while the
    /// request was in flight is kept.
    fn forget_api_key_if_current(&self, used: Option<&str>) -> bool {
        let mut current = lock(&self.api_key);
        if current.as_deref() != used {
            return false;
        }
        *current = None;
        self.clear_stored_key();
        true
    }

    fn clear_stored_key(&self) {
        if let Err(err) = self.credentials.clear() {
            warn!("failed to clear stored API key: {err}");
        }
    }
}

pub fn app(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/room", get(room).delete(clear_room))
        .route("/room/last", delete(remove_last))
        .route("/room/objects/{id}", delete(remove_object))
        .route("/prompt", post(submit_prompt))
        .route("/credential", put(set_credential).delete(clear_credential))
        .route("/catalog", get(catalog))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

#[derive(Debug, Deserialize)]
struct PromptRequest {
    prompt: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialRequest {
    api_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    has_api_key: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct RemovedResponse {
    object: SceneObject,
    entry: HistoryEntry,
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogAsset {
    path: String,
    scale: f64,
    keywords: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CatalogResponse {
    assets: Vec<CatalogAsset>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "bad_request",
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "not_found",
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message: message.into(),
        }
    }
}

impl From<PlacementError> for ApiError {
    fn from(value: PlacementError) -> Self {
        let status = match &value {
            PlacementError::Busy => StatusCode::CONFLICT,
            PlacementError::Credential(_) => StatusCode::UNAUTHORIZED,
            PlacementError::Transport { .. } if value.is_auth_expiry() => StatusCode::UNAUTHORIZED,
            PlacementError::Transport { .. } | PlacementError::EmptyResponse => {
                StatusCode::BAD_GATEWAY
            }
            PlacementError::Extraction | PlacementError::Parse(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        };
        Self {
            status,
            kind: value.kind(),
            message: value.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
                kind: self.kind,
            }),
        )
            .into_response()
    }
}

/// Holds the single in-flight placement slot until dropped.
struct BusyGuard {
    state: SharedState,
}

impl BusyGuard {
    fn acquire(state: &SharedState) -> Result<Self, PlacementError> {
        state
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PlacementError::Busy)?;
        Ok(Self {
            state: Arc::clone(state),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.state.busy.store(false, Ordering::Release);
    }
}

async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        has_api_key: lock(&state.api_key).is_some(),
    })
}

async fn room(State(state): State<SharedState>) -> Json<SceneStore> {
    Json(lock(&state.store).clone())
}

async fn submit_prompt(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<SceneObject>, ApiError> {
    let request: PromptRequest = parse_json(&body)?;
    let prompt = request.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(ApiError::bad_request("prompt must not be empty"));
    }

    let _busy = BusyGuard::acquire(&state)?;
    let api_key = lock(&state.api_key).clone();
    let used_key = api_key.clone();
    let existing = lock(&state.store).objects().to_vec();

    let worker = Arc::clone(&state);
    let text = prompt.clone();
    let start = Instant::now();
    let result = tokio::task::spawn_blocking(move || {
        let mut client = lock(&worker.client);
        place_object(
            &mut **client,
            api_key.as_deref(),
            &text,
            &existing,
            &worker.settings.normalizer,
        )
    })
    .await
    .map_err(|err| ApiError::internal(format!("placement task failed: {err}")))?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(object) => {
            info!(kind = %object.kind, elapsed_ms, "placement completed");
            lock(&state.store).append(object.clone(), prompt);
            Ok(Json(object))
        }
        Err(err) => {
            warn!(kind = err.kind(), elapsed_ms, "placement failed: {err}");
            if err.is_auth_expiry() && !state.forget_api_key_if_current(used_key.as_deref()) {
                info!("API key was replaced during the request; keeping the new one");
            }
            Err(err.into())
        }
    }
}

async fn remove_last(State(state): State<SharedState>) -> Result<Json<RemovedResponse>, ApiError> {
    let (object, entry) = lock(&state.store)
        .remove_last()
        .ok_or_else(|| ApiError::not_found("the room is empty"))?;
    Ok(Json(RemovedResponse { object, entry }))
}

async fn remove_object(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let (object, entry) = lock(&state.store)
        .remove_by_id(&id)
        .ok_or_else(|| ApiError::not_found(format!("no object with id {id}")))?;
    Ok(Json(RemovedResponse { object, entry }))
}

async fn clear_room(State(state): State<SharedState>) -> StatusCode {
    lock(&state.store).clear();
    StatusCode::NO_CONTENT
}

async fn set_credential(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let request: CredentialRequest = parse_json(&body)?;
    let key = validate_api_key(Some(&request.api_key)).map_err(|err| ApiError {
        status: StatusCode::BAD_REQUEST,
        kind: "credential",
        message: err.to_string(),
    })?;

    state.replace_api_key(key)?;
    info!("API key updated");
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_credential(State(state): State<SharedState>) -> StatusCode {
    state.forget_api_key();
    info!("API key cleared");
    StatusCode::NO_CONTENT
}

async fn catalog() -> Json<CatalogResponse> {
    let assets = keywords_by_asset()
        .into_iter()
        .map(|(path, keywords)| CatalogAsset {
            path: path.to_string(),
            scale: default_model_scale(path),
            keywords: keywords.into_iter().map(str::to_string).collect(),
        })
        .collect();
    Json(CatalogResponse { assets })
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("request body is required"));
    }

    serde_json::from_slice(body)
        .map_err(|err| ApiError::bad_request(format!("invalid JSON body: {err}")))
}
