use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use infinity_todo::model::{ReorderIntent, Task};
use infinity_todo::{ops, settings, Store};
use log::{info, warn};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::dto::{
    settings_text, CreateTodoRequest, DeletedResponse, PatchTodoRequest, ReorderRequest,
    SettingsRequest, StatusRequest, SuccessResponse, UpdatedResponse,
};
use crate::error::ApiError;

/// Shared handle to the one store the server owns. Requests take turns on
/// the mutex, which keeps the single-writer model of the store.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<Store>>,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, Store>, ApiError> {
        self.store.lock().map_err(|_| ApiError::StoreUnavailable)
    }

    /// Recover the store once every other handle is gone.
    pub fn into_store(self) -> Option<Store> {
        Arc::try_unwrap(self.store).ok()?.into_inner().ok()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/reorder", put(reorder_todos))
        .route("/api/todos/{id}", put(patch_todo).delete(delete_todo))
        .route("/api/todos/{id}/status-recursive", put(set_status_recursive))
        .route("/api/settings", get(get_settings).post(save_settings))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API on `listener` until `shutdown` resolves, then close the
/// store.
pub async fn serve<F>(listener: TcpListener, store: Store, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = AppState::new(store);
    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(shutdown)
        .await
        .context("server failed")?;

    match state.into_store() {
        Some(store) => {
            store.close().context("failed to close database")?;
            info!("database closed");
        }
        None => warn!("database still in use after shutdown; dropping it instead"),
    }
    Ok(())
}

async fn list_todos(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    let store = state.store()?;
    Ok(Json(ops::list_tasks(store.conn())?))
}

async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Json(req) = payload?;
    let store = state.store()?;
    let task = ops::create_task(store.conn(), &req.into())?;
    Ok(Json(task))
}

async fn patch_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<PatchTodoRequest>, JsonRejection>,
) -> Result<Json<UpdatedResponse>, ApiError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let store = state.store()?;
    let updated = ops::patch_task(store.conn(), id, &req.into())?;
    Ok(Json(UpdatedResponse { updated }))
}

async fn set_status_recursive(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<UpdatedResponse>, ApiError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let store = state.store()?;
    let updated = ops::set_completed_recursive(store.conn(), id, req.completed)?;
    Ok(Json(UpdatedResponse { updated }))
}

async fn reorder_todos(
    State(state): State<AppState>,
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(req) = payload?;
    let intents: Vec<ReorderIntent> = req.updates.iter().map(ReorderIntent::from).collect();
    let store = state.store()?;
    ops::reorder_tasks(store.conn(), &intents)?;
    Ok(Json(SuccessResponse::ok()))
}

async fn delete_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let Path(id) = id?;
    let store = state.store()?;
    let deleted = ops::delete_task(store.conn(), id)?;
    Ok(Json(DeletedResponse { deleted }))
}

async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    let store = state.store()?;
    Ok(Json(settings::get_all(store.conn())?))
}

async fn save_settings(
    State(state): State<AppState>,
    payload: Result<Json<SettingsRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(req) = payload?;
    let store = state.store()?;
    settings::set_many(store.conn(), &settings_text(&req))?;
    Ok(Json(SuccessResponse::ok()))
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
