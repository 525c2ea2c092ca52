//! Thin HTTP surface over the store, classifier and drafter
//!
//! Handlers only translate between HTTP and the components; no business
//! logic lives here.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::classifier::RelevanceClassifier;
use crate::client::MailClient;
use crate::drafter::DraftGenerator;
use crate::error::{MailError, Result};
use crate::models::Message;
use crate::pipeline::IngestionPipeline;
use crate::store::Store;

/// How many stored rows the free-text filter prompt sees at most.
const FILTER_CONTEXT_ROWS: i64 = 100;

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<Store>,
    pub client: Arc<dyn MailClient>,
    pub pipeline: Arc<IngestionPipeline>,
    pub classifier: Arc<RelevanceClassifier>,
    pub drafter: Arc<DraftGenerator>,
    /// Batch bound handed to background sync runs
    pub sync_max_results: usize,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/sync", post(trigger_sync))
        .route("/api/emails", get(list_emails))
        .route("/api/emails/{id}", get(email_detail))
        .route(
            "/api/attachments/{message_id}/{attachment_id}",
            get(attachment_bytes),
        )
        .route("/api/generate", post(generate_draft))
        .route("/api/filter", post(filter_emails))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve the API until the process is stopped.
pub async fn serve(state: ApiState, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("API listening on {}", bind);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

struct ApiError(MailError);

impl From<MailError> for ApiError {
    fn from(error: MailError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MailError::MessageNotFound(_) => StatusCode::NOT_FOUND,
            MailError::BadRequest(_) | MailError::InvalidMessageFormat(_) => {
                StatusCode::BAD_REQUEST
            }
            MailError::AuthError(_) | MailError::Forbidden(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.0.to_string()).into_response()
    }
}

#[derive(Debug, Serialize)]
struct SyncTriggered {
    status: &'static str,
}

async fn trigger_sync(State(state): State<ApiState>) -> Json<SyncTriggered> {
    let pipeline = Arc::clone(&state.pipeline);
    let max_results = state.sync_max_results;

    // Fire-and-forget; the run reports itself through the logs
    tokio::spawn(async move {
        match pipeline.run(max_results).await {
            Ok(summary) => info!(
                attempted = summary.attempted,
                succeeded = summary.succeeded,
                total_in_store = summary.total_in_store,
                "background sync complete"
            ),
            Err(e) => error!("background sync failed: {}", e),
        }
    });

    Json(SyncTriggered {
        status: "sync started in background",
    })
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
    #[serde(default = "default_is_job")]
    is_job: bool,
}

fn default_limit() -> i64 {
    50
}

fn default_is_job() -> bool {
    true
}

async fn list_emails(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> std::result::Result<Json<Vec<Message>>, ApiError> {
    let messages = state
        .store
        .list(query.limit, query.offset, Some(query.is_job))
        .await?;
    Ok(Json(messages))
}

#[derive(Debug, Serialize)]
struct EmailDetail {
    email: Message,
    thread: Vec<Message>,
}

async fn email_detail(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<EmailDetail>, ApiError> {
    let email = state
        .store
        .get_by_id(&id)
        .await?
        .ok_or_else(|| MailError::MessageNotFound(id.clone()))?;

    let thread = state.store.get_thread(&email.thread_id).await?;
    Ok(Json(EmailDetail { email, thread }))
}

async fn attachment_bytes(
    State(state): State<ApiState>,
    Path((message_id, attachment_id)): Path<(String, String)>,
) -> std::result::Result<Response, ApiError> {
    let bytes = state
        .client
        .get_attachment(&message_id, &attachment_id)
        .await?
        .ok_or_else(|| MailError::MessageNotFound(attachment_id.clone()))?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    email_id: String,
    context: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    draft: String,
}

async fn generate_draft(
    State(state): State<ApiState>,
    Json(request): Json<GenerateRequest>,
) -> std::result::Result<Json<GenerateResponse>, ApiError> {
    let email = state
        .store
        .get_by_id(&request.email_id)
        .await?
        .ok_or_else(|| MailError::MessageNotFound(request.email_id.clone()))?;

    let draft = state
        .drafter
        .generate_follow_up(&email, &request.context)
        .await?;
    Ok(Json(GenerateResponse { draft }))
}

#[derive(Debug, Deserialize)]
struct FilterRequest {
    prompt: String,
}

#[derive(Debug, Serialize)]
struct FilterResponse {
    matching_ids: Vec<String>,
}

async fn filter_emails(
    State(state): State<ApiState>,
    Json(request): Json<FilterRequest>,
) -> std::result::Result<Json<FilterResponse>, ApiError> {
    let summaries = state.store.summaries(FILTER_CONTEXT_ROWS).await?;
    let matching_ids = state
        .classifier
        .filter_messages(&summaries, &request.prompt)
        .await;
    Ok(Json(FilterResponse { matching_ids }))
}
