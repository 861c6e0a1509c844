//! REST endpoints for the onboarding wizard, the admin panel, and the data page.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::error;

use super::layout::PageLayout;
use super::manager::OnboardingManager;
use super::model::{ComponentInfo, ComponentKind, Page, ProfileForm};
use super::state::{OnboardingSession, OnboardingStep};
use crate::error::{LayoutError, OnboardingError};

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub manager: Arc<OnboardingManager>,
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: OnboardingRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/onboarding/config", get(get_config))
        .route("/api/onboarding/start", post(start))
        .route("/api/onboarding/resume", get(resume))
        .route("/api/onboarding/{user_id}/step", post(submit_step))
        .route("/api/onboarding/{user_id}/back", post(go_back))
        .route("/api/users", get(list_users))
        .route("/api/admin/config", get(admin_config).put(save_config))
        .route("/api/admin/config/move", post(move_component))
        .route("/api/admin/config/add", post(add_component))
        .route("/api/admin/config/remove", post(remove_component))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Responses ───────────────────────────────────────────────────────────

/// A short message the front end shows as a toast.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    session: OnboardingSession,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<Notice>,
}

#[derive(Debug, Serialize)]
struct LayoutResponse {
    layout: PageLayout,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<Notice>,
}

/// Error body: `{"error": title, "description": message, "fields"?: {...}}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    title: &'static str,
    description: String,
    fields: Option<BTreeMap<String, String>>,
}

impl ApiError {
    fn new(status: StatusCode, title: &'static str, description: impl Into<String>) -> Self {
        Self {
            status,
            title,
            description: description.into(),
            fields: None,
        }
    }

    /// Replace the generic 500 description with a context-specific one.
    fn on_failure(mut self, description: &str) -> Self {
        if self.status == StatusCode::INTERNAL_SERVER_ERROR {
            self.description = description.to_string();
        }
        self
    }
}

impl From<OnboardingError> for ApiError {
    fn from(err: OnboardingError) -> Self {
        match err {
            OnboardingError::Validation { fields } => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                title: "Please correct the highlighted fields",
                description: fields
                    .values()
                    .next()
                    .cloned()
                    .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
                fields: Some(fields),
            },
            OnboardingError::UnknownUser(_) => {
                Self::new(StatusCode::NOT_FOUND, "Not found", err.to_string())
            }
            OnboardingError::AlreadyCompleted | OnboardingError::InvalidStep { .. } => {
                Self::new(StatusCode::CONFLICT, "Error", err.to_string())
            }
            OnboardingError::Layout(layout) => layout.into(),
            OnboardingError::Hashing(_) | OnboardingError::Database(_) => {
                error!(error = %err, "Onboarding request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Error", GENERIC_FAILURE)
            }
        }
    }
}

impl From<LayoutError> for ApiError {
    fn from(err: LayoutError) -> Self {
        let title = match err {
            LayoutError::WouldEmptyPage { .. } => "Cannot remove component",
            _ => "Invalid configuration",
        };
        Self::new(StatusCode::BAD_REQUEST, title, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "error": self.title,
            "description": self.description,
        });
        if let Some(fields) = self.fields {
            body["fields"] = serde_json::json!(fields);
        }
        (self.status, Json(body)).into_response()
    }
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "onboarding-wizard"
    }))
}

// ── Wizard ──────────────────────────────────────────────────────────────

/// GET /api/onboarding/config
async fn get_config(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    Json(state.manager.load_layout().await)
}

#[derive(Debug, Deserialize)]
struct StartRequest {
    email: String,
    password: SecretString,
}

/// POST /api/onboarding/start
async fn start(
    State(state): State<OnboardingRouteState>,
    Json(req): Json<StartRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .manager
        .start(&req.email, &req.password)
        .await
        .map_err(|e| {
            ApiError::from(e).on_failure("Failed to create account. Please try again.")
        })?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(SessionResponse {
            session: outcome.session,
            notice: None,
        }),
    ))
}

#[derive(Debug, Deserialize)]
struct ResumeQuery {
    email: String,
}

/// GET /api/onboarding/resume?email=
async fn resume(
    State(state): State<OnboardingRouteState>,
    Query(query): Query<ResumeQuery>,
) -> Result<Json<SessionResponse>, ApiError> {
    match state.manager.resume(&query.email).await? {
        Some(session) => Ok(Json(SessionResponse {
            session,
            notice: Some(Notice {
                title: "Welcome back!",
                description: "We've restored your progress.",
            }),
        })),
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "Not found",
            "No onboarding in progress for this email",
        )),
    }
}

#[derive(Debug, Deserialize)]
struct StepRequest {
    step: OnboardingStep,
    #[serde(flatten)]
    form: ProfileForm,
}

/// POST /api/onboarding/{user_id}/step
async fn submit_step(
    State(state): State<OnboardingRouteState>,
    Path(user_id): Path<String>,
    Json(req): Json<StepRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let today = Utc::now().date_naive();
    let session = state
        .manager
        .submit_step(&user_id, req.step, &req.form, today)
        .await?;
    let notice = session.completed.then_some(Notice {
        title: "Welcome!",
        description: "Your onboarding has been completed successfully.",
    });
    Ok(Json(SessionResponse { session, notice }))
}

/// POST /api/onboarding/{user_id}/back
async fn go_back(
    State(state): State<OnboardingRouteState>,
    Path(user_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.manager.go_back(&user_id).await?;
    Ok(Json(SessionResponse {
        session,
        notice: None,
    }))
}

// ── Data page ───────────────────────────────────────────────────────────

/// GET /api/users
async fn list_users(State(state): State<OnboardingRouteState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.manager.list_users().await?;
    Ok(Json(users))
}

// ── Admin ───────────────────────────────────────────────────────────────

/// GET /api/admin/config
///
/// The layout plus the components not placed on any page, and display
/// metadata for every component.
async fn admin_config(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    let layout = state.manager.load_layout().await;
    let components: Vec<ComponentInfo> = ComponentKind::ALL.iter().copied().map(Into::into).collect();
    Json(serde_json::json!({
        "unassigned": layout.unassigned(),
        "layout": layout,
        "components": components,
    }))
}

/// PUT /api/admin/config
async fn save_config(
    State(state): State<OnboardingRouteState>,
    Json(layout): Json<PageLayout>,
) -> Result<Json<LayoutResponse>, ApiError> {
    state
        .manager
        .save_layout(&layout)
        .await
        .map_err(|e| ApiError::from(e).on_failure("Failed to save configuration. Please try again."))?;
    Ok(saved(layout))
}

#[derive(Debug, Deserialize)]
struct MoveRequest {
    component: ComponentKind,
    from: Page,
    to: Page,
}

#[derive(Debug, Deserialize)]
struct PlacementRequest {
    component: ComponentKind,
    page: Page,
}

/// POST /api/admin/config/move
async fn move_component(
    State(state): State<OnboardingRouteState>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<LayoutResponse>, ApiError> {
    let layout = state
        .manager
        .edit_layout(|l| l.move_component(req.component, req.from, req.to))
        .await
        .map_err(|e| ApiError::from(e).on_failure("Failed to save configuration. Please try again."))?;
    Ok(saved(layout))
}

/// POST /api/admin/config/add
async fn add_component(
    State(state): State<OnboardingRouteState>,
    Json(req): Json<PlacementRequest>,
) -> Result<Json<LayoutResponse>, ApiError> {
    let layout = state
        .manager
        .edit_layout(|l| l.add_component(req.component, req.page))
        .await
        .map_err(|e| ApiError::from(e).on_failure("Failed to save configuration. Please try again."))?;
    Ok(saved(layout))
}

/// POST /api/admin/config/remove
async fn remove_component(
    State(state): State<OnboardingRouteState>,
    Json(req): Json<PlacementRequest>,
) -> Result<Json<LayoutResponse>, ApiError> {
    let layout = state
        .manager
        .edit_layout(|l| l.remove_component(req.component, req.page))
        .await
        .map_err(|e| ApiError::from(e).on_failure("Failed to save configuration. Please try again."))?;
    Ok(saved(layout))
}

fn saved(layout: PageLayout) -> Json<LayoutResponse> {
    Json(LayoutResponse {
        layout,
        notice: Some(Notice {
            title: "Configuration saved",
            description: "Onboarding flow has been updated successfully.",
        }),
    })
}
