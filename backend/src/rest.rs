use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use shared::{
    CheckEmailRequest, CheckEmailResponse, CreateQuotationResponse, LoginRequest, MessageResponse,
    QuotationPayload, RegisterRequest,
};
use tracing::info;

use crate::domain::{DomainError, EmployeeService, QuotationService};

/// Application state containing the QuotationService and EmployeeService
#[derive(Clone)]
pub struct AppState {
    pub quotation_service: QuotationService,
    pub employee_service: EmployeeService,
}

impl AppState {
    pub fn new(quotation_service: QuotationService, employee_service: EmployeeService) -> Self {
        Self {
            quotation_service,
            employee_service,
        }
    }
}

/// Build the application router. Route paths match the original service's
/// public contract.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_quotations))
        .route("/pdf/:id", get(get_quotation))
        .route("/create", post(create_quotation))
        .route("/edit/:id", put(update_quotation))
        .route("/delete/:id", delete(delete_quotation))
        .route("/register", post(register))
        .route("/check-email", post(check_email))
        .route("/login", post(login))
        .with_state(state)
}

fn error_response(error: DomainError) -> axum::response::Response {
    let status = match &error {
        DomainError::QuotationNotFound => StatusCode::NOT_FOUND,
        DomainError::EmailTaken => StatusCode::CONFLICT,
        DomainError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        DomainError::Storage(e) => {
            tracing::error!("Storage error: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse { message: "Error inside server".to_string() }),
            )
                .into_response();
        }
    };
    (status, Json(MessageResponse { message: error.to_string() })).into_response()
}

/// Axum handler for GET /
async fn list_quotations(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /");

    match state.quotation_service.list_quotations().await {
        Ok(aggregates) => (StatusCode::OK, Json(aggregates)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler for GET /pdf/:id
async fn get_quotation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    info!("GET /pdf/{}", id);

    match state.quotation_service.get_quotation(id).await {
        Ok(aggregate) => (StatusCode::OK, Json(aggregate)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler for POST /create
async fn create_quotation(
    State(state): State<AppState>,
    Json(payload): Json<QuotationPayload>,
) -> impl IntoResponse {
    info!("POST /create - {} installments", payload.installments.len());

    match state.quotation_service.create_quotation(payload).await {
        Ok(id) => (StatusCode::CREATED, Json(CreateQuotationResponse { id })).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler for PUT /edit/:id
async fn update_quotation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<QuotationPayload>,
) -> impl IntoResponse {
    info!("PUT /edit/{} - {} installments", id, payload.installments.len());

    match state.quotation_service.update_quotation(id, payload).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Quotation and installments updated successfully".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler for DELETE /delete/:id
async fn delete_quotation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    info!("DELETE /delete/{}", id);

    match state.quotation_service.delete_quotation(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse {
                message: "Quotation and installments deleted successfully".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler for POST /register
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> impl IntoResponse {
    info!("POST /register - {}", request.email);

    match state.employee_service.register(request).await {
        Ok(profile) => (StatusCode::CREATED, Json(profile)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler for POST /check-email
async fn check_email(
    State(state): State<AppState>,
    Json(request): Json<CheckEmailRequest>,
) -> impl IntoResponse {
    info!("POST /check-email - {}", request.email);

    match state.employee_service.email_exists(&request.email).await {
        Ok(exists) => (StatusCode::OK, Json(CheckEmailResponse { exists })).into_response(),
        Err(e) => error_response(e),
    }
}

/// Axum handler for POST /login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    info!("POST /login - {}", request.email);

    match state.employee_service.login(&request.email, &request.password).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => error_response(e),
    }
}
