//! API handlers for the Association Creative REST endpoints

pub mod auth;
pub mod donors;
pub mod equipment;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod patients;
pub mod users;
pub mod volunteers;
pub mod zakat;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, patch, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{error::AppError, models::{user::UserClaims, Page}, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token.trim(), &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// JSON body whose rejections use the error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path parameters; an id that does not parse reads as not found
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Success envelope
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Always true
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

/// Paginated list envelope
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub success: bool,
    /// Total number of matching records across all pages
    pub count: i64,
    pub data: Vec<T>,
    pub total_pages: i64,
    pub current_page: i64,
}

impl<T> From<Page<T>> for PaginatedResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            success: true,
            count: page.total,
            total_pages: page.total_pages(),
            current_page: page.page,
            data: page.items,
        }
    }
}

/// Envelope for operations without payload
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Resource routes, mounted both under `/api` and at the root
fn api_routes(state: AppState) -> Router {
    // Multipart framing on top of the file itself
    let upload_limit = state.config.uploads.max_file_size + 64 * 1024;

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/password", put(auth::change_password))
        // Loans
        .route("/loans", get(loans::list_loans).post(loans::create_loan))
        .route("/loans/bulk-status", patch(loans::bulk_update_status))
        .route("/loans/export", get(loans::export_loans))
        .route("/loans/stats", get(loans::loan_stats))
        .route(
            "/loans/:id",
            get(loans::get_loan).put(loans::update_loan).delete(loans::delete_loan),
        )
        .route("/loans/:id/return", put(loans::return_loan))
        .route("/loans/:id/cancel", patch(loans::cancel_loan))
        // Equipment
        .route("/equipment", get(equipment::list_equipment).post(equipment::create_equipment))
        .route("/equipment/available", get(equipment::list_available))
        .route(
            "/equipment/:id",
            get(equipment::get_equipment)
                .put(equipment::update_equipment)
                .delete(equipment::delete_equipment),
        )
        .route("/equipment/:id/loans", get(equipment::equipment_loans))
        .route(
            "/equipment/:id/maintenance",
            get(equipment::list_maintenance).post(equipment::add_maintenance),
        )
        // Patients
        .route("/patients", get(patients::list_patients).post(patients::create_patient))
        .route(
            "/patients/:id",
            get(patients::get_patient)
                .put(patients::update_patient)
                .delete(patients::delete_patient),
        )
        .route("/patients/:id/loans", get(patients::patient_loans))
        .route(
            "/patients/:id/files",
            post(patients::upload_file)
                .delete(patients::remove_file)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Donors
        .route("/donors", get(donors::list_donors).post(donors::create_donor))
        .route(
            "/donors/:id",
            get(donors::get_donor).put(donors::update_donor).delete(donors::delete_donor),
        )
        // Volunteers
        .route("/volunteers", get(volunteers::list_volunteers).post(volunteers::create_volunteer))
        .route(
            "/volunteers/:id",
            get(volunteers::get_volunteer)
                .put(volunteers::update_volunteer)
                .delete(volunteers::delete_volunteer),
        )
        // Zakat
        .route("/zakat", get(zakat::list_distributions).post(zakat::create_distribution))
        .route("/zakat/summary", get(zakat::summary))
        .route(
            "/zakat/:id",
            get(zakat::get_distribution)
                .put(zakat::update_distribution)
                .delete(zakat::delete_distribution),
        )
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .with_state(state)
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let uploads = ServeDir::new(&state.config.uploads.directory);
    let routes = api_routes(state);

    Router::new()
        .nest("/api", routes.clone())
        .merge(routes)
        .nest_service("/uploads", uploads)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageQuery;

    #[test]
    fn test_paginated_envelope_field_names() {
        let page = Page::new(vec![1, 2, 3], 23, &PageQuery::new(2, 3));
        let json = serde_json::to_value(PaginatedResponse::from(page)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["count"], 23);
        assert_eq!(json["totalPages"], 8);
        assert_eq!(json["currentPage"], 2);
        assert_eq!(json["data"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_message_is_omitted_when_absent() {
        let json = serde_json::to_value(ApiResponse::ok(5)).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "data": 5 }));

        let json = serde_json::to_value(ApiResponse::with_message(5, "Loan created")).unwrap();
        assert_eq!(json["message"], "Loan created");
    }
}
