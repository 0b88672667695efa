//! Loan management endpoints

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppResult,
    models::loan::{
        BulkStatusResult, BulkStatusUpdate, CancelLoan, CreateLoan, LoanDetails, LoanQuery,
        LoanStats, ReturnLoan, UpdateLoan,
    },
    AppState,
};

use super::{
    ApiJson, ApiPath, ApiQuery, ApiResponse, AuthenticatedUser, MessageResponse, PaginatedResponse,
};

/// List loans with search, filters and pagination
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "Loans", body = PaginatedResponse<LoanDetails>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiQuery(query): ApiQuery<LoanQuery>,
) -> AppResult<Json<PaginatedResponse<LoanDetails>>> {
    claims.require_read()?;

    let page = state.services.loans.list_loans(&query).await?;
    Ok(Json(page.into()))
}

/// Get loan details
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan details", body = LoanDetails),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<ApiResponse<LoanDetails>>> {
    claims.require_read()?;

    let loan = state.services.loans.get_loan(id).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

/// Lend an equipment item to a patient
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = LoanDetails),
        (status = 400, description = "Invalid dates or input", body = crate::error::ErrorResponse),
        (status = 404, description = "Patient or equipment not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Equipment not available", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiJson(request): ApiJson<CreateLoan>,
) -> AppResult<(StatusCode, Json<ApiResponse<LoanDetails>>)> {
    claims.require_write()?;
    request.validate()?;

    let loan = state.services.loans.create_loan(request, claims.user_id).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::with_message(loan, "Loan created"))))
}

/// Edit the expected return date or notes of an open loan
#[utoipa::path(
    put,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = UpdateLoan,
    responses(
        (status = 200, description = "Loan updated", body = LoanDetails),
        (status = 400, description = "Invalid dates", body = crate::error::ErrorResponse),
        (status = 422, description = "Loan is closed", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateLoan>,
) -> AppResult<Json<ApiResponse<LoanDetails>>> {
    claims.require_write()?;
    request.validate()?;

    let loan = state.services.loans.update_loan(id, request).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

/// Return a borrowed equipment item
#[utoipa::path(
    put,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = ReturnLoan,
    responses(
        (status = 200, description = "Loan completed", body = LoanDetails),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Loan is not active", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<ReturnLoan>,
) -> AppResult<Json<ApiResponse<LoanDetails>>> {
    claims.require_write()?;
    request.validate()?;

    let loan = state.services.loans.return_loan(id, request, claims.user_id).await?;
    Ok(Json(ApiResponse::with_message(loan, "Equipment returned")))
}

/// Cancel an active loan
#[utoipa::path(
    patch,
    path = "/loans/{id}/cancel",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = CancelLoan,
    responses(
        (status = 200, description = "Loan cancelled", body = LoanDetails),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Loan is not active", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<CancelLoan>,
) -> AppResult<Json<ApiResponse<LoanDetails>>> {
    claims.require_write()?;
    request.validate()?;

    let loan = state.services.loans.cancel_loan(id, request, claims.user_id).await?;
    Ok(Json(ApiResponse::with_message(loan, "Loan cancelled")))
}

/// Delete a completed or cancelled loan
#[utoipa::path(
    delete,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan deleted", body = MessageResponse),
        (status = 403, description = "Insufficient rights", body = crate::error::ErrorResponse),
        (status = 422, description = "Loan is still active", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_delete()?;

    state.services.loans.delete_loan(id).await?;
    Ok(Json(MessageResponse::new("Loan deleted")))
}

/// Complete or cancel several loans at once
#[utoipa::path(
    patch,
    path = "/loans/bulk-status",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = BulkStatusUpdate,
    responses(
        (status = 200, description = "Per-loan outcome", body = BulkStatusResult),
        (status = 400, description = "Invalid target status", body = crate::error::ErrorResponse)
    )
)]
pub async fn bulk_update_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiJson(request): ApiJson<BulkStatusUpdate>,
) -> AppResult<Json<ApiResponse<BulkStatusResult>>> {
    claims.require_write()?;
    request.validate()?;

    let result = state.services.loans.bulk_update_status(request, claims.user_id).await?;
    let message = format!("{} loan(s) updated, {} failed", result.updated.len(), result.failed.len());
    Ok(Json(ApiResponse::with_message(result, message)))
}

/// Loan counters by status
#[utoipa::path(
    get,
    path = "/loans/stats",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Loan statistics", body = LoanStats)
    )
)]
pub async fn loan_stats(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ApiResponse<LoanStats>>> {
    claims.require_read()?;

    let stats = state.services.loans.stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// Export the filtered loan list as CSV
#[utoipa::path(
    get,
    path = "/loans/export",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String)
    )
)]
pub async fn export_loans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiQuery(query): ApiQuery<LoanQuery>,
) -> AppResult<impl IntoResponse> {
    claims.require_read()?;

    let csv = state.services.loans.export_csv(&query).await?;
    let disposition = format!(
        "attachment; filename=\"loans-{}.csv\"",
        Utc::now().format("%Y-%m-%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
