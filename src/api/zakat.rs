//! Zakat and Ramadan distribution endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::zakat::{
        CreateZakat, UpdateZakat, ZakatDistribution, ZakatQuery, ZakatSummary, ZakatSummaryQuery,
    },
    AppState,
};

use super::{
    ApiJson, ApiPath, ApiQuery, ApiResponse, AuthenticatedUser, MessageResponse, PaginatedResponse,
};

/// List distributions with search, filters and pagination
#[utoipa::path(
    get,
    path = "/zakat",
    tag = "zakat",
    security(("bearer_auth" = [])),
    params(ZakatQuery),
    responses(
        (status = 200, description = "Distributions", body = PaginatedResponse<ZakatDistribution>)
    )
)]
pub async fn list_distributions(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiQuery(query): ApiQuery<ZakatQuery>,
) -> AppResult<Json<PaginatedResponse<ZakatDistribution>>> {
    claims.require_read()?;

    let page = state.services.zakat.list(&query).await?;
    Ok(Json(page.into()))
}

/// Get a distribution
#[utoipa::path(
    get,
    path = "/zakat/{id}",
    tag = "zakat",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Distribution ID")),
    responses(
        (status = 200, description = "Distribution", body = ZakatDistribution),
        (status = 404, description = "Distribution not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_distribution(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<ApiResponse<ZakatDistribution>>> {
    claims.require_read()?;

    let record = state.services.zakat.get(id).await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// Create a distribution
#[utoipa::path(
    post,
    path = "/zakat",
    tag = "zakat",
    security(("bearer_auth" = [])),
    request_body = CreateZakat,
    responses(
        (status = 201, description = "Distribution created", body = ZakatDistribution),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_distribution(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiJson(request): ApiJson<CreateZakat>,
) -> AppResult<(StatusCode, Json<ApiResponse<ZakatDistribution>>)> {
    claims.require_write()?;
    request.validate()?;

    let record = state.services.zakat.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}

/// Update a distribution
#[utoipa::path(
    put,
    path = "/zakat/{id}",
    tag = "zakat",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Distribution ID")),
    request_body = UpdateZakat,
    responses(
        (status = 200, description = "Distribution updated", body = ZakatDistribution),
        (status = 404, description = "Distribution not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_distribution(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateZakat>,
) -> AppResult<Json<ApiResponse<ZakatDistribution>>> {
    claims.require_write()?;
    request.validate()?;

    let record = state.services.zakat.update(id, request).await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// Delete a distribution
#[utoipa::path(
    delete,
    path = "/zakat/{id}",
    tag = "zakat",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Distribution ID")),
    responses(
        (status = 200, description = "Distribution deleted", body = MessageResponse),
        (status = 404, description = "Distribution not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_distribution(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_delete()?;

    state.services.zakat.delete(id).await?;
    Ok(Json(MessageResponse::new("Distribution deleted")))
}

/// Totals per distribution type for a calendar year
#[utoipa::path(
    get,
    path = "/zakat/summary",
    tag = "zakat",
    security(("bearer_auth" = [])),
    params(ZakatSummaryQuery),
    responses(
        (status = 200, description = "Yearly summary", body = ZakatSummary)
    )
)]
pub async fn summary(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiQuery(query): ApiQuery<ZakatSummaryQuery>,
) -> AppResult<Json<ApiResponse<ZakatSummary>>> {
    claims.require_read()?;

    let summary = state.services.zakat.summary(query.year).await?;
    Ok(Json(ApiResponse::ok(summary)))
}
