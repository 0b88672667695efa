//! Donor management endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::donor::{CreateDonor, Donor, DonorQuery, UpdateDonor},
    AppState,
};

use super::{
    ApiJson, ApiPath, ApiQuery, ApiResponse, AuthenticatedUser, MessageResponse, PaginatedResponse,
};

/// List donors with search, filters and pagination
#[utoipa::path(
    get,
    path = "/donors",
    tag = "donors",
    security(("bearer_auth" = [])),
    params(DonorQuery),
    responses(
        (status = 200, description = "Donors", body = PaginatedResponse<Donor>)
    )
)]
pub async fn list_donors(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiQuery(query): ApiQuery<DonorQuery>,
) -> AppResult<Json<PaginatedResponse<Donor>>> {
    claims.require_read()?;

    let page = state.services.donors.list(&query).await?;
    Ok(Json(page.into()))
}

/// Get a donor
#[utoipa::path(
    get,
    path = "/donors/{id}",
    tag = "donors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Donor ID")),
    responses(
        (status = 200, description = "Donor", body = Donor),
        (status = 404, description = "Donor not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_donor(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<ApiResponse<Donor>>> {
    claims.require_read()?;

    let record = state.services.donors.get(id).await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// Create a donor
#[utoipa::path(
    post,
    path = "/donors",
    tag = "donors",
    security(("bearer_auth" = [])),
    request_body = CreateDonor,
    responses(
        (status = 201, description = "Donor created", body = Donor),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_donor(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiJson(request): ApiJson<CreateDonor>,
) -> AppResult<(StatusCode, Json<ApiResponse<Donor>>)> {
    claims.require_write()?;
    request.validate()?;

    let record = state.services.donors.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}

/// Update a donor
#[utoipa::path(
    put,
    path = "/donors/{id}",
    tag = "donors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Donor ID")),
    request_body = UpdateDonor,
    responses(
        (status = 200, description = "Donor updated", body = Donor),
        (status = 404, description = "Donor not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_donor(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateDonor>,
) -> AppResult<Json<ApiResponse<Donor>>> {
    claims.require_write()?;
    request.validate()?;

    let record = state.services.donors.update(id, request).await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// Delete a donor
#[utoipa::path(
    delete,
    path = "/donors/{id}",
    tag = "donors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Donor ID")),
    responses(
        (status = 200, description = "Donor deleted", body = MessageResponse),
        (status = 404, description = "Donor not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_donor(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_delete()?;

    state.services.donors.delete(id).await?;
    Ok(Json(MessageResponse::new("Donor deleted")))
}
