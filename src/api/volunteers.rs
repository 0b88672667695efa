//! Volunteer management endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::volunteer::{CreateVolunteer, Volunteer, VolunteerQuery, UpdateVolunteer},
    AppState,
};

use super::{
    ApiJson, ApiPath, ApiQuery, ApiResponse, AuthenticatedUser, MessageResponse, PaginatedResponse,
};

/// List volunteers with search, filters and pagination
#[utoipa::path(
    get,
    path = "/volunteers",
    tag = "volunteers",
    security(("bearer_auth" = [])),
    params(VolunteerQuery),
    responses(
        (status = 200, description = "Volunteers", body = PaginatedResponse<Volunteer>)
    )
)]
pub async fn list_volunteers(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiQuery(query): ApiQuery<VolunteerQuery>,
) -> AppResult<Json<PaginatedResponse<Volunteer>>> {
    claims.require_read()?;

    let page = state.services.volunteers.list(&query).await?;
    Ok(Json(page.into()))
}

/// Get a volunteer
#[utoipa::path(
    get,
    path = "/volunteers/{id}",
    tag = "volunteers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Volunteer ID")),
    responses(
        (status = 200, description = "Volunteer", body = Volunteer),
        (status = 404, description = "Volunteer not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_volunteer(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<ApiResponse<Volunteer>>> {
    claims.require_read()?;

    let record = state.services.volunteers.get(id).await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// Create a volunteer
#[utoipa::path(
    post,
    path = "/volunteers",
    tag = "volunteers",
    security(("bearer_auth" = [])),
    request_body = CreateVolunteer,
    responses(
        (status = 201, description = "Volunteer created", body = Volunteer),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_volunteer(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiJson(request): ApiJson<CreateVolunteer>,
) -> AppResult<(StatusCode, Json<ApiResponse<Volunteer>>)> {
    claims.require_write()?;
    request.validate()?;

    let record = state.services.volunteers.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}

/// Update a volunteer
#[utoipa::path(
    put,
    path = "/volunteers/{id}",
    tag = "volunteers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Volunteer ID")),
    request_body = UpdateVolunteer,
    responses(
        (status = 200, description = "Volunteer updated", body = Volunteer),
        (status = 404, description = "Volunteer not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_volunteer(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateVolunteer>,
) -> AppResult<Json<ApiResponse<Volunteer>>> {
    claims.require_write()?;
    request.validate()?;

    let record = state.services.volunteers.update(id, request).await?;
    Ok(Json(ApiResponse::ok(record)))
}

/// Delete a volunteer
#[utoipa::path(
    delete,
    path = "/volunteers/{id}",
    tag = "volunteers",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Volunteer ID")),
    responses(
        (status = 200, description = "Volunteer deleted", body = MessageResponse),
        (status = 404, description = "Volunteer not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_volunteer(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_delete()?;

    state.services.volunteers.delete(id).await?;
    Ok(Json(MessageResponse::new("Volunteer deleted")))
}
