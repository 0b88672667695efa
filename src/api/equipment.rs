//! Equipment inventory endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        equipment::{
            CreateEquipment, CreateMaintenance, Equipment, EquipmentDetails, EquipmentQuery,
            MaintenanceRecord, UpdateEquipment,
        },
        loan::LoanDetails,
    },
    AppState,
};

use super::{
    ApiJson, ApiPath, ApiQuery, ApiResponse, AuthenticatedUser, MessageResponse, PaginatedResponse,
};

/// List equipment with search, filters and pagination
#[utoipa::path(
    get,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(EquipmentQuery),
    responses(
        (status = 200, description = "Equipment list", body = PaginatedResponse<Equipment>)
    )
)]
pub async fn list_equipment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiQuery(query): ApiQuery<EquipmentQuery>,
) -> AppResult<Json<PaginatedResponse<Equipment>>> {
    claims.require_read()?;

    let page = state.services.equipment.list(&query).await?;
    Ok(Json(page.into()))
}

/// Equipment that can be lent right now
#[utoipa::path(
    get,
    path = "/equipment/available",
    tag = "equipment",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Available equipment", body = Vec<Equipment>)
    )
)]
pub async fn list_available(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<Equipment>>>> {
    claims.require_read()?;

    let equipment = state.services.equipment.list_available().await?;
    Ok(Json(ApiResponse::ok(equipment)))
}

/// Get equipment with its current borrower
#[utoipa::path(
    get,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Equipment details", body = EquipmentDetails),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_equipment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<ApiResponse<EquipmentDetails>>> {
    claims.require_read()?;

    let equipment = state.services.equipment.get(id).await?;
    Ok(Json(ApiResponse::ok(equipment)))
}

/// Register an equipment item
#[utoipa::path(
    post,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    request_body = CreateEquipment,
    responses(
        (status = 201, description = "Equipment created", body = Equipment),
        (status = 400, description = "Invalid input or duplicate serial number", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_equipment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiJson(request): ApiJson<CreateEquipment>,
) -> AppResult<(StatusCode, Json<ApiResponse<Equipment>>)> {
    claims.require_write()?;
    request.validate()?;

    let equipment = state.services.equipment.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(equipment))))
}

/// Update an equipment item
#[utoipa::path(
    put,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    request_body = UpdateEquipment,
    responses(
        (status = 200, description = "Equipment updated", body = Equipment),
        (status = 400, description = "Invalid input or duplicate serial number", body = crate::error::ErrorResponse),
        (status = 422, description = "Status owned by an active loan", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_equipment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateEquipment>,
) -> AppResult<Json<ApiResponse<Equipment>>> {
    claims.require_write()?;
    request.validate()?;

    let equipment = state.services.equipment.update(id, request).await?;
    Ok(Json(ApiResponse::ok(equipment)))
}

/// Delete an equipment item never lent
#[utoipa::path(
    delete,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Equipment deleted", body = MessageResponse),
        (status = 422, description = "Equipment on loan or with loan history", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_equipment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_delete()?;

    state.services.equipment.delete(id).await?;
    Ok(Json(MessageResponse::new("Equipment deleted")))
}

/// Loan history of an equipment item
#[utoipa::path(
    get,
    path = "/equipment/{id}/loans",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Loans of this equipment", body = Vec<LoanDetails>),
        (status = 404, description = "Equipment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn equipment_loans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<ApiResponse<Vec<LoanDetails>>>> {
    claims.require_read()?;

    let loans = state.services.loans.equipment_loans(id).await?;
    Ok(Json(ApiResponse::ok(loans)))
}

/// Maintenance history of an equipment item
#[utoipa::path(
    get,
    path = "/equipment/{id}/maintenance",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Maintenance records", body = Vec<MaintenanceRecord>)
    )
)]
pub async fn list_maintenance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<ApiResponse<Vec<MaintenanceRecord>>>> {
    claims.require_read()?;

    let records = state.services.equipment.maintenance_history(id).await?;
    Ok(Json(ApiResponse::ok(records)))
}

/// Record a maintenance operation
#[utoipa::path(
    post,
    path = "/equipment/{id}/maintenance",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    request_body = CreateMaintenance,
    responses(
        (status = 201, description = "Maintenance recorded", body = MaintenanceRecord),
        (status = 422, description = "Equipment is on loan", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_maintenance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<CreateMaintenance>,
) -> AppResult<(StatusCode, Json<ApiResponse<MaintenanceRecord>>)> {
    claims.require_write()?;
    request.validate()?;

    let record = state.services.equipment.add_maintenance(id, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}
