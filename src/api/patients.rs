//! Patient records endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use axum_extra::extract::Multipart;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::LoanDetails,
        patient::{
            CreatePatient, Patient, PatientDetails, PatientFileQuery, PatientQuery, PatientShort,
            UpdatePatient,
        },
    },
    AppState,
};

use super::{
    ApiJson, ApiPath, ApiQuery, ApiResponse, AuthenticatedUser, MessageResponse, PaginatedResponse,
};

/// List patients with search, filters and pagination
#[utoipa::path(
    get,
    path = "/patients",
    tag = "patients",
    security(("bearer_auth" = [])),
    params(PatientQuery),
    responses(
        (status = 200, description = "Patients", body = PaginatedResponse<PatientShort>)
    )
)]
pub async fn list_patients(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiQuery(query): ApiQuery<PatientQuery>,
) -> AppResult<Json<PaginatedResponse<PatientShort>>> {
    claims.require_read()?;

    let page = state.services.patients.list(&query).await?;
    Ok(Json(page.into()))
}

/// Get a patient with borrowed equipment and loan history
#[utoipa::path(
    get,
    path = "/patients/{id}",
    tag = "patients",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Patient details", body = PatientDetails),
        (status = 404, description = "Patient not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_patient(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<ApiResponse<PatientDetails>>> {
    claims.require_read()?;

    let patient = state.services.patients.get(id).await?;
    Ok(Json(ApiResponse::ok(patient)))
}

/// Register a patient
#[utoipa::path(
    post,
    path = "/patients",
    tag = "patients",
    security(("bearer_auth" = [])),
    request_body = CreatePatient,
    responses(
        (status = 201, description = "Patient created", body = Patient),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_patient(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiJson(request): ApiJson<CreatePatient>,
) -> AppResult<(StatusCode, Json<ApiResponse<Patient>>)> {
    claims.require_write()?;
    request.validate()?;

    let patient = state.services.patients.create(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(patient))))
}

/// Update a patient
#[utoipa::path(
    put,
    path = "/patients/{id}",
    tag = "patients",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Patient ID")),
    request_body = UpdatePatient,
    responses(
        (status = 200, description = "Patient updated", body = Patient),
        (status = 404, description = "Patient not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_patient(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdatePatient>,
) -> AppResult<Json<ApiResponse<Patient>>> {
    claims.require_write()?;
    request.validate()?;

    let patient = state.services.patients.update(id, request).await?;
    Ok(Json(ApiResponse::ok(patient)))
}

/// Delete a patient who holds no equipment
#[utoipa::path(
    delete,
    path = "/patients/{id}",
    tag = "patients",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Patient deleted", body = MessageResponse),
        (status = 404, description = "Patient not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Patient has active loans", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_patient(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_delete()?;

    state.services.patients.delete(id).await?;
    Ok(Json(MessageResponse::new("Patient deleted")))
}

/// Loans of a patient
#[utoipa::path(
    get,
    path = "/patients/{id}/loans",
    tag = "patients",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Loans of this patient", body = Vec<LoanDetails>),
        (status = 404, description = "Patient not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn patient_loans(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Json<ApiResponse<Vec<LoanDetails>>>> {
    claims.require_read()?;

    let loans = state.services.loans.patient_loans(id).await?;
    Ok(Json(ApiResponse::ok(loans)))
}

/// Attach documents to a patient (multipart, one or more `file` fields)
#[utoipa::path(
    post,
    path = "/patients/{id}/files",
    tag = "patients",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Patient ID")),
    request_body(content = String, content_type = "multipart/form-data", description = "Files to attach"),
    responses(
        (status = 201, description = "Files attached", body = Patient),
        (status = 400, description = "Missing, empty, oversized or disallowed file", body = crate::error::ErrorResponse)
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<Patient>>)> {
    claims.require_write()?;

    let mut patient = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Cannot read uploaded file: {}", e)))?;

        patient = Some(state.services.patients.add_file(id, &file_name, &content).await?);
    }

    let patient =
        patient.ok_or_else(|| AppError::Validation("No file provided".to_string()))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::with_message(patient, "File uploaded"))))
}

/// Detach a document from a patient and delete it
#[utoipa::path(
    delete,
    path = "/patients/{id}/files",
    tag = "patients",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Patient ID"), PatientFileQuery),
    responses(
        (status = 200, description = "File removed", body = Patient),
        (status = 400, description = "Invalid path", body = crate::error::ErrorResponse),
        (status = 404, description = "File not attached to this patient", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_file(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(id): ApiPath<i32>,
    ApiQuery(query): ApiQuery<PatientFileQuery>,
) -> AppResult<Json<ApiResponse<Patient>>> {
    claims.require_write()?;

    let patient = state.services.patients.remove_file(id, &query.path).await?;
    Ok(Json(ApiResponse::with_message(patient, "File removed")))
}
