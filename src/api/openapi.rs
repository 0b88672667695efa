//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, donors, equipment, health, loans, patients, users, volunteers, zakat};
use crate::models::{donor, equipment as equipment_model, loan, patient, user, volunteer, zakat as zakat_model};

/// Registers the JWT bearer scheme referenced by `security(("bearer_auth" = []))`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Association Creative API",
        version = "1.0.0",
        description = "Administration of patients, medical equipment loans, donors, volunteers and zakat distributions",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        auth::change_password,
        // Loans
        loans::list_loans,
        loans::get_loan,
        loans::create_loan,
        loans::update_loan,
        loans::return_loan,
        loans::cancel_loan,
        loans::delete_loan,
        loans::bulk_update_status,
        loans::loan_stats,
        loans::export_loans,
        // Equipment
        equipment::list_equipment,
        equipment::list_available,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::delete_equipment,
        equipment::equipment_loans,
        equipment::list_maintenance,
        equipment::add_maintenance,
        // Patients
        patients::list_patients,
        patients::get_patient,
        patients::create_patient,
        patients::update_patient,
        patients::delete_patient,
        patients::patient_loans,
        patients::upload_file,
        patients::remove_file,
        // Donors
        donors::list_donors,
        donors::get_donor,
        donors::create_donor,
        donors::update_donor,
        donors::delete_donor,
        // Volunteers
        volunteers::list_volunteers,
        volunteers::get_volunteer,
        volunteers::create_volunteer,
        volunteers::update_volunteer,
        volunteers::delete_volunteer,
        // Zakat
        zakat::list_distributions,
        zakat::get_distribution,
        zakat::create_distribution,
        zakat::update_distribution,
        zakat::delete_distribution,
        zakat::summary,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            // Loans
            loan::Loan,
            loan::LoanStatus,
            loan::LoanDetails,
            loan::LoanPatient,
            loan::LoanEquipment,
            loan::CreateLoan,
            loan::UpdateLoan,
            loan::ReturnLoan,
            loan::CancelLoan,
            loan::BulkStatusUpdate,
            loan::BulkFailure,
            loan::BulkStatusResult,
            loan::LoanStats,
            // Equipment
            equipment_model::Equipment,
            equipment_model::EquipmentStatus,
            equipment_model::EquipmentCondition,
            equipment_model::EquipmentDetails,
            equipment_model::CurrentBorrower,
            equipment_model::CreateEquipment,
            equipment_model::UpdateEquipment,
            equipment_model::MaintenanceRecord,
            equipment_model::CreateMaintenance,
            // Patients
            patient::Patient,
            patient::PatientType,
            patient::PatientShort,
            patient::PatientDetails,
            patient::CreatePatient,
            patient::UpdatePatient,
            // Donors
            donor::Donor,
            donor::DonorType,
            donor::CreateDonor,
            donor::UpdateDonor,
            // Volunteers
            volunteer::Volunteer,
            volunteer::VolunteerStatus,
            volunteer::CreateVolunteer,
            volunteer::UpdateVolunteer,
            // Zakat
            zakat_model::ZakatDistribution,
            zakat_model::ZakatType,
            zakat_model::DistributionStatus,
            zakat_model::CreateZakat,
            zakat_model::UpdateZakat,
            zakat_model::ZakatSummary,
            zakat_model::ZakatSummaryEntry,
            // Users
            user::User,
            user::Role,
            user::CreateUser,
            user::UpdateUser,
            user::ChangePassword,
            // Envelopes
            crate::api::MessageResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "loans", description = "Equipment loan lifecycle"),
        (name = "equipment", description = "Medical equipment inventory"),
        (name = "patients", description = "Patient records"),
        (name = "donors", description = "Donor management"),
        (name = "volunteers", description = "Volunteer management"),
        (name = "zakat", description = "Zakat and Ramadan distributions"),
        (name = "users", description = "User management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_loan_lifecycle_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/loans", "/loans/{id}/return", "/loans/{id}/cancel", "/loans/bulk-status"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }

    #[test]
    fn test_patient_upload_is_documented_as_multipart() {
        use utoipa::openapi::PathItemType;

        let doc = ApiDoc::openapi();
        let upload = doc.paths.paths["/patients/{id}/files"]
            .operations
            .get(&PathItemType::Post)
            .expect("upload operation");
        let body = upload.request_body.as_ref().expect("request body");
        assert!(body.content.contains_key("multipart/form-data"));
    }
}
