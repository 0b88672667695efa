//! Patient (equipment borrower) model

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{loan::LoanDetails, pagination::PageQuery};
use crate::error::{AppError, AppResult};

/// Loose phone number format: digits, spaces, dots, dashes and a leading +
pub static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9 .\-]{6,20}$").expect("valid phone regex"));

text_enum! {
    pub enum PatientType {
        General => "general" | "général" | "generale" | "générale",
        Specific => "specific" | "spécifique" | "specifique",
    }
}

/// Patient record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Patient {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub guardian_relation: Option<String>,
    pub patient_type: PatientType,
    pub medical_condition: Option<String>,
    pub notes: Option<String>,
    /// Paths of uploaded documents, relative to the uploads directory
    pub files: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Patient list entry with its active loan count
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PatientShort {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub patient_type: PatientType,
    pub active_loans: i64,
}

/// Patient with loan information
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PatientDetails {
    #[serde(flatten)]
    pub patient: Patient,
    pub active_loans: i64,
    /// Active and overdue loans
    pub borrowed_equipment: Vec<LoanDetails>,
    /// Completed and cancelled loans, most recent first
    pub loan_history: Vec<LoanDetails>,
}

/// Refuse deleting a patient who still holds equipment
pub fn ensure_patient_deletable(patient_id: i32, active_loans: i64) -> AppResult<()> {
    if active_loans > 0 {
        Err(AppError::PatientHasActiveLoans(format!(
            "Patient {} still has {} active loan(s)",
            patient_id, active_loans
        )))
    } else {
        Ok(())
    }
}

/// Create patient request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePatient {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub national_id: Option<String>,
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub guardian_name: Option<String>,
    #[validate(regex(path = *PHONE_RE, message = "Invalid guardian phone number"))]
    pub guardian_phone: Option<String>,
    pub guardian_relation: Option<String>,
    pub patient_type: Option<PatientType>,
    pub medical_condition: Option<String>,
    pub notes: Option<String>,
}

/// Update patient request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePatient {
    #[validate(length(min = 1, max = 100, message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub national_id: Option<String>,
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub guardian_name: Option<String>,
    #[validate(regex(path = *PHONE_RE, message = "Invalid guardian phone number"))]
    pub guardian_phone: Option<String>,
    pub guardian_relation: Option<String>,
    pub patient_type: Option<PatientType>,
    pub medical_condition: Option<String>,
    pub notes: Option<String>,
}

/// Query parameters for the patient list
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PatientQuery {
    /// Search in names, phone and national id
    pub search: Option<String>,
    pub patient_type: Option<PatientType>,
    /// Only patients currently holding equipment
    pub has_active_loans: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PatientQuery {
    pub fn pagination(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Query string of the file removal endpoint
#[derive(Debug, Deserialize, IntoParams)]
pub struct PatientFileQuery {
    /// Stored path, as listed in `files`
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_type_accepts_french_labels() {
        assert_eq!("général".parse::<PatientType>(), Ok(PatientType::General));
        assert_eq!("Spécifique".parse::<PatientType>(), Ok(PatientType::Specific));
        assert_eq!(PatientType::Specific.to_string(), "specific");
    }

    #[test]
    fn test_patient_with_active_loans_cannot_be_deleted() {
        assert!(matches!(
            ensure_patient_deletable(4, 2),
            Err(AppError::PatientHasActiveLoans(_))
        ));
        assert!(ensure_patient_deletable(4, 0).is_ok());
    }

    #[test]
    fn test_phone_validation() {
        let mut patient = CreatePatient {
            first_name: "Karim".to_string(),
            last_name: "Haddad".to_string(),
            birth_date: None,
            gender: None,
            national_id: None,
            phone: Some("+213 555 12 34 56".to_string()),
            address: None,
            city: None,
            guardian_name: None,
            guardian_phone: None,
            guardian_relation: None,
            patient_type: None,
            medical_condition: None,
            notes: None,
        };
        assert!(patient.validate().is_ok());

        patient.phone = Some("call me".to_string());
        assert!(patient.validate().is_err());

        patient.phone = None;
        patient.first_name = String::new();
        assert!(patient.validate().is_err());
    }
}
