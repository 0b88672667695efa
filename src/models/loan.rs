//! Equipment loan model and lifecycle rules
//!
//! A loan is created `active`, and ends either `completed` (equipment
//! returned) or `cancelled`. `overdue` is never stored: it is derived on read
//! for active loans whose expected return date is in the past.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{
    equipment::{EquipmentCondition, EquipmentStatus},
    pagination::PageQuery,
};
use crate::error::{AppError, AppResult};

text_enum! {
    /// Loan status
    pub enum LoanStatus {
        Active => "active",
        Completed => "completed",
        /// Derived only, see [`Loan::effective_status`]
        Overdue => "overdue",
        Cancelled => "cancelled",
    }
}

impl LoanStatus {
    /// Whether the loan still holds its equipment
    pub fn is_open(&self) -> bool {
        matches!(self, LoanStatus::Active | LoanStatus::Overdue)
    }

    /// Whether the loan reached a final state
    pub fn is_closed(&self) -> bool {
        matches!(self, LoanStatus::Completed | LoanStatus::Cancelled)
    }
}

/// Loan row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub equipment_id: i32,
    pub patient_id: i32,
    pub start_date: DateTime<Utc>,
    pub expected_return_date: Option<DateTime<Utc>>,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub condition_before: Option<EquipmentCondition>,
    pub condition_after: Option<EquipmentCondition>,
    pub notes: Option<String>,
    pub cancel_reason: Option<String>,
    pub created_by: Option<i32>,
    pub closed_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && self.expected_return_date.map(|d| d < now).unwrap_or(false)
    }

    /// Status as shown to users: active loans past due read as `overdue`
    pub fn effective_status(&self, now: DateTime<Utc>) -> LoanStatus {
        if self.is_overdue(now) {
            LoanStatus::Overdue
        } else {
            self.status
        }
    }

    pub fn ensure_returnable(&self) -> AppResult<()> {
        if self.status.is_open() {
            Ok(())
        } else {
            Err(AppError::InvalidTransition(format!(
                "Loan {} is {} and cannot be returned",
                self.id, self.status
            )))
        }
    }

    pub fn ensure_cancellable(&self) -> AppResult<()> {
        if self.status.is_open() {
            Ok(())
        } else {
            Err(AppError::InvalidTransition(format!(
                "Loan {} is {} and cannot be cancelled",
                self.id, self.status
            )))
        }
    }

    pub fn ensure_deletable(&self) -> AppResult<()> {
        if self.status.is_closed() {
            Ok(())
        } else {
            Err(AppError::InvalidTransition(format!(
                "Loan {} is still active; return or cancel it before deleting",
                self.id
            )))
        }
    }

    pub fn ensure_editable(&self) -> AppResult<()> {
        if self.status.is_open() {
            Ok(())
        } else {
            Err(AppError::InvalidTransition(format!(
                "Loan {} is {} and can no longer be edited",
                self.id, self.status
            )))
        }
    }
}

/// Reject a return date earlier than the loan start
pub fn validate_loan_dates(
    start_date: DateTime<Utc>,
    expected_return_date: Option<DateTime<Utc>>,
) -> AppResult<()> {
    match expected_return_date {
        Some(expected) if expected < start_date => Err(AppError::Validation(
            "expected_return_date must be on or after start_date".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Ensure an equipment item can go out on a new loan
pub fn ensure_equipment_lendable(equipment_id: i32, status: EquipmentStatus) -> AppResult<()> {
    if status.is_lendable() {
        Ok(())
    } else {
        Err(AppError::EquipmentNotAvailable(format!(
            "Equipment {} is {}",
            equipment_id, status
        )))
    }
}

/// Loan joined with patient and equipment summaries
#[derive(Debug, Clone, FromRow)]
pub struct LoanRow {
    #[sqlx(flatten)]
    pub loan: Loan,
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub equipment_name: String,
    pub equipment_serial_number: String,
    pub equipment_category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanPatient {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanEquipment {
    pub id: i32,
    pub name: String,
    pub serial_number: String,
    pub category: Option<String>,
}

/// Loan with full details for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    #[serde(flatten)]
    pub loan: Loan,
    pub patient: LoanPatient,
    pub equipment: LoanEquipment,
    pub is_overdue: bool,
    /// Status including the derived `overdue`
    pub display_status: LoanStatus,
}

impl LoanRow {
    pub fn into_details(self, now: DateTime<Utc>) -> LoanDetails {
        let is_overdue = self.loan.is_overdue(now);
        let display_status = self.loan.effective_status(now);
        LoanDetails {
            patient: LoanPatient {
                id: self.loan.patient_id,
                first_name: self.patient_first_name,
                last_name: self.patient_last_name,
            },
            equipment: LoanEquipment {
                id: self.loan.equipment_id,
                name: self.equipment_name,
                serial_number: self.equipment_serial_number,
                category: self.equipment_category,
            },
            loan: self.loan,
            is_overdue,
            display_status,
        }
    }
}

/// Create loan request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLoan {
    #[validate(range(min = 1, message = "equipment_id is required"))]
    pub equipment_id: i32,
    #[validate(range(min = 1, message = "patient_id is required"))]
    pub patient_id: i32,
    /// Defaults to now
    pub start_date: Option<DateTime<Utc>>,
    pub expected_return_date: Option<DateTime<Utc>>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Edit an open loan
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateLoan {
    pub expected_return_date: Option<DateTime<Utc>>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Return request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReturnLoan {
    /// Condition of the equipment as returned
    pub condition: EquipmentCondition,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Cancellation request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CancelLoan {
    #[validate(length(min = 1, max = 1000, message = "A cancellation reason is required"))]
    pub reason: String,
}

/// Bulk status change
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkStatusUpdate {
    #[validate(length(min = 1, max = 200, message = "Select between 1 and 200 loans"))]
    pub ids: Vec<i32>,
    /// `completed` or `cancelled`
    pub status: LoanStatus,
    /// Condition recorded when completing (default: good)
    pub condition: Option<EquipmentCondition>,
    /// Reason recorded when cancelling
    pub reason: Option<String>,
}

/// Per-loan failure in a bulk update
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkFailure {
    pub id: i32,
    pub message: String,
}

/// Outcome of a bulk update
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct BulkStatusResult {
    pub updated: Vec<i32>,
    pub failed: Vec<BulkFailure>,
}

/// Query parameters for the loan list
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct LoanQuery {
    /// Search in patient name, equipment name and serial number
    pub search: Option<String>,
    /// Status filter; `overdue` selects active loans past due
    pub status: Option<LoanStatus>,
    pub patient_id: Option<i32>,
    pub equipment_id: Option<i32>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl LoanQuery {
    pub fn pagination(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Loan counters
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanStats {
    pub total: i64,
    pub active: i64,
    pub overdue: i64,
    pub completed: i64,
    pub cancelled: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn loan(status: LoanStatus, expected_return_date: Option<DateTime<Utc>>) -> Loan {
        let now = Utc::now();
        Loan {
            id: 7,
            equipment_id: 3,
            patient_id: 11,
            start_date: now - Duration::days(10),
            expected_return_date,
            actual_return_date: None,
            status,
            condition_before: Some(EquipmentCondition::Good),
            condition_after: None,
            notes: None,
            cancel_reason: None,
            created_by: Some(1),
            closed_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_return_date_before_start_is_rejected() {
        let start = Utc::now();
        let err = validate_loan_dates(start, Some(start - Duration::days(1))).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert_ok!(validate_loan_dates(start, Some(start)));
        assert_ok!(validate_loan_dates(start, Some(start + Duration::days(30))));
        assert_ok!(validate_loan_dates(start, None));
    }

    #[test]
    fn test_overdue_is_derived_from_expected_return_date() {
        let now = Utc::now();
        let late = loan(LoanStatus::Active, Some(now - Duration::days(1)));
        assert!(late.is_overdue(now));
        assert_eq!(late.effective_status(now), LoanStatus::Overdue);

        let on_time = loan(LoanStatus::Active, Some(now + Duration::days(1)));
        assert!(!on_time.is_overdue(now));
        assert_eq!(on_time.effective_status(now), LoanStatus::Active);

        let open_ended = loan(LoanStatus::Active, None);
        assert!(!open_ended.is_overdue(now));

        let done = loan(LoanStatus::Completed, Some(now - Duration::days(5)));
        assert!(!done.is_overdue(now));
        assert_eq!(done.effective_status(now), LoanStatus::Completed);
    }

    #[test]
    fn test_only_open_loans_can_be_returned_or_cancelled() {
        let now = Utc::now();
        assert_ok!(loan(LoanStatus::Active, None).ensure_returnable());
        assert_ok!(loan(LoanStatus::Active, Some(now - Duration::days(3))).ensure_cancellable());

        for closed in [LoanStatus::Completed, LoanStatus::Cancelled] {
            let l = loan(closed, None);
            assert!(matches!(l.ensure_returnable(), Err(AppError::InvalidTransition(_))));
            assert!(matches!(l.ensure_cancellable(), Err(AppError::InvalidTransition(_))));
            assert_err!(l.ensure_editable());
        }
    }

    #[test]
    fn test_only_closed_loans_can_be_deleted() {
        assert_err!(loan(LoanStatus::Active, None).ensure_deletable());
        assert_ok!(loan(LoanStatus::Completed, None).ensure_deletable());
        assert_ok!(loan(LoanStatus::Cancelled, None).ensure_deletable());
    }

    #[test]
    fn test_lending_requires_available_equipment() {
        assert_ok!(ensure_equipment_lendable(1, EquipmentStatus::Available));
        for status in [
            EquipmentStatus::Borrowed,
            EquipmentStatus::Maintenance,
            EquipmentStatus::Decommissioned,
            EquipmentStatus::Lost,
        ] {
            assert!(matches!(
                ensure_equipment_lendable(1, status),
                Err(AppError::EquipmentNotAvailable(_))
            ));
        }
    }

    #[test]
    fn test_details_carry_display_status() {
        let now = Utc::now();
        let row = LoanRow {
            loan: loan(LoanStatus::Active, Some(now - Duration::hours(2))),
            patient_first_name: "Amina".to_string(),
            patient_last_name: "Benali".to_string(),
            equipment_name: "Fauteuil roulant".to_string(),
            equipment_serial_number: "FR-001".to_string(),
            equipment_category: Some("mobility".to_string()),
        };
        let details = row.into_details(now);
        assert!(details.is_overdue);
        assert_eq!(details.display_status, LoanStatus::Overdue);
        assert_eq!(details.loan.status, LoanStatus::Active);
        assert_eq!(details.patient.id, 11);
        assert_eq!(details.equipment.serial_number, "FR-001");

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["status"], "active");
        assert_eq!(json["display_status"], "overdue");
    }
}
