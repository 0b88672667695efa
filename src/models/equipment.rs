//! Medical equipment model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::pagination::PageQuery;
use crate::error::{AppError, AppResult};

text_enum! {
    /// Availability status of an equipment item
    pub enum EquipmentStatus {
        Available => "available",
        /// On an active loan
        Borrowed => "borrowed" | "lent",
        Maintenance => "maintenance",
        Decommissioned => "decommissioned",
        Lost => "lost",
    }
}

text_enum! {
    /// Physical condition of an equipment item
    pub enum EquipmentCondition {
        New => "new",
        Excellent => "excellent",
        Good => "good",
        Fair => "fair",
        Poor => "poor",
        Unusable => "unusable",
    }
}

impl EquipmentStatus {
    /// Only available equipment can go out on a new loan
    pub fn is_lendable(&self) -> bool {
        *self == EquipmentStatus::Available
    }

    /// Statuses a user may set directly; `borrowed` is owned by the loan lifecycle
    pub fn is_manually_settable(&self) -> bool {
        *self != EquipmentStatus::Borrowed
    }
}

/// Manual status changes never touch equipment held by a loan
pub fn ensure_manual_status_change(
    id: i32,
    current: EquipmentStatus,
    next: EquipmentStatus,
) -> AppResult<()> {
    if !next.is_manually_settable() {
        return Err(AppError::Validation(
            "Equipment becomes borrowed only through a loan".to_string(),
        ));
    }
    if current == EquipmentStatus::Borrowed {
        return Err(AppError::BusinessRule(format!(
            "Equipment {} is on an active loan; return or cancel the loan first",
            id
        )));
    }
    Ok(())
}

impl EquipmentCondition {
    /// Status the equipment goes back to once returned in this condition
    pub fn status_after_return(&self) -> EquipmentStatus {
        match self {
            EquipmentCondition::Unusable => EquipmentStatus::Maintenance,
            _ => EquipmentStatus::Available,
        }
    }
}

/// Equipment record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Equipment {
    pub id: i32,
    pub name: String,
    /// Free-form category (wheelchair, bed, crutches...)
    pub category: Option<String>,
    pub equipment_type: Option<String>,
    /// Unique serial number
    pub serial_number: String,
    pub status: EquipmentStatus,
    pub condition: EquipmentCondition,
    pub location: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Snapshot of the patient currently holding an equipment item
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CurrentBorrower {
    pub loan_id: i32,
    pub patient_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub start_date: DateTime<Utc>,
    pub expected_return_date: Option<DateTime<Utc>>,
}

/// Equipment with its current borrower, if any
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EquipmentDetails {
    #[serde(flatten)]
    pub equipment: Equipment,
    pub current_borrower: Option<CurrentBorrower>,
}

/// Create equipment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEquipment {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    pub category: Option<String>,
    pub equipment_type: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Serial number is required"))]
    pub serial_number: String,
    pub condition: Option<EquipmentCondition>,
    pub location: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Update equipment request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEquipment {
    #[validate(length(min = 1, max = 200, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub category: Option<String>,
    pub equipment_type: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Serial number cannot be empty"))]
    pub serial_number: Option<String>,
    pub status: Option<EquipmentStatus>,
    pub condition: Option<EquipmentCondition>,
    pub location: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Query parameters for the equipment list
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct EquipmentQuery {
    /// Search in name, serial number and category
    pub search: Option<String>,
    pub status: Option<EquipmentStatus>,
    pub category: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl EquipmentQuery {
    pub fn pagination(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Maintenance history entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MaintenanceRecord {
    pub id: i32,
    pub equipment_id: i32,
    pub performed_at: NaiveDate,
    pub description: String,
    pub cost: Option<Decimal>,
    pub performed_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Record a maintenance operation
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMaintenance {
    /// Defaults to today
    pub performed_at: Option<NaiveDate>,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub cost: Option<Decimal>,
    pub performed_by: Option<String>,
    /// Status to leave the equipment in afterwards (default: unchanged)
    pub status_after: Option<EquipmentStatus>,
    pub condition_after: Option<EquipmentCondition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lent_is_an_alias_of_borrowed() {
        assert_eq!("lent".parse::<EquipmentStatus>(), Ok(EquipmentStatus::Borrowed));
        assert_eq!("Borrowed".parse::<EquipmentStatus>(), Ok(EquipmentStatus::Borrowed));
        assert_eq!(EquipmentStatus::Borrowed.as_str(), "borrowed");
        assert!("broken".parse::<EquipmentStatus>().is_err());
    }

    #[test]
    fn test_only_available_is_lendable() {
        for status in EquipmentStatus::ALL {
            assert_eq!(status.is_lendable(), *status == EquipmentStatus::Available);
        }
        assert!(!EquipmentStatus::Borrowed.is_manually_settable());
        assert!(EquipmentStatus::Lost.is_manually_settable());
    }

    #[test]
    fn test_manual_status_change_skips_borrowed_equipment() {
        assert!(ensure_manual_status_change(1, EquipmentStatus::Available, EquipmentStatus::Maintenance).is_ok());
        assert!(matches!(
            ensure_manual_status_change(1, EquipmentStatus::Borrowed, EquipmentStatus::Available),
            Err(AppError::BusinessRule(_))
        ));
        assert!(matches!(
            ensure_manual_status_change(1, EquipmentStatus::Available, EquipmentStatus::Borrowed),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_status_after_return() {
        assert_eq!(
            EquipmentCondition::Unusable.status_after_return(),
            EquipmentStatus::Maintenance
        );
        assert_eq!(
            EquipmentCondition::Poor.status_after_return(),
            EquipmentStatus::Available
        );
    }

    #[test]
    fn test_condition_serde() {
        let c: EquipmentCondition = serde_json::from_str("\"excellent\"").unwrap();
        assert_eq!(c, EquipmentCondition::Excellent);
        assert_eq!(serde_json::to_string(&EquipmentCondition::Fair).unwrap(), "\"fair\"");
    }
}
