//! Donor model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{pagination::PageQuery, patient::PHONE_RE};

text_enum! {
    pub enum DonorType {
        Individual => "individual" | "particulier",
        Organization => "organization" | "organisation" | "entreprise",
    }
}

/// Donor record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Donor {
    pub id: i32,
    pub first_name: String,
    pub last_name: Option<String>,
    pub donor_type: DonorType,
    pub organization: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub total_donated: Decimal,
    pub last_donation_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDonor {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    pub last_name: Option<String>,
    pub donor_type: Option<DonorType>,
    pub organization: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub total_donated: Option<Decimal>,
    pub last_donation_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateDonor {
    #[validate(length(min = 1, max = 100, message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub donor_type: Option<DonorType>,
    pub organization: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub total_donated: Option<Decimal>,
    pub last_donation_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DonorQuery {
    /// Search in names, organization and email
    pub search: Option<String>,
    pub donor_type: Option<DonorType>,
    pub is_active: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl DonorQuery {
    pub fn pagination(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}
