//! Volunteer model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{pagination::PageQuery, patient::PHONE_RE};

text_enum! {
    pub enum VolunteerStatus {
        Active => "active" | "actif",
        Inactive => "inactive" | "inactif",
    }
}

/// Volunteer record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Volunteer {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    /// Free text, e.g. "weekends", "Ramadan evenings"
    pub availability: Option<String>,
    pub status: VolunteerStatus,
    pub joined_at: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVolunteer {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub availability: Option<String>,
    pub status: Option<VolunteerStatus>,
    pub joined_at: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateVolunteer {
    #[validate(length(min = 1, max = 100, message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub phone: Option<String>,
    pub skills: Option<Vec<String>>,
    pub availability: Option<String>,
    pub status: Option<VolunteerStatus>,
    pub joined_at: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct VolunteerQuery {
    /// Search in names, email and phone
    pub search: Option<String>,
    pub status: Option<VolunteerStatus>,
    /// Volunteers having this skill
    pub skill: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl VolunteerQuery {
    pub fn pagination(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}
