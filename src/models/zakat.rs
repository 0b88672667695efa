//! Zakat and Ramadan distribution records

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{pagination::PageQuery, patient::PHONE_RE};
use crate::error::{AppError, AppResult};

text_enum! {
    pub enum ZakatType {
        ZakatAlMal => "zakat_al_mal" | "zakat",
        ZakatAlFitr => "zakat_al_fitr" | "fitr",
        /// Ramadan food basket
        RamadanBasket => "ramadan_basket" | "ramadan" | "couffin",
        Sadaqa => "sadaqa",
    }
}

text_enum! {
    pub enum DistributionStatus {
        Planned => "planned",
        Distributed => "distributed",
        Cancelled => "cancelled",
    }
}

/// Distribution record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ZakatDistribution {
    pub id: i32,
    pub beneficiary_name: String,
    pub beneficiary_phone: Option<String>,
    pub family_size: Option<i32>,
    pub zakat_type: ZakatType,
    pub amount: Decimal,
    pub distribution_date: NaiveDate,
    pub status: DistributionStatus,
    pub donor_id: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn ensure_non_negative_amount(amount: Decimal) -> AppResult<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        Err(AppError::Validation("amount cannot be negative".to_string()))
    } else {
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateZakat {
    #[validate(length(min = 1, max = 200, message = "Beneficiary name is required"))]
    pub beneficiary_name: String,
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub beneficiary_phone: Option<String>,
    #[validate(range(min = 1, max = 50))]
    pub family_size: Option<i32>,
    pub zakat_type: ZakatType,
    pub amount: Decimal,
    /// Defaults to today
    pub distribution_date: Option<NaiveDate>,
    pub status: Option<DistributionStatus>,
    pub donor_id: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateZakat {
    #[validate(length(min = 1, max = 200, message = "Beneficiary name cannot be empty"))]
    pub beneficiary_name: Option<String>,
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub beneficiary_phone: Option<String>,
    #[validate(range(min = 1, max = 50))]
    pub family_size: Option<i32>,
    pub zakat_type: Option<ZakatType>,
    pub amount: Option<Decimal>,
    pub distribution_date: Option<NaiveDate>,
    pub status: Option<DistributionStatus>,
    pub donor_id: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ZakatQuery {
    /// Search in beneficiary name and phone
    pub search: Option<String>,
    pub zakat_type: Option<ZakatType>,
    pub status: Option<DistributionStatus>,
    /// Distribution date lower bound (inclusive)
    pub from: Option<NaiveDate>,
    /// Distribution date upper bound (inclusive)
    pub to: Option<NaiveDate>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ZakatQuery {
    pub fn pagination(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ZakatSummaryQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
}

/// Totals per distribution type
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ZakatSummaryEntry {
    pub zakat_type: ZakatType,
    pub distributions: i64,
    pub beneficiaries: i64,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ZakatSummary {
    pub year: i32,
    pub entries: Vec<ZakatSummaryEntry>,
    pub total_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_amount_must_not_be_negative() {
        assert!(ensure_non_negative_amount(Decimal::from_str("-0.01").unwrap()).is_err());
        assert!(ensure_non_negative_amount(Decimal::ZERO).is_ok());
        assert!(ensure_non_negative_amount(Decimal::from_str("2500.00").unwrap()).is_ok());
    }

    #[test]
    fn test_zakat_type_aliases() {
        assert_eq!("couffin".parse::<ZakatType>(), Ok(ZakatType::RamadanBasket));
        assert_eq!(ZakatType::ZakatAlFitr.as_str(), "zakat_al_fitr");
    }
}
