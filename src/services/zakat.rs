//! Zakat and Ramadan distributions service

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::{
        zakat::{
            ensure_non_negative_amount, CreateZakat, UpdateZakat, ZakatDistribution, ZakatQuery,
            ZakatSummary,
        },
        Page,
    },
    repository::Repository,
};

/// First and last day of a calendar year
fn year_bounds(year: i32) -> AppResult<(NaiveDate, NaiveDate)> {
    let from = NaiveDate::from_ymd_opt(year, 1, 1);
    let to = NaiveDate::from_ymd_opt(year, 12, 31);
    from.zip(to)
        .ok_or_else(|| AppError::Validation(format!("Invalid year: {}", year)))
}

#[derive(Clone)]
pub struct ZakatService {
    repository: Repository,
}

impl ZakatService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &ZakatQuery) -> AppResult<Page<ZakatDistribution>> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if to < from {
                return Err(AppError::Validation("`to` must be on or after `from`".to_string()));
            }
        }
        let (items, total) = self.repository.zakat.list(query).await?;
        Ok(Page::new(items, total, &query.pagination()))
    }

    pub async fn get(&self, id: i32) -> AppResult<ZakatDistribution> {
        self.repository.zakat.get_by_id(id).await
    }

    pub async fn create(&self, data: CreateZakat) -> AppResult<ZakatDistribution> {
        ensure_non_negative_amount(data.amount)?;
        if let Some(donor_id) = data.donor_id {
            self.repository.donors.get_by_id(donor_id).await?;
        }
        let record = self.repository.zakat.create(&data).await?;
        tracing::info!(distribution_id = record.id, zakat_type = %record.zakat_type, "Distribution recorded");
        Ok(record)
    }

    pub async fn update(&self, id: i32, data: UpdateZakat) -> AppResult<ZakatDistribution> {
        if let Some(amount) = data.amount {
            ensure_non_negative_amount(amount)?;
        }
        if let Some(donor_id) = data.donor_id {
            self.repository.donors.get_by_id(donor_id).await?;
        }
        self.repository.zakat.update(id, &data).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.zakat.delete(id).await
    }

    /// Totals per distribution type for a year (default: current year)
    pub async fn summary(&self, year: Option<i32>) -> AppResult<ZakatSummary> {
        let year = year.unwrap_or_else(|| Utc::now().year());
        let (from, to) = year_bounds(year)?;
        let entries = self.repository.zakat.summary(from, to).await?;
        let total_amount = entries.iter().map(|e| e.total_amount).sum::<Decimal>();
        Ok(ZakatSummary {
            year,
            entries,
            total_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_bounds() {
        let (from, to) = year_bounds(2025).unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert!(year_bounds(i32::MAX).is_err());
    }
}
