//! Donors service

use crate::{
    error::AppResult,
    models::{
        donor::{CreateDonor, Donor, DonorQuery, UpdateDonor},
        zakat::ensure_non_negative_amount,
        Page,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct DonorsService {
    repository: Repository,
}

impl DonorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &DonorQuery) -> AppResult<Page<Donor>> {
        let (items, total) = self.repository.donors.list(query).await?;
        Ok(Page::new(items, total, &query.pagination()))
    }

    pub async fn get(&self, id: i32) -> AppResult<Donor> {
        self.repository.donors.get_by_id(id).await
    }

    pub async fn create(&self, data: CreateDonor) -> AppResult<Donor> {
        if let Some(total) = data.total_donated {
            ensure_non_negative_amount(total)?;
        }
        self.repository.donors.create(&data).await
    }

    pub async fn update(&self, id: i32, data: UpdateDonor) -> AppResult<Donor> {
        if let Some(total) = data.total_donated {
            ensure_non_negative_amount(total)?;
        }
        self.repository.donors.update(id, &data).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.donors.delete(id).await
    }
}
