//! Donors repository

use rust_decimal::Decimal;
use sqlx::{Pool, Postgres, QueryBuilder};

use super::{like_pattern, push_set, Filters};
use crate::{
    error::{AppError, AppResult},
    models::donor::{CreateDonor, Donor, DonorQuery, DonorType, UpdateDonor},
};

#[derive(Clone)]
pub struct DonorsRepository {
    pool: Pool<Postgres>,
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Donor {} not found", id))
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a DonorQuery) {
    let mut filters = Filters::new();

    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        filters.next(builder);
        builder
            .push("(first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR organization ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(donor_type) = query.donor_type {
        filters.next(builder);
        builder.push("donor_type = ").push_bind(donor_type);
    }
    if let Some(is_active) = query.is_active {
        filters.next(builder);
        builder.push("is_active = ").push_bind(is_active);
    }
}

impl DonorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &DonorQuery) -> AppResult<(Vec<Donor>, i64)> {
        let page = query.pagination();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM donors");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM donors");
        push_filters(&mut select, query);
        select
            .push(" ORDER BY first_name, last_name, id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select.build_query_as::<Donor>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Donor> {
        sqlx::query_as::<_, Donor>("SELECT * FROM donors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, data: &CreateDonor) -> AppResult<Donor> {
        let row = sqlx::query_as::<_, Donor>(
            r#"
            INSERT INTO donors (
                first_name, last_name, donor_type, organization, email, phone,
                address, total_donated, last_donation_date, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(data.first_name.trim())
        .bind(&data.last_name)
        .bind(data.donor_type.unwrap_or(DonorType::Individual))
        .bind(&data.organization)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .bind(data.total_donated.unwrap_or(Decimal::ZERO))
        .bind(data.last_donation_date)
        .bind(&data.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: i32, data: &UpdateDonor) -> AppResult<Donor> {
        let mut builder = QueryBuilder::new("UPDATE donors SET updated_at = NOW()");
        push_set(&mut builder, "first_name", data.first_name.as_deref().map(str::trim));
        push_set(&mut builder, "last_name", data.last_name.as_deref());
        push_set(&mut builder, "donor_type", data.donor_type);
        push_set(&mut builder, "organization", data.organization.as_deref());
        push_set(&mut builder, "email", data.email.as_deref());
        push_set(&mut builder, "phone", data.phone.as_deref());
        push_set(&mut builder, "address", data.address.as_deref());
        push_set(&mut builder, "total_donated", data.total_donated);
        push_set(&mut builder, "last_donation_date", data.last_donation_date);
        push_set(&mut builder, "notes", data.notes.as_deref());
        push_set(&mut builder, "is_active", data.is_active);
        builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        builder
            .build_query_as::<Donor>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM donors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
