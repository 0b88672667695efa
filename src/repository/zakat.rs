//! Zakat distributions repository

use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Postgres, QueryBuilder};

use super::{like_pattern, push_set, Filters};
use crate::{
    error::{AppError, AppResult},
    models::zakat::{
        CreateZakat, DistributionStatus, UpdateZakat, ZakatDistribution, ZakatQuery,
        ZakatSummaryEntry,
    },
};

#[derive(Clone)]
pub struct ZakatRepository {
    pool: Pool<Postgres>,
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Zakat distribution {} not found", id))
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a ZakatQuery) {
    let mut filters = Filters::new();

    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        filters.next(builder);
        builder
            .push("(beneficiary_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR beneficiary_phone ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(zakat_type) = query.zakat_type {
        filters.next(builder);
        builder.push("zakat_type = ").push_bind(zakat_type);
    }
    if let Some(status) = query.status {
        filters.next(builder);
        builder.push("status = ").push_bind(status);
    }
    if let Some(from) = query.from {
        filters.next(builder);
        builder.push("distribution_date >= ").push_bind(from);
    }
    if let Some(to) = query.to {
        filters.next(builder);
        builder.push("distribution_date <= ").push_bind(to);
    }
}

impl ZakatRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &ZakatQuery) -> AppResult<(Vec<ZakatDistribution>, i64)> {
        let page = query.pagination();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM zakat_distributions");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM zakat_distributions");
        push_filters(&mut select, query);
        select
            .push(" ORDER BY distribution_date DESC, id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select
            .build_query_as::<ZakatDistribution>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<ZakatDistribution> {
        sqlx::query_as::<_, ZakatDistribution>("SELECT * FROM zakat_distributions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, data: &CreateZakat) -> AppResult<ZakatDistribution> {
        let row = sqlx::query_as::<_, ZakatDistribution>(
            r#"
            INSERT INTO zakat_distributions (
                beneficiary_name, beneficiary_phone, family_size, zakat_type, amount,
                distribution_date, status, donor_id, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(data.beneficiary_name.trim())
        .bind(&data.beneficiary_phone)
        .bind(data.family_size)
        .bind(data.zakat_type)
        .bind(data.amount)
        .bind(data.distribution_date.unwrap_or_else(|| Utc::now().date_naive()))
        .bind(data.status.unwrap_or(DistributionStatus::Planned))
        .bind(data.donor_id)
        .bind(&data.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: i32, data: &UpdateZakat) -> AppResult<ZakatDistribution> {
        let mut builder = QueryBuilder::new("UPDATE zakat_distributions SET updated_at = NOW()");
        push_set(&mut builder, "beneficiary_name", data.beneficiary_name.as_deref().map(str::trim));
        push_set(&mut builder, "beneficiary_phone", data.beneficiary_phone.as_deref());
        push_set(&mut builder, "family_size", data.family_size);
        push_set(&mut builder, "zakat_type", data.zakat_type);
        push_set(&mut builder, "amount", data.amount);
        push_set(&mut builder, "distribution_date", data.distribution_date);
        push_set(&mut builder, "status", data.status);
        push_set(&mut builder, "donor_id", data.donor_id);
        push_set(&mut builder, "notes", data.notes.as_deref());
        builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        builder
            .build_query_as::<ZakatDistribution>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM zakat_distributions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// Totals per type for distributions made between two dates (cancelled excluded)
    pub async fn summary(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<ZakatSummaryEntry>> {
        let rows = sqlx::query_as::<_, ZakatSummaryEntry>(
            r#"
            SELECT zakat_type,
                   COUNT(*) AS distributions,
                   COALESCE(SUM(COALESCE(family_size, 1)), 0)::bigint AS beneficiaries,
                   COALESCE(SUM(amount), 0) AS total_amount
            FROM zakat_distributions
            WHERE distribution_date BETWEEN $1 AND $2
              AND status <> 'cancelled'
            GROUP BY zakat_type
            ORDER BY zakat_type
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
