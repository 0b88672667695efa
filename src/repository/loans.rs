//! Loans repository for database operations
//!
//! Every lifecycle transition runs in one transaction that locks the loan and
//! equipment rows, so the loan status and the equipment status move together.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, QueryBuilder};

use super::{like_pattern, Filters};
use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::{EquipmentCondition, EquipmentStatus},
        loan::{
            ensure_equipment_lendable, validate_loan_dates, CreateLoan, Loan, LoanQuery, LoanRow,
            LoanStats, LoanStatus, UpdateLoan,
        },
    },
};

const SELECT_LOAN_ROWS: &str = r#"
    SELECT l.*,
           p.first_name AS patient_first_name,
           p.last_name AS patient_last_name,
           e.name AS equipment_name,
           e.serial_number AS equipment_serial_number,
           e.category AS equipment_category
    FROM loans l
    JOIN patients p ON p.id = l.patient_id
    JOIN equipment e ON e.id = l.equipment_id
"#;

const COUNT_LOAN_ROWS: &str = r#"
    SELECT COUNT(*)
    FROM loans l
    JOIN patients p ON p.id = l.patient_id
    JOIN equipment e ON e.id = l.equipment_id
"#;

/// Upper bound on rows returned by an export
pub const EXPORT_LIMIT: i64 = 10_000;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Loan with id {} not found", id))
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a LoanQuery) {
    let mut filters = Filters::new();

    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        filters.next(builder);
        builder
            .push("(p.first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR (p.first_name || ' ' || p.last_name) ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.serial_number ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    match query.status {
        Some(LoanStatus::Overdue) => {
            filters.next(builder);
            builder.push("l.status = 'active' AND l.expected_return_date < NOW()");
        }
        Some(status) => {
            filters.next(builder);
            builder.push("l.status = ").push_bind(status);
        }
        None => {}
    }

    if let Some(patient_id) = query.patient_id {
        filters.next(builder);
        builder.push("l.patient_id = ").push_bind(patient_id);
    }

    if let Some(equipment_id) = query.equipment_id {
        filters.next(builder);
        builder.push("l.equipment_id = ").push_bind(equipment_id);
    }
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Get loan with patient and equipment summaries
    pub async fn get_row(&self, id: i32) -> AppResult<LoanRow> {
        let sql = format!("{} WHERE l.id = $1", SELECT_LOAN_ROWS);
        sqlx::query_as::<_, LoanRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// List loans with filters and pagination, most recent first
    pub async fn list(&self, query: &LoanQuery) -> AppResult<(Vec<LoanRow>, i64)> {
        let page = query.pagination();

        let mut count = QueryBuilder::new(COUNT_LOAN_ROWS);
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new(SELECT_LOAN_ROWS);
        push_filters(&mut select, query);
        select
            .push(" ORDER BY l.start_date DESC, l.id DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select.build_query_as::<LoanRow>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    /// All loans matching the filters, for export
    pub async fn list_for_export(&self, query: &LoanQuery) -> AppResult<Vec<LoanRow>> {
        let mut select = QueryBuilder::new(SELECT_LOAN_ROWS);
        push_filters(&mut select, query);
        select
            .push(" ORDER BY l.start_date DESC, l.id DESC LIMIT ")
            .push_bind(EXPORT_LIMIT);
        let rows = select.build_query_as::<LoanRow>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Every loan of a patient, open ones first
    pub async fn list_for_patient(&self, patient_id: i32) -> AppResult<Vec<LoanRow>> {
        let sql = format!(
            "{} WHERE l.patient_id = $1 ORDER BY (l.status = 'active') DESC, l.start_date DESC",
            SELECT_LOAN_ROWS
        );
        let rows = sqlx::query_as::<_, LoanRow>(&sql)
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Loan history of an equipment item, most recent first
    pub async fn list_for_equipment(&self, equipment_id: i32) -> AppResult<Vec<LoanRow>> {
        let sql = format!(
            "{} WHERE l.equipment_id = $1 ORDER BY l.start_date DESC",
            SELECT_LOAN_ROWS
        );
        let rows = sqlx::query_as::<_, LoanRow>(&sql)
            .bind(equipment_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Create a loan and mark the equipment as borrowed
    pub async fn create(
        &self,
        data: &CreateLoan,
        start_date: DateTime<Utc>,
        created_by: i32,
    ) -> AppResult<Loan> {
        validate_loan_dates(start_date, data.expected_return_date)?;

        let mut tx = self.pool.begin().await?;

        let equipment: Option<(EquipmentStatus, EquipmentCondition)> = sqlx::query_as(
            "SELECT status, condition FROM equipment WHERE id = $1 FOR UPDATE",
        )
        .bind(data.equipment_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (status, condition) = equipment.ok_or_else(|| {
            AppError::NotFound(format!("Equipment with id {} not found", data.equipment_id))
        })?;
        ensure_equipment_lendable(data.equipment_id, status)?;

        let patient_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM patients WHERE id = $1)")
                .bind(data.patient_id)
                .fetch_one(&mut *tx)
                .await?;
        if !patient_exists {
            return Err(AppError::NotFound(format!(
                "Patient with id {} not found",
                data.patient_id
            )));
        }

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (
                equipment_id, patient_id, start_date, expected_return_date,
                status, condition_before, notes, created_by
            )
            VALUES ($1, $2, $3, $4, 'active', $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(data.equipment_id)
        .bind(data.patient_id)
        .bind(start_date)
        .bind(data.expected_return_date)
        .bind(condition)
        .bind(&data.notes)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE equipment SET status = 'borrowed', updated_at = NOW() WHERE id = $1")
            .bind(data.equipment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            loan_id = loan.id,
            equipment_id = loan.equipment_id,
            patient_id = loan.patient_id,
            "Loan created"
        );
        Ok(loan)
    }

    /// Close an open loan as returned and release its equipment
    pub async fn return_loan(
        &self,
        id: i32,
        condition: EquipmentCondition,
        notes: Option<&str>,
        closed_by: i32,
    ) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found(id))?;
        loan.ensure_returnable()?;

        sqlx::query("SELECT id FROM equipment WHERE id = $1 FOR UPDATE")
            .bind(loan.equipment_id)
            .execute(&mut *tx)
            .await?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = 'completed',
                actual_return_date = NOW(),
                condition_after = $2,
                notes = CASE WHEN $3::text IS NULL THEN notes
                             ELSE concat_ws(E'\n', notes, $3::text) END,
                closed_by = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(condition)
        .bind(notes)
        .bind(closed_by)
        .fetch_one(&mut *tx)
        .await?;

        let equipment_status = condition.status_after_return();
        sqlx::query(
            "UPDATE equipment SET condition = $2, status = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(loan.equipment_id)
        .bind(condition)
        .bind(equipment_status)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            loan_id = loan.id,
            equipment_id = loan.equipment_id,
            condition = %condition,
            equipment_status = %equipment_status,
            "Loan returned"
        );
        Ok(loan)
    }

    /// Cancel an open loan and release its equipment
    pub async fn cancel(&self, id: i32, reason: &str, closed_by: i32) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found(id))?;
        loan.ensure_cancellable()?;

        sqlx::query("SELECT id FROM equipment WHERE id = $1 FOR UPDATE")
            .bind(loan.equipment_id)
            .execute(&mut *tx)
            .await?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = 'cancelled', cancel_reason = $2, closed_by = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .bind(closed_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE equipment SET status = 'available', updated_at = NOW()
            WHERE id = $1 AND status = 'borrowed'
            "#,
        )
        .bind(loan.equipment_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(loan_id = loan.id, equipment_id = loan.equipment_id, "Loan cancelled");
        Ok(loan)
    }

    /// Edit the expected return date or notes of an open loan
    pub async fn update(&self, id: i32, data: &UpdateLoan) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found(id))?;
        loan.ensure_editable()?;
        validate_loan_dates(loan.start_date, data.expected_return_date)?;

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET expected_return_date = COALESCE($2, expected_return_date),
                notes = COALESCE($3, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.expected_return_date)
        .bind(&data.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(loan)
    }

    /// Delete a closed loan
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let loan = self.get_by_id(id).await?;
        loan.ensure_deletable()?;

        let result = sqlx::query("DELETE FROM loans WHERE id = $1 AND status <> 'active'")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        tracing::info!(loan_id = id, "Loan deleted");
        Ok(())
    }

    /// Loan counters by status
    pub async fn stats(&self) -> AppResult<LoanStats> {
        let stats = sqlx::query_as::<_, LoanStats>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'active') AS active,
                   COUNT(*) FILTER (WHERE status = 'active' AND expected_return_date < NOW()) AS overdue,
                   COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                   COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled
            FROM loans
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
