//! Equipment repository

use chrono::Utc;
use sqlx::{Pool, Postgres, QueryBuilder};

use super::{like_pattern, push_set, Filters};
use crate::{
    error::{AppError, AppResult},
    models::equipment::{
        ensure_manual_status_change, CreateEquipment, CreateMaintenance, CurrentBorrower,
        Equipment, EquipmentCondition, EquipmentQuery, EquipmentStatus, MaintenanceRecord,
        UpdateEquipment,
    },
};

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: Pool<Postgres>,
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Equipment {} not found", id))
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a EquipmentQuery) {
    let mut filters = Filters::new();

    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        filters.next(builder);
        builder
            .push("(name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR serial_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR category ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(status) = query.status {
        filters.next(builder);
        builder.push("status = ").push_bind(status);
    }
    if let Some(category) = query.category.as_deref() {
        filters.next(builder);
        builder.push("LOWER(category) = LOWER(").push_bind(category).push(")");
    }
}

impl EquipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List equipment with filters and pagination
    pub async fn list(&self, query: &EquipmentQuery) -> AppResult<(Vec<Equipment>, i64)> {
        let page = query.pagination();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM equipment");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM equipment");
        push_filters(&mut select, query);
        select
            .push(" ORDER BY name, id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select.build_query_as::<Equipment>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    /// Equipment that can go out on a new loan
    pub async fn list_available(&self) -> AppResult<Vec<Equipment>> {
        let rows = sqlx::query_as::<_, Equipment>(
            "SELECT * FROM equipment WHERE status = 'available' ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get equipment by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Patient holding the equipment through its active loan, if any
    pub async fn current_borrower(&self, id: i32) -> AppResult<Option<CurrentBorrower>> {
        let borrower = sqlx::query_as::<_, CurrentBorrower>(
            r#"
            SELECT l.id AS loan_id, p.id AS patient_id, p.first_name, p.last_name,
                   l.start_date, l.expected_return_date
            FROM loans l
            JOIN patients p ON p.id = l.patient_id
            WHERE l.equipment_id = $1 AND l.status = 'active'
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(borrower)
    }

    /// Create equipment
    pub async fn create(&self, data: &CreateEquipment) -> AppResult<Equipment> {
        let row = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (
                name, category, equipment_type, serial_number, condition,
                location, purchase_date, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(&data.category)
        .bind(&data.equipment_type)
        .bind(data.serial_number.trim())
        .bind(data.condition.unwrap_or(EquipmentCondition::Good))
        .bind(&data.location)
        .bind(data.purchase_date)
        .bind(&data.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update equipment; a status change is checked against the locked row
    pub async fn update(&self, id: i32, data: &UpdateEquipment) -> AppResult<Equipment> {
        let mut tx = self.pool.begin().await?;

        if let Some(next) = data.status {
            let current: EquipmentStatus =
                sqlx::query_scalar("SELECT status FROM equipment WHERE id = $1 FOR UPDATE")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or_else(|| not_found(id))?;
            ensure_manual_status_change(id, current, next)?;
        }

        let mut builder = QueryBuilder::new("UPDATE equipment SET updated_at = NOW()");
        push_set(&mut builder, "name", data.name.as_deref().map(str::trim));
        push_set(&mut builder, "category", data.category.as_deref());
        push_set(&mut builder, "equipment_type", data.equipment_type.as_deref());
        push_set(&mut builder, "serial_number", data.serial_number.as_deref().map(str::trim));
        push_set(&mut builder, "status", data.status);
        push_set(&mut builder, "condition", data.condition);
        push_set(&mut builder, "location", data.location.as_deref());
        push_set(&mut builder, "purchase_date", data.purchase_date);
        push_set(&mut builder, "notes", data.notes.as_deref());
        builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let equipment = builder
            .build_query_as::<Equipment>()
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found(id))?;

        tx.commit().await?;
        Ok(equipment)
    }

    /// Delete equipment that is not on loan and has no loan history
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let equipment = self.get_by_id(id).await?;
        if equipment.status == EquipmentStatus::Borrowed {
            return Err(AppError::BusinessRule(format!(
                "Equipment {} is on an active loan and cannot be deleted",
                id
            )));
        }

        let has_loans: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE equipment_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if has_loans {
            return Err(AppError::BusinessRule(format!(
                "Equipment {} has loan history; mark it decommissioned instead",
                id
            )));
        }

        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// Maintenance history, most recent first
    pub async fn list_maintenance(&self, id: i32) -> AppResult<Vec<MaintenanceRecord>> {
        let rows = sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            SELECT * FROM equipment_maintenance
            WHERE equipment_id = $1
            ORDER BY performed_at DESC, id DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Record a maintenance operation and optionally move the equipment status
    pub async fn add_maintenance(&self, id: i32, data: &CreateMaintenance) -> AppResult<MaintenanceRecord> {
        let mut tx = self.pool.begin().await?;

        let status: EquipmentStatus =
            sqlx::query_scalar("SELECT status FROM equipment WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| not_found(id))?;

        if let Some(next) = data.status_after {
            ensure_manual_status_change(id, status, next)?;
        }

        let record = sqlx::query_as::<_, MaintenanceRecord>(
            r#"
            INSERT INTO equipment_maintenance (equipment_id, performed_at, description, cost, performed_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.performed_at.unwrap_or_else(|| Utc::now().date_naive()))
        .bind(&data.description)
        .bind(data.cost)
        .bind(&data.performed_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE equipment
            SET status = COALESCE($2, status),
                condition = COALESCE($3, condition),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(data.status_after)
        .bind(data.condition_after)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(record)
    }
}
