//! Patients repository

use sqlx::{Pool, Postgres, QueryBuilder};

use super::{like_pattern, push_set, Filters};
use crate::{
    error::{AppError, AppResult},
    models::patient::{
        ensure_patient_deletable, CreatePatient, Patient, PatientQuery, PatientShort, PatientType,
        UpdatePatient,
    },
};

#[derive(Clone)]
pub struct PatientsRepository {
    pool: Pool<Postgres>,
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Patient with id {} not found", id))
}

const ACTIVE_LOANS: &str =
    "(SELECT COUNT(*) FROM loans l WHERE l.patient_id = p.id AND l.status = 'active')";

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a PatientQuery) {
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
            .push(" OR p.phone ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.national_id ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(patient_type) = query.patient_type {
        filters.next(builder);
        builder.push("p.patient_type = ").push_bind(patient_type);
    }
    match query.has_active_loans {
        Some(true) => {
            filters.next(builder);
            builder.push(ACTIVE_LOANS).push(" > 0");
        }
        Some(false) => {
            filters.next(builder);
            builder.push(ACTIVE_LOANS).push(" = 0");
        }
        None => {}
    }
}

impl PatientsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List patients with filters and pagination
    pub async fn list(&self, query: &PatientQuery) -> AppResult<(Vec<PatientShort>, i64)> {
        let page = query.pagination();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM patients p");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new(
            "SELECT p.id, p.first_name, p.last_name, p.phone, p.city, p.patient_type, ",
        );
        select.push(ACTIVE_LOANS).push(" AS active_loans FROM patients p");
        push_filters(&mut select, query);
        select
            .push(" ORDER BY p.last_name, p.first_name, p.id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select.build_query_as::<PatientShort>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    /// Get patient by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Patient> {
        sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Create a patient
    pub async fn create(&self, data: &CreatePatient) -> AppResult<Patient> {
        let row = sqlx::query_as::<_, Patient>(
            r#"
            INSERT INTO patients (
                first_name, last_name, birth_date, gender, national_id,
                phone, address, city,
                guardian_name, guardian_phone, guardian_relation,
                patient_type, medical_condition, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(data.first_name.trim())
        .bind(data.last_name.trim())
        .bind(data.birth_date)
        .bind(&data.gender)
        .bind(&data.national_id)
        .bind(&data.phone)
        .bind(&data.address)
        .bind(&data.city)
        .bind(&data.guardian_name)
        .bind(&data.guardian_phone)
        .bind(&data.guardian_relation)
        .bind(data.patient_type.unwrap_or(PatientType::General))
        .bind(&data.medical_condition)
        .bind(&data.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update a patient
    pub async fn update(&self, id: i32, data: &UpdatePatient) -> AppResult<Patient> {
        let mut builder = QueryBuilder::new("UPDATE patients SET updated_at = NOW()");
        push_set(&mut builder, "first_name", data.first_name.as_deref().map(str::trim));
        push_set(&mut builder, "last_name", data.last_name.as_deref().map(str::trim));
        push_set(&mut builder, "birth_date", data.birth_date);
        push_set(&mut builder, "gender", data.gender.as_deref());
        push_set(&mut builder, "national_id", data.national_id.as_deref());
        push_set(&mut builder, "phone", data.phone.as_deref());
        push_set(&mut builder, "address", data.address.as_deref());
        push_set(&mut builder, "city", data.city.as_deref());
        push_set(&mut builder, "guardian_name", data.guardian_name.as_deref());
        push_set(&mut builder, "guardian_phone", data.guardian_phone.as_deref());
        push_set(&mut builder, "guardian_relation", data.guardian_relation.as_deref());
        push_set(&mut builder, "patient_type", data.patient_type);
        push_set(&mut builder, "medical_condition", data.medical_condition.as_deref());
        push_set(&mut builder, "notes", data.notes.as_deref());
        builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        builder
            .build_query_as::<Patient>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Delete a patient without active loans, together with their closed loans.
    ///
    /// Returns the stored file paths so the caller can remove them from disk.
    pub async fn delete(&self, id: i32) -> AppResult<Vec<String>> {
        let mut tx = self.pool.begin().await?;

        let files: Vec<String> =
            sqlx::query_scalar("SELECT files FROM patients WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| not_found(id))?;

        let active_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE patient_id = $1 AND status = 'active'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        ensure_patient_deletable(id, active_loans)?;

        sqlx::query("DELETE FROM loans WHERE patient_id = $1 AND status <> 'active'")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(patient_id = id, "Patient deleted");
        Ok(files)
    }

    /// Append an uploaded file path unless already attached
    pub async fn add_file(&self, id: i32, path: &str) -> AppResult<Patient> {
        sqlx::query_as::<_, Patient>(
            r#"
            UPDATE patients
            SET files = CASE WHEN $2 = ANY(files) THEN files ELSE array_append(files, $2) END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    /// Remove a file path; fails if the patient does not reference it
    pub async fn remove_file(&self, id: i32, path: &str) -> AppResult<Patient> {
        let patient = self.get_by_id(id).await?;
        if !patient.files.iter().any(|f| f == path) {
            return Err(AppError::NotFound(format!(
                "File {} is not attached to patient {}",
                path, id
            )));
        }

        sqlx::query_as::<_, Patient>(
            r#"
            UPDATE patients
            SET files = array_remove(files, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }
}
