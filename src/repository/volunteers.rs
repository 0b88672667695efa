//! Volunteers repository

use sqlx::{Pool, Postgres, QueryBuilder};

use super::{like_pattern, push_set, Filters};
use crate::{
    error::{AppError, AppResult},
    models::volunteer::{CreateVolunteer, UpdateVolunteer, Volunteer, VolunteerQuery, VolunteerStatus},
};

#[derive(Clone)]
pub struct VolunteersRepository {
    pool: Pool<Postgres>,
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Volunteer {} not found", id))
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a VolunteerQuery) {
    let mut filters = Filters::new();

    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        filters.next(builder);
        builder
            .push("(first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR phone ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(status) = query.status {
        filters.next(builder);
        builder.push("status = ").push_bind(status);
    }
    if let Some(skill) = query.skill.as_deref().filter(|s| !s.trim().is_empty()) {
        filters.next(builder);
        builder
            .push("EXISTS (SELECT 1 FROM unnest(skills) s WHERE LOWER(s) = LOWER(")
            .push_bind(skill.trim())
            .push("))");
    }
}

impl VolunteersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &VolunteerQuery) -> AppResult<(Vec<Volunteer>, i64)> {
        let page = query.pagination();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM volunteers");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM volunteers");
        push_filters(&mut select, query);
        select
            .push(" ORDER BY last_name, first_name, id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select.build_query_as::<Volunteer>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Volunteer> {
        sqlx::query_as::<_, Volunteer>("SELECT * FROM volunteers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, data: &CreateVolunteer) -> AppResult<Volunteer> {
        let row = sqlx::query_as::<_, Volunteer>(
            r#"
            INSERT INTO volunteers (
                first_name, last_name, email, phone, skills, availability,
                status, joined_at, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(data.first_name.trim())
        .bind(data.last_name.trim())
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.skills)
        .bind(&data.availability)
        .bind(data.status.unwrap_or(VolunteerStatus::Active))
        .bind(data.joined_at)
        .bind(&data.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: i32, data: &UpdateVolunteer) -> AppResult<Volunteer> {
        let mut builder = QueryBuilder::new("UPDATE volunteers SET updated_at = NOW()");
        push_set(&mut builder, "first_name", data.first_name.as_deref().map(str::trim));
        push_set(&mut builder, "last_name", data.last_name.as_deref().map(str::trim));
        push_set(&mut builder, "email", data.email.as_deref());
        push_set(&mut builder, "phone", data.phone.as_deref());
        push_set(&mut builder, "skills", data.skills.as_ref());
        push_set(&mut builder, "availability", data.availability.as_deref());
        push_set(&mut builder, "status", data.status);
        push_set(&mut builder, "joined_at", data.joined_at);
        push_set(&mut builder, "notes", data.notes.as_deref());
        builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        builder
            .build_query_as::<Volunteer>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM volunteers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
