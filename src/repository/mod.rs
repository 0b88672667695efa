//! Repository layer for database operations

pub mod donors;
pub mod equipment;
pub mod loans;
pub mod patients;
pub mod users;
pub mod volunteers;
pub mod zakat;

use sqlx::{Pool, Postgres, QueryBuilder};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub patients: patients::PatientsRepository,
    pub equipment: equipment::EquipmentRepository,
    pub loans: loans::LoansRepository,
    pub donors: donors::DonorsRepository,
    pub volunteers: volunteers::VolunteersRepository,
    pub zakat: zakat::ZakatRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            patients: patients::PatientsRepository::new(pool.clone()),
            equipment: equipment::EquipmentRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            donors: donors::DonorsRepository::new(pool.clone()),
            volunteers: volunteers::VolunteersRepository::new(pool.clone()),
            zakat: zakat::ZakatRepository::new(pool.clone()),
            pool,
        }
    }

    /// Check database connectivity
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// `%term%` pattern for ILIKE searches, with LIKE wildcards escaped
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Appends `WHERE`/`AND` between successive filter clauses
pub(crate) struct Filters {
    any: bool,
}

impl Filters {
    pub fn new() -> Self {
        Self { any: false }
    }

    pub fn next<'a>(&mut self, builder: &mut QueryBuilder<'a, Postgres>) {
        builder.push(if self.any { " AND " } else { " WHERE " });
        self.any = true;
    }
}

/// Appends `, column = $n` when the value is present.
///
/// Update statements start with `SET updated_at = NOW()` so every optional
/// assignment is comma-prefixed.
pub(crate) fn push_set<'a, T>(builder: &mut QueryBuilder<'a, Postgres>, column: &str, value: Option<T>)
where
    T: 'a + Send + sqlx::Encode<'a, Postgres> + sqlx::Type<Postgres>,
{
    if let Some(value) = value {
        builder.push(", ");
        builder.push(column);
        builder.push(" = ");
        builder.push_bind(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" fauteuil "), "%fauteuil%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_filters_and_push_set_build_sql() {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM t");
        let mut filters = Filters::new();
        filters.next(&mut builder);
        builder.push("a = ").push_bind(1);
        filters.next(&mut builder);
        builder.push("b = ").push_bind("x");
        assert_eq!(builder.sql(), "SELECT * FROM t WHERE a = $1 AND b = $2");

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE t SET updated_at = NOW()");
        push_set(&mut builder, "name", Some("n".to_string()));
        push_set::<i32>(&mut builder, "skipped", None);
        push_set(&mut builder, "qty", Some(3));
        assert_eq!(builder.sql(), "UPDATE t SET updated_at = NOW(), name = $1, qty = $2");
    }
}
