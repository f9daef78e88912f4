//! Persistence boundary for [`User`] records.
//!
//! Core services depend on the [`UserStore`] port only; [`PgUserStore`] is
//! the production adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::user::{Role, User};

/// Filters for the admin user listing.
#[derive(Clone, Debug, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    /// Matched against full name, email and student id.
    pub search: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

/// Per-role account counts for the admin overview.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub total: i64,
    pub students: i64,
    pub teachers: i64,
    pub admins: i64,
}

/// Port for user persistence operations.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user.
    ///
    /// A uniqueness race on `email` lost at the database surfaces as
    /// [`ServerError::Conflict`], never as a bare SQL error.
    async fn insert(&self, user: &User) -> Result<()>;

    /// Find a user by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Find a user by (lowercased) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Persist every mutable field of `user`.
    async fn update(&self, user: &User) -> Result<()>;

    /// Delete a user.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// List users matching `filter`, newest first.
    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>>;

    /// Count accounts per role.
    async fn count_by_role(&self) -> Result<RoleCounts>;
}

/// PostgreSQL adapter for [`UserStore`].
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new [`PgUserStore`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, student_id, email, password_hash, full_name, \
    phone, country, occupation, profile_picture, role, preferred_language, \
    email_verified, profile_completion, created_at, updated_at";

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO users (id, student_id, email, password_hash, full_name,
                phone, country, occupation, profile_picture, role,
                preferred_language, email_verified, profile_completion)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
        )
        .bind(user.id)
        .bind(&user.student_id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(&user.country)
        .bind(&user.occupation)
        .bind(&user.profile_picture)
        .bind(user.role)
        .bind(&user.preferred_language)
        .bind(user.email_verified)
        .bind(user.profile_completion)
        .execute(&self.pool)
        .await
        .map_err(|err| match err.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => {
                ServerError::Conflict("email")
            },
            _ => err.into(),
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"UPDATE users
                SET password_hash = $1, full_name = $2, phone = $3, country = $4,
                    occupation = $5, profile_picture = $6, role = $7,
                    preferred_language = $8, email_verified = $9,
                    profile_completion = $10, updated_at = NOW()
                WHERE id = $11"#,
        )
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(&user.country)
        .bind(&user.occupation)
        .bind(&user.profile_picture)
        .bind(user.role)
        .bind(&user.preferred_language)
        .bind(user.email_verified)
        .bind(user.profile_completion)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<User>> {
        let mut query =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));

        if let Some(role) = filter.role {
            query.push(" AND role = ").push_bind(role);
        }
        if let Some(search) = filter.search.as_ref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{search}%");
            query
                .push(" AND (full_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR email ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR student_id ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        query
            .push(" ORDER BY created_at DESC OFFSET ")
            .push_bind(filter.skip)
            .push(" LIMIT ")
            .push_bind(filter.limit);

        let users = query
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn count_by_role(&self) -> Result<RoleCounts> {
        let rows = sqlx::query_as::<_, (Role, i64)>(
            "SELECT role, COUNT(*) FROM users GROUP BY role",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut counts = RoleCounts::default();
        for (role, count) in rows {
            counts.total += count;
            match role {
                Role::Student => counts.students = count,
                Role::Teacher => counts.teachers = count,
                Role::Admin => counts.admins = count,
            }
        }

        Ok(counts)
    }
}

#[cfg(test)]
pub use memory::MemoryUserStore;
