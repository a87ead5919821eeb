//! Application role repository.

use sqlx::PgPool;

use rebuild_together_core::{DonorId, UserRole};

use super::RepositoryError;

/// Repository for `user_roles` operations.
pub struct RoleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RoleRepository<'a> {
    /// Create a new role repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Check whether a user holds a role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_role(&self, user_id: DonorId, role: UserRole) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM user_roles WHERE user_id = $1 AND role = $2)",
        )
        .bind(user_id)
        .bind(role)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// All roles held by a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn roles_for(&self, user_id: DonorId) -> Result<Vec<UserRole>, RepositoryError> {
        let roles = sqlx::query_scalar::<_, UserRole>(
            "SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(roles)
    }

    /// Grant a role. Returns `false` if the user already had it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn grant(&self, user_id: DonorId, role: UserRole) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO user_roles (user_id, role) VALUES ($1, $2) \
             ON CONFLICT (user_id, role) DO NOTHING",
        )
        .bind(user_id)
        .bind(role)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Revoke a role. Returns `false` if the user didn't have it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revoke(&self, user_id: DonorId, role: UserRole) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role = $2")
            .bind(user_id)
            .bind(role)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
