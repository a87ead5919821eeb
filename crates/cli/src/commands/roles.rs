//! Role management commands.
//!
//! # Usage
//!
//! ```bash
//! rt-cli roles grant --user <uuid> --role admin
//! rt-cli roles revoke --user <uuid> --role admin
//! ```
//!
//! The user must already exist in Supabase auth; roles are keyed by the
//! auth user id.

use rebuild_together_core::{DonorId, UserRole};
use rebuild_together_server::db::RoleRepository;

use super::{CommandError, connect};

fn parse_args(user: &str, role: &str) -> Result<(DonorId, UserRole), CommandError> {
    let user_id: DonorId = user
        .parse()
        .map_err(|_| CommandError::InvalidArgument(format!("Invalid user id: {user}")))?;
    let role: UserRole = role.parse().map_err(|_| {
        CommandError::InvalidArgument(format!("Invalid role: {role}. Valid roles: admin, donor"))
    })?;
    Ok((user_id, role))
}

/// Grant `role` to `user`.
pub async fn grant(user: &str, role: &str) -> Result<(), CommandError> {
    let (user_id, role) = parse_args(user, role)?;
    let pool = connect().await?;

    if RoleRepository::new(&pool).grant(user_id, role).await? {
        tracing::info!(%user_id, %role, "Role granted");
    } else {
        tracing::info!(%user_id, %role, "User already has role");
    }
    Ok(())
}

/// Revoke `role` from `user`.
pub async fn revoke(user: &str, role: &str) -> Result<(), CommandError> {
    let (user_id, role) = parse_args(user, role)?;
    let pool = connect().await?;

    if RoleRepository::new(&pool).revoke(user_id, role).await? {
        tracing::info!(%user_id, %role, "Role revoked");
    } else {
        tracing::warn!(%user_id, %role, "User did not have role");
    }
    Ok(())
}
