//! Role model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Role every new account receives
pub const DEFAULT_ROLE: &str = "User";

/// Role that unlocks administration
pub const ADMIN_ROLE: &str = "Admin";

/// Role entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
}
