//! User model and related functionality

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// User entity including the password hash.
///
/// Never serialized: use [`Profile`] for anything leaving the service.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub roles: Vec<Role>,
}

impl User {
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            roles: self.roles.clone(),
        }
    }
}

/// User-facing view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub roles: Vec<Role>,
}

impl Profile {
    pub fn has_role(&self, role_name: &str) -> bool {
        self.roles.iter().any(|role| role.name == role_name)
    }
}

/// New user creation payload, password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// Profile update payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub email: Option<String>,
}
