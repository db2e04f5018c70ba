//! User account entity.
//!
//! # Invariants
//! - `password_hash` is a PHC hash string, never caller plaintext.
//! - `username` and `email` are unique across the user partition. The
//!   repository enforces this at write time.

use super::Entity;
use crate::store::{EntityKind, Record};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

/// Access level of a user account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// Stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub const USERNAME: &'static str = "username";
    pub const EMAIL: &'static str = "email";
    pub const PASSWORD_HASH: &'static str = "passwordHash";
    pub const ROLE: &'static str = "role";

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;
}

/// Input for creating a user. `password` is plaintext and is hashed by the
/// repository before anything is persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl NewUser {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            role: Role::User,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

// Plaintext stays out of logs and panic messages.
impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Partial user update. `None` leaves the field unchanged.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    /// Plaintext; re-hashed by the repository.
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl std::fmt::Debug for UserPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPatch")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .finish()
    }
}

/// Builds the stored record for a validated user, without `id`/timestamps.
pub(crate) fn user_record(username: &str, email: &str, password_hash: &str, role: Role) -> Record {
    let mut record = Record::new();
    record.insert(User::USERNAME, username);
    record.insert(User::EMAIL, email);
    record.insert(User::PASSWORD_HASH, password_hash);
    record.insert(User::ROLE, role.as_str());
    record
}
