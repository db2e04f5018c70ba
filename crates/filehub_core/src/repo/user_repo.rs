//! User repository.
//!
//! # Responsibility
//! - Validate account fields and enforce username/email uniqueness at write
//!   time.
//! - Hash plaintext passwords before anything reaches the store.
//!
//! # Invariants
//! - Plaintext passwords are never persisted and never returned.
//! - A write that would give two users the same username or email fails
//!   with `ValidationError` and leaves existing records untouched.
//! - Uniqueness scans fail closed: an undecodable user record matching the
//!   username or email is `InvalidData`, never silently ignored.

use super::collection::Collection;
use super::{RepoError, RepoResult};
use crate::model::user::{user_record, NewUser, User, UserId, UserPatch};
use crate::model::validation::{self, ValidationError};
use crate::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use crate::query::Predicate;
use crate::store::{Record, RecordStore, UpdateResult};
use std::collections::HashSet;

pub const USERNAME_MAX: usize = 50;

/// Typed facade over the `users` partition.
#[derive(Clone, Copy)]
pub struct UserRepository<'store> {
    users: Collection<'store, User>,
}

impl<'store> UserRepository<'store> {
    pub fn new(store: &'store RecordStore) -> Self {
        Self {
            users: Collection::new(store),
        }
    }

    /// Creates one user after validation, uniqueness checks and hashing.
    ///
    /// # Errors
    /// - `RepoError::Validation` for invalid fields or a taken
    ///   username/email.
    /// - `RepoError::PasswordHash` when hashing fails.
    /// - `RepoError::Store` when the write fails.
    pub fn create(&self, new_user: &NewUser) -> RepoResult<User> {
        let username = validation::required_text("username", &new_user.username, USERNAME_MAX)?;
        let email = validation::email(&new_user.email)?;
        validation::password(&new_user.password, MIN_PASSWORD_LEN)?;

        self.ensure_unique(Some(&username), Some(&email), &HashSet::new())?;

        let password_hash = hash_password(&new_user.password)?;
        self.users.insert(user_record(
            &username,
            &email,
            &password_hash,
            new_user.role,
        ))
    }

    pub fn find_all(&self, predicate: &Predicate) -> RepoResult<Vec<User>> {
        self.users.find_all(predicate)
    }

    pub fn find_one(&self, predicate: &Predicate) -> RepoResult<Option<User>> {
        self.users.find_one(predicate)
    }

    pub fn find_by_pk(&self, id: UserId) -> RepoResult<Option<User>> {
        self.users.find_by_pk(id)
    }

    pub fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.users
            .find_one(&Predicate::new().eq(User::EMAIL, email.trim()))
    }

    /// Applies `patch` to every user matching `predicate`.
    ///
    /// A supplied password is re-hashed. Setting a username or email is
    /// rejected when another user owns it, or when the predicate selects
    /// more than one user. When it selects none, nothing is checked or
    /// written.
    pub fn update(
        &self,
        patch: &UserPatch,
        predicate: &Predicate,
    ) -> RepoResult<UpdateResult<User>> {
        let username = patch
            .username
            .as_deref()
            .map(|value| validation::required_text("username", value, USERNAME_MAX))
            .transpose()?;
        let email = patch.email.as_deref().map(validation::email).transpose()?;
        if let Some(password) = &patch.password {
            validation::password(password, MIN_PASSWORD_LEN)?;
        }

        if username.is_some() || email.is_some() {
            let targets: HashSet<UserId> = self
                .users
                .find_all_strict(predicate)?
                .into_iter()
                .map(|user| user.id)
                .collect();
            if targets.is_empty() {
                return Ok(UpdateResult::empty());
            }
            if targets.len() > 1 {
                if let Some(username) = &username {
                    return Err(ValidationError::DuplicateUsername(username.clone()).into());
                }
                if let Some(email) = &email {
                    return Err(ValidationError::DuplicateEmail(email.clone()).into());
                }
            }
            self.ensure_unique(username.as_deref(), email.as_deref(), &targets)?;
        }

        let mut record = Record::new();
        if let Some(username) = username {
            record.insert(User::USERNAME, username);
        }
        if let Some(email) = email {
            record.insert(User::EMAIL, email);
        }
        if let Some(password) = &patch.password {
            record.insert(User::PASSWORD_HASH, hash_password(password)?);
        }
        if let Some(role) = patch.role {
            record.insert(User::ROLE, role.as_str());
        }

        self.users.update(&record, predicate)
    }

    pub fn destroy(&self, predicate: &Predicate) -> RepoResult<usize> {
        self.users.destroy(predicate)
    }

    /// Checks `candidate` against a stored hash.
    ///
    /// Returns `Ok(false)` for a wrong password. Errors only when
    /// `stored_hash` is malformed.
    pub fn compare_password(&self, candidate: &str, stored_hash: &str) -> RepoResult<bool> {
        verify_password(candidate, stored_hash).map_err(RepoError::from)
    }

    pub fn count(&self) -> usize {
        self.users.count()
    }

    fn ensure_unique(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        allowed_owners: &HashSet<UserId>,
    ) -> RepoResult<()> {
        if let Some(username) = username {
            let owners = self
                .users
                .find_all_strict(&Predicate::new().eq(User::USERNAME, username))?;
            if owners.iter().any(|user| !allowed_owners.contains(&user.id)) {
                return Err(ValidationError::DuplicateUsername(username.to_string()).into());
            }
        }
        if let Some(email) = email {
            let owners = self
                .users
                .find_all_strict(&Predicate::new().eq(User::EMAIL, email))?;
            if owners.iter().any(|user| !allowed_owners.contains(&user.id)) {
                return Err(ValidationError::DuplicateEmail(email.to_string()).into());
            }
        }
        Ok(())
    }
}
