//! Account use-cases: registration, credential checks, admin seeding.

use crate::config::AdminSeed;
use crate::model::user::{NewUser, Role, User};
use crate::query::Predicate;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoResult;
use log::info;

/// Account service facade over the user repository.
pub struct AccountService<'store> {
    users: UserRepository<'store>,
}

impl<'store> AccountService<'store> {
    pub fn new(users: UserRepository<'store>) -> Self {
        Self { users }
    }

    /// Self-service registration. Always creates a `Role::User` account,
    /// whatever role the input carries.
    pub fn register(&self, new_user: &NewUser) -> RepoResult<User> {
        let user = self
            .users
            .create(&new_user.clone().with_role(Role::User))?;
        info!(
            "event=account_register module=account status=ok id={}",
            user.id
        );
        Ok(user)
    }

    /// Returns the user when `email` and `password` match, `None` otherwise.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub fn authenticate(&self, email: &str, password: &str) -> RepoResult<Option<User>> {
        let Some(user) = self.users.find_by_email(email)? else {
            return Ok(None);
        };
        if self.users.compare_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Creates an admin from `seed` unless some admin already exists.
    ///
    /// Returns the created admin, or `None` when one was already present.
    pub fn ensure_default_admin(&self, seed: &AdminSeed) -> RepoResult<Option<User>> {
        let admins = Predicate::new().eq(User::ROLE, Role::Admin.as_str());
        if self.users.find_one(&admins)?.is_some() {
            info!("event=admin_seed module=account status=skipped reason=admin_exists");
            return Ok(None);
        }

        let admin = self.users.create(
            &NewUser::new(&seed.username, &seed.email, &seed.password).with_role(Role::Admin),
        )?;
        info!(
            "event=admin_seed module=account status=ok id={}",
            admin.id
        );
        Ok(Some(admin))
    }
}
