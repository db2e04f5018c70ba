//! Environment-driven configuration.
//!
//! # Invariants
//! - `FILEHUB_DATA_DIR` is required and non-blank.
//! - The admin seed is all-or-nothing across its three variables.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DATA_DIR_VAR: &str = "FILEHUB_DATA_DIR";
pub const LOG_LEVEL_VAR: &str = "FILEHUB_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "FILEHUB_LOG_DIR";
pub const ADMIN_USERNAME_VAR: &str = "FILEHUB_ADMIN_USERNAME";
pub const ADMIN_EMAIL_VAR: &str = "FILEHUB_ADMIN_EMAIL";
pub const ADMIN_PASSWORD_VAR: &str = "FILEHUB_ADMIN_PASSWORD";

/// Credentials for the first admin account.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
    /// File logging is disabled when unset.
    pub log_dir: Option<PathBuf>,
    pub admin_seed: Option<AdminSeed>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    /// Some but not all admin seed variables were set.
    PartialAdminSeed { missing: Vec<&'static str> },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(var) => write!(f, "missing required environment variable `{var}`"),
            Self::PartialAdminSeed { missing } => write!(
                f,
                "admin seed is incomplete; missing {}",
                missing.join(", ")
            ),
        }
    }
}

impl Error for ConfigError {}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`. Blank values count as unset.
    ///
    /// Values are trimmed, except `FILEHUB_ADMIN_PASSWORD`, which is kept
    /// byte for byte so the seeded admin logs in with exactly that string.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let data_dir = read(DATA_DIR_VAR)
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing(DATA_DIR_VAR))?;
        let log_level = read(LOG_LEVEL_VAR).unwrap_or_else(|| default_log_level().to_string());
        let log_dir = read(LOG_DIR_VAR).map(PathBuf::from);

        let seed_vars = [ADMIN_USERNAME_VAR, ADMIN_EMAIL_VAR, ADMIN_PASSWORD_VAR];
        let seed_values = [
            read(ADMIN_USERNAME_VAR),
            read(ADMIN_EMAIL_VAR),
            lookup(ADMIN_PASSWORD_VAR).filter(|value| !value.trim().is_empty()),
        ];
        let admin_seed = match seed_values {
            [Some(username), Some(email), Some(password)] => Some(AdminSeed {
                username,
                email,
                password,
            }),
            [None, None, None] => None,
            partial => {
                let missing = seed_vars
                    .iter()
                    .zip(partial.iter())
                    .filter(|(_, value)| value.is_none())
                    .map(|(name, _)| *name)
                    .collect();
                return Err(ConfigError::PartialAdminSeed { missing });
            }
        };

        Ok(Self {
            data_dir,
            log_level,
            log_dir,
            admin_seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ADMIN_EMAIL_VAR, ADMIN_PASSWORD_VAR, DATA_DIR_VAR};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn data_dir_is_required() {
        let error = CoreConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(error, ConfigError::Missing(DATA_DIR_VAR));

        let blank = CoreConfig::from_lookup(lookup(&[("FILEHUB_DATA_DIR", "  ")])).unwrap_err();
        assert_eq!(blank, ConfigError::Missing(DATA_DIR_VAR));
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[("FILEHUB_DATA_DIR", "/srv/filehub")]))
            .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/filehub"));
        assert!(!config.log_level.is_empty());
        assert_eq!(config.log_dir, None);
        assert_eq!(config.admin_seed, None);
    }

    #[test]
    fn full_admin_seed_is_loaded() {
        let config = CoreConfig::from_lookup(lookup(&[
            ("FILEHUB_DATA_DIR", "/srv/filehub"),
            ("FILEHUB_LOG_LEVEL", "warn"),
            ("FILEHUB_LOG_DIR", "/var/log/filehub"),
            ("FILEHUB_ADMIN_USERNAME", "admin"),
            ("FILEHUB_ADMIN_EMAIL", "admin@example.com"),
            ("FILEHUB_ADMIN_PASSWORD", "admin123"),
        ]))
        .unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/filehub")));
        let seed = config.admin_seed.unwrap();
        assert_eq!(seed.username, "admin");
        assert!(!format!("{seed:?}").contains("admin123"));
    }

    #[test]
    fn admin_password_keeps_surrounding_whitespace() {
        let config = CoreConfig::from_lookup(lookup(&[
            ("FILEHUB_DATA_DIR", "/srv/filehub"),
            ("FILEHUB_ADMIN_USERNAME", " admin "),
            ("FILEHUB_ADMIN_EMAIL", "admin@example.com"),
            ("FILEHUB_ADMIN_PASSWORD", " pass phrase "),
        ]))
        .unwrap();
        let seed = config.admin_seed.unwrap();
        assert_eq!(seed.username, "admin");
        assert_eq!(seed.password, " pass phrase ");

        let blank = CoreConfig::from_lookup(lookup(&[
            ("FILEHUB_DATA_DIR", "/srv/filehub"),
            ("FILEHUB_ADMIN_USERNAME", "admin"),
            ("FILEHUB_ADMIN_EMAIL", "admin@example.com"),
            ("FILEHUB_ADMIN_PASSWORD", "   "),
        ]))
        .unwrap_err();
        assert_eq!(
            blank,
            ConfigError::PartialAdminSeed {
                missing: vec![ADMIN_PASSWORD_VAR]
            }
        );
    }

    #[test]
    fn partial_admin_seed_is_rejected() {
        let error = CoreConfig::from_lookup(lookup(&[
            ("FILEHUB_DATA_DIR", "/srv/filehub"),
            ("FILEHUB_ADMIN_USERNAME", "admin"),
            ("FILEHUB_ADMIN_PASSWORD", "admin123"),
        ]))
        .unwrap_err();
        assert_eq!(
            error,
            ConfigError::PartialAdminSeed {
                missing: vec![ADMIN_EMAIL_VAR]
            }
        );
    }
}
