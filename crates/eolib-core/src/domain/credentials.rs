//! Repository account credentials.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials for a remote repository account.
///
/// The secret is redacted from `Debug` output so credentials can be carried
/// inside job structs that are logged with `tracing`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    username: String,
    secret: String,
}

impl Credentials {
    /// Create new credentials.
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    /// Get the account username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the account secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Key identifying this account in permit-registry lookups.
    ///
    /// Two credential values with the same username share concurrency
    /// permits on a repository.
    #[must_use]
    pub fn account_key(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}
