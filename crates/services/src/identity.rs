use std::collections::HashMap;

use tracing::info;

use quiz_core::model::UserId;

use crate::error::LoginError;

//
// ─── ACCOUNTS ──────────────────────────────────────────────────────────────────
//

/// Credentials and flags for one known user.
#[derive(Debug, Clone)]
pub struct UserAccount {
    password: String,
    persistence_exempt: bool,
}

impl UserAccount {
    #[must_use]
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            persistence_exempt: false,
        }
    }

    /// Marks the account as exempt from persistence: its progress is never
    /// loaded, saved, or reset, and answered slots never lock.
    #[must_use]
    pub fn persistence_exempt(mut self) -> Self {
        self.persistence_exempt = true;
        self
    }
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: UserId,
    pub persistence_exempt: bool,
}

//
// ─── DIRECTORY ─────────────────────────────────────────────────────────────────
//

/// In-process account directory backing the login gate.
///
/// Lookups are case-sensitive on the username, exactly as entered (after
/// trimming surrounding whitespace).
#[derive(Debug, Clone, Default)]
pub struct IdentityDirectory {
    accounts: HashMap<String, UserAccount>,
}

impl IdentityDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_account(mut self, username: impl Into<String>, account: UserAccount) -> Self {
        self.accounts.insert(username.into(), account);
        self
    }

    /// Checks a credential pair against the directory.
    ///
    /// Both fields are trimmed first; a blank field fails before any lookup,
    /// and an unknown user fails with the same error as a wrong password.
    ///
    /// # Errors
    ///
    /// `LoginError::MissingCredentials` when either field is blank,
    /// `LoginError::InvalidCredentials` otherwise on failure.
    pub fn verify(&self, username: &str, password: &str) -> Result<Identity, LoginError> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(LoginError::MissingCredentials);
        }

        let account = self
            .accounts
            .get(username)
            .ok_or(LoginError::InvalidCredentials)?;
        if account.password != password {
            return Err(LoginError::InvalidCredentials);
        }

        info!(user = username, "login accepted");
        Ok(Identity {
            user: UserId::from(username),
            persistence_exempt: account.persistence_exempt,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> IdentityDirectory {
        IdentityDirectory::new()
            .with_account("maria", UserAccount::new("segredo"))
            .with_account("bombeiro", UserAccount::new("resgate").persistence_exempt())
    }

    #[test]
    fn accepts_known_credentials() {
        let identity = directory().verify("maria", "segredo").unwrap();
        assert_eq!(identity.user.as_str(), "maria");
        assert!(!identity.persistence_exempt);
    }

    #[test]
    fn exempt_flag_travels_with_the_identity() {
        let identity = directory().verify("bombeiro", "resgate").unwrap();
        assert!(identity.persistence_exempt);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let identity = directory().verify("  maria  ", " segredo ").unwrap();
        assert_eq!(identity.user.as_str(), "maria");
    }

    #[test]
    fn blank_fields_fail_before_lookup() {
        assert_eq!(
            directory().verify("   ", "segredo").unwrap_err(),
            LoginError::MissingCredentials
        );
        assert_eq!(
            directory().verify("maria", "").unwrap_err(),
            LoginError::MissingCredentials
        );
    }

    #[test]
    fn unknown_user_and_wrong_password_look_alike() {
        assert_eq!(
            directory().verify("someone", "segredo").unwrap_err(),
            LoginError::InvalidCredentials
        );
        assert_eq!(
            directory().verify("maria", "errada").unwrap_err(),
            LoginError::InvalidCredentials
        );
    }
}
