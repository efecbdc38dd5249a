//! Static credential verification.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Access level granted to a logged-in user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May edit both artifacts.
    Admin,
    /// May edit subscriptions and trigger the push process.
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// Checks a username/password pair and yields the user's role.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> Option<Role>;
}

struct Account {
    password: String,
    role: Role,
}

/// Fixed in-memory credential table.
#[derive(Default)]
pub struct StaticCredentials {
    accounts: HashMap<String, Account>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an account.
    pub fn with_account(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        role: Role,
    ) -> Self {
        self.accounts.insert(
            username.into(),
            Account {
                password: password.into(),
                role,
            },
        );
        self
    }

    /// Build the default `admin` / `user` table. A `None` password disables that account.
    pub fn from_passwords(admin_password: Option<&str>, user_password: Option<&str>) -> Self {
        let mut creds = Self::new();
        if let Some(password) = admin_password {
            creds = creds.with_account("admin", password, Role::Admin);
        }
        if let Some(password) = user_password {
            creds = creds.with_account("user", password, Role::User);
        }
        creds
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> Option<Role> {
        let account = self.accounts.get(username)?;
        constant_time_compare(password, &account.password).then_some(account.role)
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
