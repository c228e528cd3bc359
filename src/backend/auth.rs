use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use argon2::password_hash::{PasswordHash, SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::io::atomic::write_atomic;
use crate::io::lock::{LockError, StoreLock};
use crate::io::session::{Session, clear_session, read_session, write_session};

pub const ACCOUNTS_FILE: &str = "auth.json";
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// An authenticated identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
}

/// Error type for authentication calls
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email format, please enter a valid email")]
    InvalidEmail,
    #[error("this email is already registered, try logging in")]
    EmailAlreadyInUse,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,
    #[error("invalid credentials or user does not exist")]
    InvalidCredentials,
    #[error("could not hash password: {0}")]
    Hash(String),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt accounts file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// Account management and the signed-in session
pub trait AuthProvider: Send + Sync {
    /// Register a new account. Does not sign it in.
    fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Check credentials and make the account the current user
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    fn current_user(&self) -> Option<AuthUser>;

    fn sign_out(&self) -> Result<(), AuthError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AccountsFile {
    #[serde(default)]
    accounts: Vec<Account>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    uid: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

/// Accounts stored in `auth.json` with argon2 password hashes, and the
/// session in `.session.json`, both inside the data directory.
pub struct LocalAuth {
    data_dir: PathBuf,
    hasher: Argon2<'static>,
}

impl LocalAuth {
    pub fn new(data_dir: &Path) -> Self {
        LocalAuth {
            data_dir: data_dir.to_path_buf(),
            hasher: Argon2::default(),
        }
    }

    /// Minimum-cost hashing so tests don't spend seconds per account
    #[cfg(test)]
    pub(crate) fn fast_for_tests(data_dir: &Path) -> Self {
        use argon2::{Algorithm, Params, Version};
        let params = Params::new(8, 1, 1, None).expect("valid argon2 params");
        LocalAuth {
            data_dir: data_dir.to_path_buf(),
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    fn accounts_path(&self) -> PathBuf {
        self.data_dir.join(ACCOUNTS_FILE)
    }

    fn read_accounts(&self) -> Result<AccountsFile, AuthError> {
        let path = self.accounts_path();
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(AccountsFile::default());
            }
            Err(e) => return Err(AuthError::ReadError { path, source: e }),
        };
        serde_json::from_str(&text).map_err(|e| AuthError::Corrupt { path, source: e })
    }

    fn write_accounts(&self, accounts: &AccountsFile) -> Result<(), AuthError> {
        let path = self.accounts_path();
        let write_err = |source: std::io::Error| AuthError::WriteError {
            path: path.clone(),
            source,
        };
        let text = serde_json::to_string_pretty(accounts).map_err(|e| write_err(e.into()))?;
        write_atomic(&path, text.as_bytes()).map_err(write_err)
    }

    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::Hash(e.to_string()))
    }

    fn verify_password(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .hasher
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Lookup key for an email address
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthProvider for LocalAuth {
    fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = normalize_email(email);
        if !EMAIL_RE.is_match(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let _lock = StoreLock::acquire_default(&self.data_dir)?;
        let mut accounts = self.read_accounts()?;
        if accounts.accounts.iter().any(|a| a.email == email) {
            return Err(AuthError::EmailAlreadyInUse);
        }

        let account = Account {
            uid: uuid::Uuid::new_v4().simple().to_string(),
            email: email.clone(),
            password_hash: self.hash_password(password)?,
            created_at: Utc::now(),
        };
        let user = AuthUser {
            uid: account.uid.clone(),
            email,
        };
        accounts.accounts.push(account);
        self.write_accounts(&accounts)?;
        tracing::info!(uid = %user.uid, "account created");
        Ok(user)
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = normalize_email(email);
        let accounts = self.read_accounts()?;
        let account = accounts
            .accounts
            .iter()
            .find(|a| a.email == email)
            .ok_or(AuthError::InvalidCredentials)?;
        if !self.verify_password(password, &account.password_hash) {
            tracing::info!(uid = %account.uid, "sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let session = Session {
            uid: account.uid.clone(),
            email: account.email.clone(),
            signed_in_at: Utc::now(),
        };
        write_session(&self.data_dir, &session).map_err(|e| AuthError::WriteError {
            path: self.data_dir.clone(),
            source: e,
        })?;
        tracing::info!(uid = %session.uid, "signed in");
        Ok(AuthUser {
            uid: session.uid,
            email: session.email,
        })
    }

    fn current_user(&self) -> Option<AuthUser> {
        read_session(&self.data_dir).map(|s| AuthUser {
            uid: s.uid,
            email: s.email,
        })
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        clear_session(&self.data_dir).map_err(|e| AuthError::WriteError {
            path: self.data_dir.clone(),
            source: e,
        })
    }
}
