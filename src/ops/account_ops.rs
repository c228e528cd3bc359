use crate::backend::auth::{AuthError, AuthProvider};
use crate::backend::{BackendError, DocumentStore, Fields};
use crate::model::task::{TASKS, fields};
use crate::model::{ProfileSummary, USERS, UserProfile};

/// Error type for account operations
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("please enter your name")]
    MissingName,
    #[error("user data not found")]
    UserDataNotFound,
    #[error("not signed in, run `tm login` first")]
    NotSignedIn,
    #[error("corrupt profile for {uid}: {source}")]
    CorruptProfile {
        uid: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

fn profile_fields(profile: &UserProfile) -> Fields {
    let mut out = Fields::new();
    out.insert("name".into(), profile.name.clone().into());
    out.insert("email".into(), profile.email.clone().into());
    out.insert("uid".into(), profile.uid.clone().into());
    out
}

fn load_profile(store: &dyn DocumentStore, uid: &str) -> Result<Option<UserProfile>, AccountError> {
    let Some(doc) = store.get(USERS, uid)? else {
        return Ok(None);
    };
    serde_json::from_value(serde_json::Value::Object(doc.fields))
        .map(Some)
        .map_err(|source| AccountError::CorruptProfile {
            uid: uid.to_string(),
            source,
        })
}

/// Register an account and write its profile document. The new account is
/// not signed in.
pub fn sign_up(
    auth: &dyn AuthProvider,
    store: &dyn DocumentStore,
    name: &str,
    email: &str,
    password: &str,
) -> Result<UserProfile, AccountError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AccountError::MissingName);
    }
    let user = auth.create_account(email, password)?;
    let profile = UserProfile {
        name: name.to_string(),
        email: user.email,
        uid: user.uid,
    };
    store.set(USERS, &profile.uid, profile_fields(&profile))?;
    tracing::info!(uid = %profile.uid, "signed up");
    Ok(profile)
}

/// Check credentials, then make sure the account has a profile. An account
/// without one is signed straight back out.
pub fn log_in(
    auth: &dyn AuthProvider,
    store: &dyn DocumentStore,
    email: &str,
    password: &str,
) -> Result<UserProfile, AccountError> {
    let user = auth.sign_in(email, password)?;
    match load_profile(store, &user.uid) {
        Ok(Some(profile)) => {
            tracing::info!(uid = %profile.uid, "logged in");
            Ok(profile)
        }
        Ok(None) => {
            tracing::warn!(uid = %user.uid, "account has no profile document");
            auth.sign_out()?;
            Err(AccountError::UserDataNotFound)
        }
        Err(e) => {
            auth.sign_out()?;
            Err(e)
        }
    }
}

pub fn log_out(auth: &dyn AuthProvider) -> Result<(), AccountError> {
    auth.sign_out()?;
    tracing::info!("logged out");
    Ok(())
}

/// Profile of the signed-in user
pub fn current_profile(
    auth: &dyn AuthProvider,
    store: &dyn DocumentStore,
) -> Result<UserProfile, AccountError> {
    let user = auth.current_user().ok_or(AccountError::NotSignedIn)?;
    load_profile(store, &user.uid)?.ok_or(AccountError::UserDataNotFound)
}

/// Profile of the signed-in user with task totals
pub fn profile_summary(
    auth: &dyn AuthProvider,
    store: &dyn DocumentStore,
) -> Result<ProfileSummary, AccountError> {
    let user = current_profile(auth, store)?;
    let tasks = store.list(TASKS)?;
    let completed_tasks = tasks
        .documents
        .iter()
        .filter(|d| d.fields.get(fields::COMPLETED).and_then(|v| v.as_bool()) == Some(true))
        .count();
    Ok(ProfileSummary {
        user,
        total_tasks: tasks.documents.len(),
        completed_tasks,
    })
}
