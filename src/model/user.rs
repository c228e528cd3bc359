use serde::{Deserialize, Serialize};

/// Name of the collection holding user profiles, keyed by auth uid
pub const USERS: &str = "users";

/// Profile document written at sign-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub uid: String,
}

/// Profile plus task counts, as shown on the profile screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    #[serde(flatten)]
    pub user: UserProfile,
    pub total_tasks: usize,
    pub completed_tasks: usize,
}
