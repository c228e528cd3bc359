use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::atomic::write_atomic;

/// Name of the session file inside the data directory
pub const SESSION_FILE: &str = ".session.json";

/// The signed-in user, persisted between `tm` invocations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Read the session file. Missing or unreadable means signed out.
pub fn read_session(data_dir: &Path) -> Option<Session> {
    let content = fs::read_to_string(data_dir.join(SESSION_FILE)).ok()?;
    serde_json::from_str(&content).ok()
}

pub fn write_session(data_dir: &Path, session: &Session) -> Result<(), std::io::Error> {
    let content = serde_json::to_string_pretty(session)?;
    write_atomic(&data_dir.join(SESSION_FILE), content.as_bytes())
}

/// Remove the session file. Already signed out is not an error.
pub fn clear_session(data_dir: &Path) -> Result<(), std::io::Error> {
    match fs::remove_file(data_dir.join(SESSION_FILE)) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_read_clear() {
        let dir = TempDir::new().unwrap();
        let session = Session {
            uid: "u1".into(),
            email: "a@b.co".into(),
            signed_in_at: Utc::now(),
        };
        write_session(dir.path(), &session).unwrap();
        assert_eq!(read_session(dir.path()), Some(session));

        clear_session(dir.path()).unwrap();
        assert!(read_session(dir.path()).is_none());
        clear_session(dir.path()).unwrap();
    }

    #[test]
    fn malformed_file_reads_as_signed_out() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SESSION_FILE), "not json {{{").unwrap();
        assert!(read_session(dir.path()).is_none());
    }

    #[test]
    fn rewrite_replaces_the_whole_file() {
        let dir = TempDir::new().unwrap();
        let long = Session {
            uid: "u1".into(),
            email: "a-much-longer-address@example.com".into(),
            signed_in_at: Utc::now(),
        };
        let short = Session {
            uid: "u2".into(),
            email: "b@c.co".into(),
            signed_in_at: Utc::now(),
        };
        write_session(dir.path(), &long).unwrap();
        write_session(dir.path(), &short).unwrap();
        assert_eq!(read_session(dir.path()), Some(short));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
