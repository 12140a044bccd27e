use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{NotFoundReason, SessionStoreError};
use crate::paths::{
    sanitize_session_id, session_file_name, session_identity, session_root, SESSION_ID_ENV_VAR,
};
use crate::schema::{SessionKind, SessionRecord};

/// Records older than this are ignored on load.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// File-backed store keyed by (terminal session, session kind).
///
/// Each key maps to one JSON file under `root`. Writes go to a sibling
/// temporary file that is flushed and renamed over the target, so a reader
/// never observes a half-written record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStore {
    root: PathBuf,
    session_id: String,
    max_age: Duration,
}

impl SessionStore {
    /// Creates a store rooted at `root`. A missing or blank `session_id`
    /// selects the shared fallback identifier.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, session_id: Option<String>) -> Self {
        Self {
            root: root.into(),
            session_id: sanitize_session_id(session_id.as_deref().unwrap_or_default()),
            max_age: DEFAULT_MAX_AGE,
        }
    }

    /// Creates a store in the host temporary directory keyed by the
    /// terminal session identifier from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(session_root(), std::env::var(SESSION_ID_ENV_VAR).ok())
    }

    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    #[must_use]
    pub fn identity(&self, kind: SessionKind) -> String {
        session_identity(&self.session_id, kind)
    }

    #[must_use]
    pub fn resolve_location(&self, kind: SessionKind) -> PathBuf {
        self.root.join(session_file_name(&self.session_id, kind))
    }

    /// Loads the record for `kind`, judging expiry against the current time.
    pub fn load(&self, kind: SessionKind) -> Result<SessionRecord, SessionStoreError> {
        self.load_at(kind, OffsetDateTime::now_utc())
    }

    /// Loads the record for `kind`, judging expiry against `now`.
    ///
    /// Any record that cannot be used (absent, unreadable, malformed, of the
    /// wrong kind, or older than the maximum age) yields `NotFound`. Records
    /// without a creation time have unknown age and are accepted.
    pub fn load_at(
        &self,
        kind: SessionKind,
        now: OffsetDateTime,
    ) -> Result<SessionRecord, SessionStoreError> {
        let path = self.resolve_location(kind);

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(SessionStoreError::not_found(path, NotFoundReason::Missing));
            }
            Err(error) => {
                return Err(SessionStoreError::not_found(
                    path,
                    NotFoundReason::Unreadable(error.to_string()),
                ));
            }
        };

        let mut record: SessionRecord = serde_json::from_str(&contents).map_err(|error| {
            SessionStoreError::not_found(&path, NotFoundReason::Corrupt(error.to_string()))
        })?;

        if record.kind != kind {
            return Err(SessionStoreError::not_found(
                path,
                NotFoundReason::Corrupt(format!(
                    "expected a {kind} record, found {}",
                    record.kind
                )),
            ));
        }

        if let Some(created_at) = record.created_at {
            let age = now - created_at;
            let max_age_secs = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
            if age > time::Duration::seconds(max_age_secs) {
                return Err(SessionStoreError::not_found(
                    path,
                    NotFoundReason::Expired {
                        age_secs: age.whole_seconds(),
                    },
                ));
            }
        }

        if record.identity.trim().is_empty() {
            record.identity = self.identity(kind);
        }

        tracing::debug!(path = %path.display(), kind = %kind, "restored session record");
        Ok(record.normalized())
    }

    /// Writes `record` to the location for its kind, replacing any previous
    /// record. Transient records are never written.
    pub fn save(&self, record: &SessionRecord) -> Result<(), SessionStoreError> {
        if record.transient {
            return Ok(());
        }

        let path = self.resolve_location(record.kind);
        let mut contents = serde_json::to_vec_pretty(record)
            .map_err(|error| SessionStoreError::json_serialize(&path, error))?;
        contents.push(b'\n');

        self.write_atomically(&path, &contents)?;
        tracing::debug!(path = %path.display(), kind = %record.kind, "saved session record");
        Ok(())
    }

    /// Deletes the record for `kind`. Returns whether a file was removed.
    pub fn remove(&self, kind: SessionKind) -> Result<bool, SessionStoreError> {
        let path = self.resolve_location(kind);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
            Err(error) => Err(SessionStoreError::io("removing session file", path, error)),
        }
    }

    fn write_atomically(&self, path: &Path, contents: &[u8]) -> Result<(), SessionStoreError> {
        fs::create_dir_all(&self.root).map_err(|error| {
            SessionStoreError::io("creating session directory", &self.root, error)
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = self
            .root
            .join(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));

        let written = File::create(&temp_path)
            .and_then(|mut file| {
                file.write_all(contents)?;
                file.sync_all()
            })
            .map_err(|error| SessionStoreError::io("writing session file", &temp_path, error));

        let result = written.and_then(|()| {
            fs::rename(&temp_path, path)
                .map_err(|error| SessionStoreError::io("replacing session file", path, error))
        });

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }

        result
    }
}
