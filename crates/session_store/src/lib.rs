mod error;
mod paths;
mod schema;
mod store;

pub use error::{NotFoundReason, SessionStoreError};
pub use paths::{
    sanitize_session_id, session_file_name, session_identity, session_root, SESSION_ID_ENV_VAR,
    SHARED_SESSION_ID,
};
pub use schema::{
    SessionKind, SessionRecord, SessionStatus, DEFAULT_STOP_SEQUENCE, DEFAULT_TEMPERATURE,
};
pub use store::{SessionStore, DEFAULT_MAX_AGE};
