use std::path::PathBuf;

use crate::schema::SessionKind;

/// Environment variable carrying the terminal session identifier.
pub const SESSION_ID_ENV_VAR: &str = "TERM_SESSION_ID";

/// Identifier used when no terminal session identifier is available.
pub const SHARED_SESSION_ID: &str = "shared";

/// Directory holding session records: the host's temporary-file area.
#[must_use]
pub fn session_root() -> PathBuf {
    std::env::temp_dir()
}

#[must_use]
pub fn sanitize_session_id(session_id: &str) -> String {
    let trimmed = session_id.trim();
    if trimmed.is_empty() {
        return SHARED_SESSION_ID.to_string();
    }

    trimmed
        .chars()
        .map(|c| match c {
            ':' | '/' | '\\' | ' ' => '-',
            _ => c,
        })
        .collect()
}

#[must_use]
pub fn session_identity(session_id: &str, kind: SessionKind) -> String {
    format!("{}-{}", sanitize_session_id(session_id), kind.as_str())
}

#[must_use]
pub fn session_file_name(session_id: &str, kind: SessionKind) -> String {
    format!("{}.json", session_identity(session_id, kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_path_unsafe_characters() {
        assert_eq!(
            sanitize_session_id("w0t1p0:6A1F/B2 x\\y"),
            "w0t1p0-6A1F-B2-x-y"
        );
    }

    #[test]
    fn blank_session_id_falls_back_to_shared() {
        assert_eq!(sanitize_session_id("   "), SHARED_SESSION_ID);
        assert_eq!(session_identity("", SessionKind::Chat), "shared-chat");
    }

    #[test]
    fn file_name_partitions_by_kind() {
        assert_eq!(session_file_name("abc", SessionKind::Chat), "abc-chat.json");
        assert_eq!(session_file_name("abc", SessionKind::Shell), "abc-shell.json");
    }
}
