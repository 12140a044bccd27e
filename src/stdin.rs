//! Piped input detection.
//!
//! `echo "fix this" | mastermind explain` appends the piped text to the
//! prompt. An interactive stdin, or a pipe with nothing ready within the poll
//! window, contributes nothing.

use std::io::{self, IsTerminal, Read};
use std::time::Duration;

pub const STDIN_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Reads piped stdin when data becomes available within [`STDIN_POLL_TIMEOUT`].
pub fn read_piped_input() -> Option<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() || !stdin_ready(STDIN_POLL_TIMEOUT) {
        return None;
    }

    let mut input = String::new();
    if let Err(error) = stdin.lock().read_to_string(&mut input) {
        tracing::warn!(%error, "failed to read piped input");
        return None;
    }

    if input.trim().is_empty() {
        None
    } else {
        Some(input)
    }
}

/// Joins the positional words with spaces and appends piped input after a
/// blank line.
pub fn compose_prompt(words: &[String], piped: Option<&str>) -> String {
    let prompt = words.join(" ");
    let piped = piped.map(str::trim_end).filter(|text| !text.trim().is_empty());

    match piped {
        Some(text) if prompt.is_empty() => text.to_string(),
        Some(text) => format!("{prompt}\n\n{text}"),
        None => prompt,
    }
}

#[cfg(unix)]
fn stdin_ready(timeout: Duration) -> bool {
    match poll_readable(libc::STDIN_FILENO, timeout) {
        Ok(ready) => ready,
        Err(error) => {
            tracing::warn!(%error, "failed to poll stdin");
            false
        }
    }
}

#[cfg(unix)]
fn poll_readable(fd: libc::c_int, timeout: Duration) -> io::Result<bool> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
    loop {
        let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        return Ok(result > 0 && (fds.revents & (libc::POLLIN | libc::POLLHUP)) != 0);
    }
}

#[cfg(not(unix))]
fn stdin_ready(_timeout: Duration) -> bool {
    true
}
