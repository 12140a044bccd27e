use std::process::{Command, ExitStatus};

const SHELL_PROGRAM: &str = "bash";

/// Runs a suggested command and reports the exit code to mirror.
pub trait CommandRunner {
    fn run(&self, command: &str) -> i32;
}

/// Runs commands through `bash -c` with the caller's stdio attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct BashRunner;

impl CommandRunner for BashRunner {
    fn run(&self, command: &str) -> i32 {
        match Command::new(SHELL_PROGRAM).arg("-c").arg(command).status() {
            Ok(status) => exit_code(status),
            Err(error) => {
                tracing::warn!(%error, "failed to launch {SHELL_PROGRAM}");
                1
            }
        }
    }
}

/// Exit code of a finished child. Termination by signal maps to 1.
pub fn exit_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => {
            tracing::warn!(%status, "command terminated without an exit code");
            1
        }
    }
}

/// Pulls the runnable command out of an assistant reply.
///
/// Replies sometimes wrap the command in a fenced code block; only the
/// body of the first block is kept. Returns `None` for blank replies.
pub fn extract_command(reply: &str) -> Option<String> {
    let trimmed = reply.trim();
    let command = match trimmed.split_once("```") {
        Some((_, rest)) => {
            let body = rest.split_once("```").map_or(rest, |(body, _)| body);
            match body.split_once('\n') {
                Some((info, code)) if !info.trim().contains(' ') => code,
                _ => body,
            }
        }
        None => trimmed,
    };

    let command = command.trim();
    if command.is_empty() {
        None
    } else {
        Some(command.to_string())
    }
}
