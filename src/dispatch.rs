//! Maps one parsed invocation onto one session mutation.

use std::io::{self, Write};

use chat_provider::CompletionGateway;
use clap::CommandFactory;
use session_store::{SessionKind, SessionStore};

use crate::cli::Cli;
use crate::session::{
    ChatSession, CHAT_TEMPERATURE, DEFAULT_CHAT_SYSTEM_PROMPT, SHELL_SYSTEM_PROMPT,
    SHELL_TEMPERATURE,
};
use crate::shell::{extract_command, CommandRunner};

pub const CHAT_ICON: &str = "🤖";
pub const SHELL_ICON: &str = "🖥️";

pub const TERSE_SHELL_PREFIX: &str = "DON'T PROVIDE ANY EXPLANATIONS. ";
pub const EXPLAIN_SHELL_SUFFIX: &str = ". Explain the command.";
pub const NOTHING_TO_EXECUTE_NOTICE: &str = "No command to execute";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Start the chat session over, then optionally converse.
    Reset { follow_up: Option<String> },
    /// Replace the chat session's system prompt.
    Bias { text: String },
    /// One-shot terse shell command suggestion.
    ShellSuggest { prompt: String },
    /// Explain `prompt`'s command, or the last suggestion when `prompt` is empty.
    ShellExplain { prompt: String },
    /// Run the last suggested shell command.
    ShellExecute,
    Chat { prompt: String },
    Help,
}

impl Intent {
    /// `prompt` is the full prompt text, positional words plus piped input.
    #[must_use]
    pub fn from_cli(cli: &Cli, prompt: String) -> Self {
        let prompt_opt = Some(prompt.clone()).filter(|text| !text.trim().is_empty());

        if cli.shell {
            if cli.execute {
                return Self::ShellExecute;
            }
            if cli.explain {
                return Self::ShellExplain { prompt };
            }
            return match prompt_opt {
                Some(prompt) => Self::ShellSuggest { prompt },
                None => Self::Help,
            };
        }

        if cli.reset {
            return Self::Reset {
                follow_up: prompt_opt,
            };
        }

        match prompt_opt {
            Some(text) if cli.bias => Self::Bias { text },
            Some(prompt) => Self::Chat { prompt },
            None => Self::Help,
        }
    }

    /// Whether running this intent needs a completion gateway.
    #[must_use]
    pub fn needs_gateway(&self) -> bool {
        match self {
            Self::Reset { follow_up } => follow_up.is_some(),
            Self::Help | Self::Bias { .. } | Self::ShellExecute => false,
            Self::ShellSuggest { .. } | Self::ShellExplain { .. } | Self::Chat { .. } => true,
        }
    }
}

/// Collaborators for one invocation.
pub struct Dispatcher<'a> {
    pub gateway: Option<&'a dyn CompletionGateway>,
    pub store: &'a SessionStore,
    pub runner: &'a dyn CommandRunner,
}

impl Dispatcher<'_> {
    /// Runs `intent`, writing user-facing output to `out`, and returns the
    /// process exit code.
    pub fn run(&self, intent: Intent, out: &mut dyn Write) -> io::Result<i32> {
        match intent {
            Intent::Help => {
                writeln!(out, "{}", Cli::command().render_help())?;
                Ok(0)
            }
            Intent::Reset { follow_up } => {
                let mut session = self.restore_chat();
                writeln!(out, "{}", session.reset(self.store))?;
                if let Some(prompt) = follow_up {
                    let reply = session.converse(self.gateway()?, self.store, &prompt);
                    print_reply(out, CHAT_ICON, &reply)?;
                }
                Ok(0)
            }
            Intent::Bias { text } => {
                let mut session = self.restore_chat();
                writeln!(out, "{}", session.apply_bias(self.store, text))?;
                Ok(0)
            }
            Intent::Chat { prompt } => {
                let mut session = self.restore_chat();
                let reply = session.converse(self.gateway()?, self.store, &prompt);
                print_reply(out, CHAT_ICON, &reply)?;
                Ok(0)
            }
            Intent::ShellSuggest { prompt } => {
                let reply = self.one_shot_shell(&format!("{TERSE_SHELL_PREFIX}{prompt}"))?;
                print_reply(out, SHELL_ICON, &reply)?;
                Ok(0)
            }
            Intent::ShellExplain { prompt } => {
                let mut restored = self.restore_shell();
                let reply = if prompt.trim().is_empty() && restored.messages().len() > 1 {
                    restored.set_transient(true);
                    restored.explain_last(self.gateway()?)
                } else {
                    self.one_shot_shell(&format!("{prompt}{EXPLAIN_SHELL_SUFFIX}"))?
                };
                print_reply(out, SHELL_ICON, &reply)?;
                Ok(0)
            }
            Intent::ShellExecute => {
                let restored = self.restore_shell();
                let Some(command) = restored.last_assistant_content().and_then(extract_command)
                else {
                    writeln!(out, "{NOTHING_TO_EXECUTE_NOTICE}")?;
                    return Ok(1);
                };

                writeln!(out, " {SHELL_ICON} {command}")?;
                out.flush()?;
                tracing::info!(%command, "executing suggested command");
                Ok(self.runner.run(&command))
            }
        }
    }

    fn gateway(&self) -> io::Result<&dyn CompletionGateway> {
        self.gateway
            .ok_or_else(|| io::Error::other("no completion gateway configured"))
    }

    fn restore_chat(&self) -> ChatSession {
        ChatSession::restore_or_new(
            self.store,
            DEFAULT_CHAT_SYSTEM_PROMPT,
            CHAT_TEMPERATURE,
            SessionKind::Chat,
        )
    }

    fn restore_shell(&self) -> ChatSession {
        ChatSession::restore_or_new(
            self.store,
            SHELL_SYSTEM_PROMPT,
            SHELL_TEMPERATURE,
            SessionKind::Shell,
        )
    }

    /// Fresh shell session with no history. Its exchange replaces the stored
    /// shell record so a later explain or execute can read it.
    fn one_shot_shell(&self, prompt: &str) -> io::Result<String> {
        let mut session = ChatSession::start_new(
            self.store,
            SHELL_SYSTEM_PROMPT,
            SHELL_TEMPERATURE,
            SessionKind::Shell,
        );
        Ok(session.converse(self.gateway()?, self.store, prompt))
    }
}

fn print_reply(out: &mut dyn Write, icon: &str, reply: &str) -> io::Result<()> {
    writeln!(out, " {icon} {}", reply.trim())
}
