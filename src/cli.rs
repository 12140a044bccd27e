use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(
    name = "mastermind",
    version,
    about = "Chat with a language model from your terminal",
    long_about = "Chat with a language model from your terminal.\n\n\
                  The conversation is kept per terminal session for one hour. \
                  Send `restart` to start over or `costs` to see token usage."
)]
pub struct Cli {
    /// Start a fresh chat session
    #[arg(short, long, conflicts_with = "shell")]
    pub reset: bool,

    /// Ask for a shell command
    #[arg(short, long)]
    pub shell: bool,

    /// With --shell: explain the command instead of printing it tersely
    #[arg(short, long, requires = "shell", conflicts_with = "execute")]
    pub explain: bool,

    /// With --shell: run the last suggested command
    #[arg(short = 'x', long, requires = "shell")]
    pub execute: bool,

    /// Replace the chat session's system prompt with PROMPT
    #[arg(short, long, conflicts_with_all = ["shell", "reset"])]
    pub bias: bool,

    /// Credential file (default: $MASTERMIND_CONFIG or ~/.config/mastermind/config.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[arg(value_name = "PROMPT")]
    pub prompt: Vec<String>,
}
