use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use mastermind::cli::Cli;
use mastermind::dispatch::{Dispatcher, Intent};
use mastermind::shell::BashRunner;
use mastermind::{logging, providers, stdin};
use session_store::SessionStore;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(error) => {
            eprintln!("mastermind: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let piped = stdin::read_piped_input();
    let prompt = stdin::compose_prompt(&cli.prompt, piped.as_deref());
    let intent = Intent::from_cli(&cli, prompt);
    tracing::debug!(?intent, "dispatching");

    let gateway = if intent.needs_gateway() {
        Some(
            providers::gateway_from_env(cli.config.as_deref())
                .context("failed to configure the completion gateway")?,
        )
    } else {
        None
    };

    let store = SessionStore::from_env();
    let dispatcher = Dispatcher {
        gateway: gateway.as_deref(),
        store: &store,
        runner: &BashRunner,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let code = dispatcher
        .run(intent, &mut out)
        .context("failed to write output")?;
    out.flush().context("failed to write output")?;
    Ok(code)
}
