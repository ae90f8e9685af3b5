//! Veil CLI - copy and edit secrets from a GPG password store
//!
//! Copied passwords are erased from the clipboard after a timeout, and the
//! password line stays masked while a secret is open for editing.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod editor;
mod errors;
mod system_clipboard;
mod ui;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{clear, copy, edit, list, misc};
use crate::constants::{DEFAULT_LOG_FILTER, LOG_ENV};
use crate::errors::CliError;
use crate::ui::{print_error, UiContext};

fn main() {
    let cli = Cli::parse();
    init_logging();

    if let Err(e) = run(&cli) {
        let err = CliError::classify(e);
        let ui_ctx = UiContext::from_env(false, cli.no_color, cli.ascii);
        let (message, hint) = split_hint(&err.to_string());
        print_error(&ui_ctx, &message, hint.as_deref());
        std::process::exit(err.exit_code());
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Separate a trailing "Hint: ..." line from an error message.
fn split_hint(error: &str) -> (String, Option<String>) {
    match error.find("\nHint:") {
        Some(idx) => (
            error[..idx].to_string(),
            Some(error[idx + "\nHint:".len()..].trim().to_string()),
        ),
        None => (error.to_string(), None),
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if let Commands::Completions(args) = &cli.command {
        return misc::handle_completions(args);
    }

    let ctx = AppContext::load(cli)?;
    match &cli.command {
        Commands::Copy(args) => copy::handle_copy(&ctx, args),
        Commands::Edit(args) => edit::handle_edit(&ctx, args),
        Commands::Clear(args) => clear::handle_clear(&ctx, args),
        Commands::List(args) => list::handle_list(&ctx, args),
        Commands::Completions(args) => misc::handle_completions(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_hint() {
        let (message, hint) = split_hint("Secret not found: x\nHint: Run `veil list`.");
        assert_eq!(message, "Secret not found: x");
        assert_eq!(hint.as_deref(), Some("Run `veil list`."));
    }

    #[test]
    fn test_split_hint_without_hint() {
        let (message, hint) = split_hint("boom");
        assert_eq!(message, "boom");
        assert!(hint.is_none());
    }
}
