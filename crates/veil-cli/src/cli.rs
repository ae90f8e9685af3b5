use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use veil_core::VERSION;

/// Veil - copy and edit secrets from a GPG password store without leaving them behind
#[derive(Parser)]
#[command(name = "veil")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the password store
    #[arg(short, long, global = true, env = "PASSWORD_STORE_DIR")]
    pub store: Option<String>,

    /// Seconds before a copied secret is erased from the clipboard
    #[arg(short, long, global = true, env = "PASSWORD_STORE_CLIP_TIME")]
    pub timeout: Option<u64>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use ASCII symbols only
    #[arg(long, global = true)]
    pub ascii: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments for the `copy` command
#[derive(Args)]
pub struct CopyArgs {
    /// Secret identifier (prompted for when omitted)
    #[arg(value_name = "ID")]
    pub id: Option<String>,
}

/// Arguments for the `edit` command
#[derive(Args)]
pub struct EditArgs {
    /// Secret identifier (prompted for when omitted)
    #[arg(value_name = "ID")]
    pub id: Option<String>,

    /// Open with the password line visible
    #[arg(long)]
    pub show: bool,
}

/// Arguments for the `clear` command
#[derive(Args)]
pub struct ClearArgs {
    /// Secret whose value should be removed from the clipboard
    #[arg(value_name = "ID")]
    pub id: Option<String>,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Copy the password line of a secret to the clipboard
    Copy(CopyArgs),

    /// Edit a secret with its password line masked
    Edit(EditArgs),

    /// Erase a secret from the clipboard now, if it is still there
    Clear(ClearArgs),

    /// List secrets in the store
    List(ListArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["veil", "copy", "web/github", "--timeout", "3", "-q"])
            .expect("parse");
        assert_eq!(cli.timeout, Some(3));
        assert!(cli.quiet);
        match cli.command {
            Commands::Copy(args) => assert_eq!(args.id.as_deref(), Some("web/github")),
            _ => panic!("expected copy"),
        }
    }

    #[test]
    fn test_identifier_is_optional() {
        let cli = Cli::try_parse_from(["veil", "edit"]).expect("parse");
        assert!(matches!(cli.command, Commands::Edit(EditArgs { id: None, .. })));
    }
}
