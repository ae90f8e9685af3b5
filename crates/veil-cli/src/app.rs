//! Application context for the Veil CLI.
//!
//! Combines CLI arguments with the config file and resolves the effective
//! store, clipboard and masking settings. Flags win over the config file,
//! which wins over built-in defaults.

use std::path::PathBuf;
use std::time::Duration;

use veil_core::clipboard::{DEFAULT_CLIPBOARD_TIMEOUT, MAX_CLIPBOARD_TIMEOUT};
use veil_core::{
    ClipboardSession, DeadlineScheduler, GpgStore, KillRing, MaskConfig, VeilError,
};

use crate::cli::Cli;
use crate::config::{expand_home, home_dir, load_config, VeilConfig};
use crate::constants::DEFAULT_STORE_DIR;
use crate::errors::CliError;
use crate::system_clipboard::CommandClipboard;
use crate::ui::UiContext;

/// Clipboard session wired to the real clipboard and wall clock.
pub type SystemSession = ClipboardSession<CommandClipboard, KillRing, DeadlineScheduler>;

pub struct AppContext<'a> {
    cli: &'a Cli,
    config: VeilConfig,
}

impl<'a> AppContext<'a> {
    pub fn load(cli: &'a Cli) -> anyhow::Result<Self> {
        let config = load_config()?;
        Ok(Self::with_config(cli, config))
    }

    pub fn with_config(cli: &'a Cli, config: VeilConfig) -> Self {
        Self { cli, config }
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    pub fn ui_context(&self, json: bool) -> UiContext {
        UiContext::from_env(json, self.cli.no_color, self.cli.ascii)
    }

    /// Store root: `--store`/`PASSWORD_STORE_DIR`, then `[store] path`, then
    /// `~/.password-store`.
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.cli.store {
            return expand_home(path);
        }
        if let Some(path) = &self.config.store.path {
            return expand_home(path);
        }
        Ok(home_dir()?.join(DEFAULT_STORE_DIR))
    }

    pub fn store(&self) -> anyhow::Result<GpgStore> {
        let mut store = GpgStore::new(self.store_path()?);
        if let Some(gpg) = &self.config.store.gpg {
            store = store.with_gpg(expand_home(gpg)?);
        }
        Ok(store)
    }

    /// Erase delay: `--timeout`/`PASSWORD_STORE_CLIP_TIME`, then
    /// `[clipboard] timeout_seconds`, then the built-in default.
    pub fn clipboard_timeout(&self) -> veil_core::Result<Duration> {
        let timeout = self
            .cli
            .timeout
            .or(self.config.clipboard.timeout_seconds)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CLIPBOARD_TIMEOUT);
        if timeout > MAX_CLIPBOARD_TIMEOUT {
            return Err(VeilError::InvalidInput(format!(
                "clipboard timeout of {}s is longer than the {}s limit",
                timeout.as_secs(),
                MAX_CLIPBOARD_TIMEOUT.as_secs()
            )));
        }
        Ok(timeout)
    }

    pub fn mask_config(&self) -> anyhow::Result<MaskConfig> {
        let mut config = MaskConfig::default();
        if let Some(glyph) = &self.config.mask.glyph {
            let mut chars = glyph.chars();
            config.glyph = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(CliError::invalid_input(format!(
                        "[mask] glyph must be a single character, got {:?}",
                        glyph
                    ))
                    .into())
                }
            };
        }
        if let Some(hidden) = self.config.mask.initially_hidden {
            config.initially_hidden = hidden;
        }
        Ok(config)
    }

    pub fn system_clipboard(&self) -> veil_core::Result<CommandClipboard> {
        CommandClipboard::detect(&self.config.clipboard)
    }

    /// A clipboard session that scrubs `history` on erase.
    pub fn clipboard_session(&self, history: KillRing) -> veil_core::Result<SystemSession> {
        let timeout = self.clipboard_timeout()?;
        let clipboard = self.system_clipboard()?;
        Ok(ClipboardSession::new(clipboard, history, DeadlineScheduler::new()).with_timeout(timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("parse")
    }

    fn config(toml_text: &str) -> VeilConfig {
        toml::from_str(toml_text).expect("config")
    }

    #[test]
    fn test_timeout_flag_beats_config() {
        let cli = cli(&["veil", "--timeout", "3", "list"]);
        let ctx = AppContext::with_config(&cli, config("[clipboard]\ntimeout_seconds = 30"));
        assert_eq!(ctx.clipboard_timeout().unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn test_timeout_from_config() {
        let cli = cli(&["veil", "list"]);
        let ctx = AppContext::with_config(&cli, config("[clipboard]\ntimeout_seconds = 30"));
        if cli.timeout.is_none() {
            assert_eq!(ctx.clipboard_timeout().unwrap(), Duration::from_secs(30));
        }
    }

    #[test]
    fn test_oversized_timeout_rejected() {
        let cli = cli(&["veil", "--timeout", "18446744073709551615", "list"]);
        let ctx = AppContext::with_config(&cli, VeilConfig::default());
        let err = ctx.clipboard_timeout().unwrap_err();
        assert!(matches!(err, VeilError::InvalidInput(_)));

        let cli = self::cli(&["veil", "list"]);
        let ctx = AppContext::with_config(&cli, config("[clipboard]\ntimeout_seconds = 100000"));
        assert!(ctx.clipboard_timeout().is_err());
    }

    #[test]
    fn test_store_flag_beats_config() {
        let cli = cli(&["veil", "--store", "/tmp/flag-store", "list"]);
        let ctx = AppContext::with_config(&cli, config("[store]\npath = \"/tmp/config-store\""));
        assert_eq!(ctx.store_path().unwrap(), PathBuf::from("/tmp/flag-store"));
    }

    #[test]
    fn test_mask_config_from_file() {
        let cli = cli(&["veil", "list"]);
        let ctx = AppContext::with_config(
            &cli,
            config("[mask]\nglyph = \"#\"\ninitially_hidden = false"),
        );
        let mask = ctx.mask_config().unwrap();
        assert_eq!(mask.glyph, '#');
        assert!(!mask.initially_hidden);
    }

    #[test]
    fn test_multi_char_glyph_rejected() {
        let cli = cli(&["veil", "list"]);
        let ctx = AppContext::with_config(&cli, config("[mask]\nglyph = \"**\""));
        let err = ctx.mask_config().unwrap_err();
        assert_eq!(CliError::classify(err).exit_code(), 4);
    }
}
