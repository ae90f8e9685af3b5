//! Interactive secret selection.

use dialoguer::theme::ColorfulTheme;
use dialoguer::FuzzySelect;

use veil_core::SecretStore;

use super::context::UiContext;
use crate::errors::CliError;

/// Use `given` when present, otherwise ask the user to pick one of the
/// store's identifiers.
pub fn identifier_or_prompt(
    ctx: &UiContext,
    store: &dyn SecretStore,
    given: Option<&str>,
    prompt: &str,
) -> anyhow::Result<String> {
    if let Some(id) = given {
        return Ok(id.to_string());
    }
    if !ctx.is_interactive() {
        return Err(CliError::invalid_input(
            "No secret given and no terminal to prompt on; pass an identifier",
        )
        .into());
    }
    let ids = store.list()?;
    select_identifier(&ids, prompt)
}

/// Fuzzy-select one identifier. Cancelling the prompt is an input error.
pub fn select_identifier(ids: &[String], prompt: &str) -> anyhow::Result<String> {
    if ids.is_empty() {
        return Err(CliError::not_found(
            "The store has no secrets",
            "Hint: Check --store or PASSWORD_STORE_DIR.",
        )
        .into());
    }

    let theme = ColorfulTheme::default();
    let selection = FuzzySelect::with_theme(&theme)
        .with_prompt(prompt)
        .default(0)
        .items(ids)
        .interact_opt()?;

    selection
        .and_then(|index| ids.get(index).cloned())
        .ok_or_else(|| CliError::invalid_input("Selection cancelled").into())
}
