use secrecy::ExposeSecret;

use veil_core::{KillRing, SecretSource, SecretStore, SecretValue};

use crate::app::AppContext;
use crate::cli::ClearArgs;
use crate::commands::copy::report_erase;
use crate::ui::prompt::identifier_or_prompt;

/// Erase a secret placed by an earlier `veil copy`, but only if the
/// clipboard still holds it.
pub fn handle_clear(app: &AppContext, args: &ClearArgs) -> anyhow::Result<()> {
    let ui = app.ui_context(false);
    let store = app.store()?;
    let id = identifier_or_prompt(&ui, &store, args.id.as_deref(), "Clear")?;

    let value = {
        let mut secret = store.resolve(&id)?;
        let contents = secret.contents()?;
        let value = SecretValue::from_first_line(contents.expose_secret());
        secret.close();
        value
    };

    let mut session = app.clipboard_session(KillRing::new())?;
    session.track(value);
    let report = session.erase();
    report_erase(app, &ui, &report);
    Ok(())
}
