use secrecy::SecretString;
use tracing::warn;

use veil_core::{KillRing, SecretSource, SecretStore};

use crate::app::AppContext;
use crate::cli::EditArgs;
use crate::commands::copy::{report_erase, wait_for_erase};
use crate::editor::{self, Editor};
use crate::errors::CliError;
use crate::ui::prompt::identifier_or_prompt;
use crate::ui::{badge, Badge};

pub fn handle_edit(app: &AppContext, args: &EditArgs) -> anyhow::Result<()> {
    let ui = app.ui_context(false);
    if !ui.is_interactive() {
        return Err(CliError::invalid_input("veil edit needs an interactive terminal").into());
    }

    app.clipboard_timeout()?;
    let store = app.store()?;
    let id = identifier_or_prompt(&ui, &store, args.id.as_deref(), "Edit")?;
    let mut mask = app.mask_config()?;
    if args.show {
        mask.initially_hidden = false;
    }

    let text: SecretString = {
        let mut secret = store.resolve(&id)?;
        let text = secret.contents()?;
        secret.close();
        text
    };

    let kill_ring = KillRing::new();
    let clipboard = app.clipboard_session(kill_ring.clone());
    if let Err(err) = &clipboard {
        warn!(error = %err, "editing without clipboard support");
    }

    let mut view = Editor::open(id.as_str(), &text, kill_ring, mask, &store, clipboard);
    drop(text);
    let result = editor::run(&mut view);
    let outcome = view.finish();

    if outcome.saved && !app.quiet() {
        println!("{}", badge(&ui, Badge::Ok, &format!("Saved {}", id)));
    }

    if let Some(mut session) = outcome.clipboard {
        if outcome.closed_by_copy && session.is_tracking() && result.is_ok() {
            if !app.quiet() {
                println!(
                    "{}",
                    badge(&ui, Badge::Ok, &format!("Copied {} to clipboard", id))
                );
            }
            wait_for_erase(app, &ui, &mut session)?;
        } else if session.is_tracking() {
            report_erase(app, &ui, &session.erase());
        }
    }

    result
}
