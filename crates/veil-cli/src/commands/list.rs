use veil_core::SecretStore;

use crate::app::AppContext;
use crate::cli::ListArgs;
use crate::ui::{header, hint, simple_table, Column};

pub fn handle_list(app: &AppContext, args: &ListArgs) -> anyhow::Result<()> {
    let ui = app.ui_context(args.json);
    let ids = app.store()?.list()?;

    if ui.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&ids)?);
        return Ok(());
    }

    if ids.is_empty() {
        if !app.quiet() {
            println!("{}", hint(&ui, "The store has no secrets yet."));
        }
        return Ok(());
    }

    if ui.mode.is_pretty() && !app.quiet() {
        let count = format!("{} secrets", ids.len());
        println!("{}", header(&ui, "list", Some(&count)));
    }
    let rows: Vec<Vec<String>> = ids.into_iter().map(|id| vec![id]).collect();
    println!("{}", simple_table(&ui, &[Column::new("Identifier")], &rows));
    Ok(())
}
