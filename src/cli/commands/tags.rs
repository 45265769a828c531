use crate::cli::TagsCommands;
use crate::cli::commands::status_word;
use crate::config::{self, Workspace};
use crate::error::Result;
use crate::output::OutputContext;
use serde::Serialize;
use serde_json::json;

#[derive(Serialize)]
struct TagCount {
    tag: String,
    count: usize,
    custom: bool,
}

/// Execute the tags command.
///
/// Custom tags are labels promoted to filter facets; `list` shows every
/// tag with its ticket count.
///
/// # Errors
///
/// Returns a validation error for empty tags, or a persistence error.
pub fn execute(command: &TagsCommands, cli: &config::CliOverrides, ctx: &OutputContext) -> Result<()> {
    let mut ws = Workspace::open(cli)?;

    let (action, tag, changed) = match command {
        TagsCommands::List => {
            let custom = ws.store.config().custom_tags();
            let rows: Vec<TagCount> = ws
                .store
                .tag_counts()
                .into_iter()
                .map(|(tag, count)| TagCount {
                    custom: custom.iter().any(|c| c.to_lowercase() == tag),
                    tag,
                    count,
                })
                .collect();
            if ctx.is_json() {
                return ctx.json(&rows);
            }
            if rows.is_empty() {
                ctx.print("No tags.");
            }
            for row in rows {
                let marker = if row.custom { " *" } else { "" };
                ctx.print(&format!("{} ({}){marker}", row.tag, row.count));
            }
            return Ok(());
        }
        TagsCommands::Add { tag } => ("add", tag, ws.store.config_mut().add_custom_tag(tag)?),
        TagsCommands::Remove { tag } => {
            ("remove", tag, ws.store.config_mut().remove_custom_tag(tag)?)
        }
    };

    ctx.json(&json!({
        "status": status_word(changed),
        "action": action,
        "tag": tag.trim(),
    }))?;
    if changed {
        ctx.success(&format!("Custom tags updated ({action} {tag})"));
    } else {
        ctx.print("Custom tags unchanged");
    }
    Ok(())
}
