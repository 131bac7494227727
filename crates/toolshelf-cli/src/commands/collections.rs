//! Collections command implementation.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use toolshelf_core::{CollectionKind, ToolIds};

use crate::app::App;
use crate::output;

#[derive(Args, Debug)]
pub struct CollectionsArgs {
    /// Print the collections as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionsOutput<'a> {
    tools: &'a ToolIds,
    bookmarked_tools: &'a ToolIds,
}

pub async fn run(app: &App, args: CollectionsArgs) -> Result<()> {
    let coordinator = app.coordinator();
    let session = app.require_session().await?;
    coordinator.observe(&session).await;

    let view = coordinator.view();
    for kind in CollectionKind::ALL {
        if let Some(error) = view.error(kind) {
            output::warning(&format!("Could not load {}: {}", kind, error));
        }
    }

    if args.json {
        return output::json_pretty(&CollectionsOutput {
            tools: &view.tools,
            bookmarked_tools: &view.bookmarked_tools,
        });
    }

    output::field("Tools", &join(&view.tools));
    output::field("Bookmarks", &join(&view.bookmarked_tools));
    Ok(())
}

fn join(ids: &ToolIds) -> String {
    if ids.is_empty() {
        return "(none)".to_string();
    }
    ids.iter().collect::<Vec<_>>().join(", ")
}
