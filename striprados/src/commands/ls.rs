use crate::cadapter::client::ObjectBackend;
use crate::sdk::StripedClient;
use crate::striper::scanner::FileEntry;
use anyhow::{Context, Result};
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use futures::TryStreamExt;

pub async fn list_files<B: ObjectBackend>(client: &StripedClient<B>) -> Result<Vec<FileEntry>> {
    let mut entries: Vec<FileEntry> = client
        .list()
        .try_collect()
        .await
        .context("error reading list")?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

pub fn render_table(entries: &[FileEntry]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["name", "size"]);
    for entry in entries {
        table.add_row(vec![entry.name.clone(), entry.size.to_string()]);
    }
    table
}
