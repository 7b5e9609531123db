use crate::cadapter::client::ObjectBackend;
use crate::sdk::StripedClient;
use crate::striper::progress::transfer_bar;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Download `key` into `file`, returning the bytes read.
///
/// The destination is only created once the key is known to exist, so a
/// missing key leaves no file behind.
pub async fn get<B: ObjectBackend>(client: &StripedClient<B>, key: &str, file: &Path) -> Result<u64> {
    let stat = client
        .stat(key)
        .await
        .with_context(|| format!("cannot get key {key}"))?;

    tracing::info!("getting key {key} for file {} ({} bytes)", file.display(), stat.size);
    let mut sink = tokio::fs::File::create(file)
        .await
        .with_context(|| format!("error writing file {}", file.display()))?;
    let read = client
        .reader()
        .with_progress(transfer_bar(stat.size, format!("Downloading {key}")))
        .read_stat_into(&stat, &mut sink)
        .await
        .with_context(|| format!("download of {key} failed"))?;
    sink.sync_all()
        .await
        .with_context(|| format!("error writing file {}", file.display()))?;
    Ok(read)
}
