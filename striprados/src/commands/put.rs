use crate::cadapter::client::ObjectBackend;
use crate::sdk::StripedClient;
use crate::striper::progress::transfer_bar;
use anyhow::{Context, Result};
use std::path::Path;

/// Upload `file` under `key`, returning the bytes written.
pub async fn put<B: ObjectBackend>(client: &StripedClient<B>, key: &str, file: &Path) -> Result<u64> {
    let source = tokio::fs::File::open(file)
        .await
        .with_context(|| format!("error reading file {}", file.display()))?;
    let total = source
        .metadata()
        .await
        .with_context(|| format!("cannot stat {}", file.display()))?
        .len();

    tracing::info!("putting {} as key {key} ({total} bytes)", file.display());
    let written = client
        .writer()
        .with_progress(transfer_bar(total, format!("Uploading {key}")))
        .write(key, source, total)
        .await
        .with_context(|| format!("upload of {} failed", file.display()))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::LocalClient;
    use crate::striper::layout::LayoutPolicy;

    #[tokio::test]
    async fn test_put_missing_source_file() {
        let tmp = tempfile::tempdir().unwrap();
        let client = LocalClient::new_local(tmp.path().join("pool"), LayoutPolicy::default());
        let err = put(&client, "k", &tmp.path().join("absent")).await.unwrap_err();
        assert!(err.to_string().contains("error reading file"));
    }
}
