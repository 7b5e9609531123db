//! CLI operations on top of `StripedClient`.

pub mod get;
pub mod ls;
pub mod put;

use crate::cadapter::client::ObjectBackend;
use crate::cadapter::s3::S3Backend;
use crate::cli::{Cli, Mode};
use crate::config::{Config, StoreConfig};
use crate::sdk::{LocalClient, StripedClient};
use anyhow::{Context, Result, anyhow};

pub async fn execute(cli: Cli) -> Result<()> {
    let config = Config::from_cli(&cli)?;
    let mode = cli
        .mode()
        .ok_or_else(|| anyhow!("exactly one of -k, -g or -l is required"))?;

    match &config.store {
        StoreConfig::Local { pool_dir } => {
            tracing::debug!("using local pool at {}", pool_dir.display());
            let client = LocalClient::new_local(pool_dir, config.layout);
            run(&client, mode).await
        }
        StoreConfig::S3 { bucket, s3 } => {
            tracing::debug!("using S3 bucket {bucket}");
            let backend = S3Backend::new(bucket.clone(), s3.clone())
                .await
                .with_context(|| format!("couldn't set up S3 backend for pool {bucket}"))?;
            let client = StripedClient::new(backend, config.layout);
            run(&client, mode).await
        }
    }
}

async fn run<B: ObjectBackend>(client: &StripedClient<B>, mode: Mode<'_>) -> Result<()> {
    match mode {
        Mode::Put { key, file } => put::put(client, key, file).await.map(|_| ()),
        Mode::Get { key, file } => get::get(client, key, file).await.map(|_| ()),
        Mode::List => {
            let entries = ls::list_files(client).await?;
            println!("{}", ls::render_table(&entries));
            Ok(())
        }
    }
}
