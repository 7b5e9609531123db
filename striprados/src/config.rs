use crate::cadapter::s3::S3Config;
use crate::cli::{BackendKind, Cli};
use crate::striper::layout::LayoutPolicy;
use anyhow::{Context, Result, bail};
use std::path::PathBuf;

static DATA_DIR_NAME: &str = "striprados";

#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// Pool directory of the local backend
    Local { pool_dir: PathBuf },
    S3 { bucket: String, s3: S3Config },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub pool: String,
    pub store: StoreConfig,
    pub layout: LayoutPolicy,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let pool = cli.pool.trim();
        if pool.is_empty() {
            bail!("pool name must not be empty");
        }

        let layout = LayoutPolicy::new(
            cli.layout.stripe_unit,
            cli.layout.object_size,
            cli.layout.stripe_count,
        )
        .context("invalid striping layout")?;

        let store = match cli.store.backend {
            BackendKind::Local => {
                if pool.contains('/') || pool == "." || pool == ".." {
                    bail!("pool name `{pool}` is not a valid directory name");
                }
                let root = match &cli.store.root {
                    Some(root) => root.clone(),
                    None => dirs::data_dir()
                        .context("Failed to get user data directory, pass --root")?
                        .join(DATA_DIR_NAME),
                };
                StoreConfig::Local {
                    pool_dir: root.join(pool),
                }
            }
            BackendKind::S3 => StoreConfig::S3 {
                bucket: pool.to_string(),
                s3: S3Config {
                    endpoint: cli.store.s3_endpoint.clone(),
                    region: cli.store.s3_region.clone(),
                    ..S3Config::default()
                },
            },
        };

        Ok(Self {
            pool: pool.to_string(),
            store,
            layout,
        })
    }
}
