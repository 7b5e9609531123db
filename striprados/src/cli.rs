use crate::striper::layout::{DEFAULT_OBJECT_SIZE, DEFAULT_STRIPE_COUNT, DEFAULT_STRIPE_UNIT};
use clap::{ArgGroup, Args, Parser, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "striprados",
    version,
    about = "Upload, download and list files striped over an object store"
)]
#[command(group(ArgGroup::new("mode").required(true).args(["put", "get", "list"])))]
pub struct Cli {
    /// Pool holding the objects (a directory under --root, or an S3 bucket)
    #[arg(short = 'p', long = "pool", value_name = "POOL")]
    pub pool: String,

    /// Upload FILENAME under KEY
    #[arg(short = 'k', long = "put", value_name = "KEY", requires = "filename")]
    pub put: Option<String>,

    /// Download KEY into FILENAME
    #[arg(short = 'g', long = "get", value_name = "KEY", requires = "filename")]
    pub get: Option<String>,

    /// List all striped files in the pool
    #[arg(short = 'l', long = "list")]
    pub list: bool,

    #[arg(value_name = "FILENAME", conflicts_with = "list")]
    pub filename: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Turn verbose logging on
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Object store backend
    #[arg(long, value_enum, env = "STRIPRADOS_BACKEND", default_value = "local")]
    pub backend: BackendKind,

    /// Root directory of the local backend, one sub-directory per pool
    #[arg(long, value_name = "DIR", env = "STRIPRADOS_ROOT")]
    pub root: Option<PathBuf>,

    /// S3-compatible endpoint URL
    #[arg(long, value_name = "URL", env = "STRIPRADOS_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    #[arg(long, value_name = "REGION", env = "STRIPRADOS_S3_REGION", default_value = "us-east-1")]
    pub s3_region: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    S3,
}

#[derive(Args, Debug, Clone)]
pub struct LayoutArgs {
    /// Bytes per stripe unit
    #[arg(long, value_name = "BYTES", env = "STRIPRADOS_STRIPE_UNIT", default_value_t = DEFAULT_STRIPE_UNIT)]
    pub stripe_unit: u64,

    /// Maximum bytes per backing object
    #[arg(long, value_name = "BYTES", env = "STRIPRADOS_OBJECT_SIZE", default_value_t = DEFAULT_OBJECT_SIZE)]
    pub object_size: u64,

    /// Number of backing objects striped across
    #[arg(long, value_name = "N", env = "STRIPRADOS_STRIPE_COUNT", default_value_t = DEFAULT_STRIPE_COUNT)]
    pub stripe_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode<'a> {
    Put { key: &'a str, file: &'a Path },
    Get { key: &'a str, file: &'a Path },
    List,
}

impl Cli {
    /// The requested operation; clap guarantees exactly one mode and a
    /// filename for put/get, `None` only if that contract is broken.
    pub fn mode(&self) -> Option<Mode<'_>> {
        match (&self.put, &self.get, self.list) {
            (Some(key), None, false) => Some(Mode::Put {
                key,
                file: self.filename.as_deref()?,
            }),
            (None, Some(key), false) => Some(Mode::Get {
                key,
                file: self.filename.as_deref()?,
            }),
            (None, None, true) => Some(Mode::List),
            _ => None,
        }
    }
}
