use crate::cadapter::client::StoreError;
use crate::striper::layout::LayoutError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StriperError {
    #[error("invalid layout: {0}")]
    Configuration(#[from] LayoutError),

    #[error("striped object {key} not found")]
    NotFound { key: String },

    #[error("writing {key} failed at offset {offset}{}", object_suffix(.object))]
    Write {
        key: String,
        object: Option<String>,
        offset: u64,
        #[source]
        source: StoreError,
    },

    #[error("reading {key} failed at offset {offset}{}", object_suffix(.object))]
    Read {
        key: String,
        object: Option<String>,
        offset: u64,
        #[source]
        source: StoreError,
    },

    #[error("cannot get {attr} of {object}")]
    Attribute {
        object: String,
        attr: String,
        #[source]
        source: StoreError,
    },

    #[error("listing objects failed")]
    List(#[source] StoreError),
}

fn object_suffix(object: &Option<String>) -> String {
    match object {
        Some(o) => format!(" (object {o})"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, StriperError>;
