use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("{0} plugin does not exist")]
    UnknownPlugin(String),

    #[error("message is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("unrecognised message: {0}")]
    UnknownMessage(String),

    #[error("frame too large: {len} > {max}")]
    FrameTooLarge { len: usize, max: usize },

    #[error("failed to prepare font asset {}: {source}", path.display())]
    AssetPreparation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
