//! Error taxonomy shared by every service, store and operation

use crate::config::ConfigError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{tool} failed ({status}): {stderr}")]
    ExternalTool {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("archive operation on {path:?} failed: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{store} transfer of '{key}' failed: {message}")]
    StoreTransfer {
        store: &'static str,
        key: String,
        message: String,
    },
}

impl Error {
    pub(crate) fn archive(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Archive {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn transfer(store: &'static str, key: impl Into<String>, message: impl ToString) -> Self {
        Error::StoreTransfer {
            store,
            key: key.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
