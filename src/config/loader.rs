use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Missing required option '{0}'")]
    MissingOption(&'static str),

    #[error("Invalid value '{value}' for option '{option}': {reason}")]
    InvalidValue {
        option: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read secret for '{option}' from {path:?}: {source}")]
    SecretFile {
        option: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Values provided by the config file, keyed by option name
pub type FileOverlay = BTreeMap<String, String>;

/// Load the config file overlay from a TOML file
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<FileOverlay> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    parse_overlay(path, &contents)
}

/// Parse a flat TOML table into option values
///
/// `path` only names the source in errors.
pub fn parse_overlay(path: &Path, contents: &str) -> Result<FileOverlay> {
    let table: toml::Table = toml::from_str(contents).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })?;

    let mut overlay = FileOverlay::new();
    for (key, value) in table {
        let rendered = render_value(&key, &value)?;
        overlay.insert(key, rendered);
    }

    Ok(overlay)
}

fn render_value(key: &str, value: &toml::Value) -> Result<String> {
    use toml::Value;

    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Array(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => parts.push(s.clone()),
                    other => {
                        return Err(ConfigError::InvalidValue {
                            option: key.to_string(),
                            value: other.to_string(),
                            reason: "arrays may only contain strings".to_string(),
                        })
                    }
                }
            }
            Ok(parts.join(" "))
        }
        other => Err(ConfigError::InvalidValue {
            option: key.to_string(),
            value: other.to_string(),
            reason: "expected a string, boolean, number or array of strings".to_string(),
        }),
    }
}
