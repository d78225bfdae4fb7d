//! Precedence chain: explicit flag > environment variable > config file > default

use super::loader::{load_file, ConfigError, FileOverlay, Result};
use super::options::{self, OptionKind, OptionSpec};
use super::types::Secret;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Flags given explicitly on the command line, keyed by option name
pub type FlagValues = HashMap<String, String>;

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Flag,
    Env,
    File,
    Default,
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    flags: FlagValues,
    env: HashMap<String, String>,
    file: FileOverlay,
}

impl Resolver {
    pub fn new(flags: FlagValues, env: HashMap<String, String>, file: FileOverlay) -> Self {
        Self { flags, env, file }
    }

    /// Build a resolver from the process environment, loading the config
    /// file named by `--config` or `CONFIG_FILE` if any
    pub fn from_process(flags: FlagValues) -> Result<Self> {
        let env: HashMap<String, String> = std::env::vars().collect();
        let mut resolver = Self::new(flags, env, FileOverlay::new());

        if let Some(path) = resolver.path(&options::CONFIG_FILE) {
            debug!("Loading config file: {:?}", path);
            resolver.file = load_file(&path)?;
        }

        Ok(resolver)
    }

    /// Resolve the raw value of an option along with its source
    pub fn lookup(&self, spec: &OptionSpec) -> Option<(String, Source)> {
        if let Some(value) = self.flags.get(spec.name) {
            return Some((value.clone(), Source::Flag));
        }

        if let Some(value) = self.env.get(spec.env).filter(|v| !v.is_empty()) {
            return Some((value.clone(), Source::Env));
        }

        if let Some(value) = self.file.get(spec.name) {
            return Some((value.clone(), Source::File));
        }

        spec.default.map(|d| (d.to_string(), Source::Default))
    }

    /// Resolved value, if any source provides one
    pub fn value(&self, spec: &OptionSpec) -> Option<String> {
        self.lookup(spec).map(|(value, _)| value)
    }

    /// Resolved value or empty string
    pub fn string(&self, spec: &OptionSpec) -> String {
        self.value(spec).unwrap_or_default()
    }

    /// Resolved non-empty value, or a missing-option error
    pub fn require(&self, spec: &OptionSpec) -> Result<String> {
        self.value(spec)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingOption(spec.name))
    }

    /// Resolved value as a path with `~` expanded
    pub fn path(&self, spec: &OptionSpec) -> Option<PathBuf> {
        self.value(spec)
            .filter(|v| !v.is_empty())
            .map(|v| super::expand_tilde(Path::new(&v)))
    }

    pub fn require_path(&self, spec: &OptionSpec) -> Result<PathBuf> {
        self.path(spec).ok_or(ConfigError::MissingOption(spec.name))
    }

    pub fn flag(&self, spec: &OptionSpec) -> Result<bool> {
        match self.value(spec) {
            None => Ok(false),
            Some(value) => parse_bool(spec.name, &value),
        }
    }

    pub fn integer(&self, spec: &OptionSpec) -> Result<u64> {
        let value = self.require(spec)?;
        value
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                option: spec.name.to_string(),
                value,
                reason: e.to_string(),
            })
    }

    /// Resolve a secret-capable option with value-or-file indirection
    pub fn secret(&self, spec: &OptionSpec) -> Result<Secret> {
        debug_assert_eq!(spec.kind, OptionKind::Secret);
        let value = self.string(spec);
        resolve_secret(spec.name, &value)
    }

    /// The database password: an explicit password file wins, otherwise the
    /// password option with value-or-file indirection
    pub fn database_password(&self) -> Result<Secret> {
        if let Some(path) = self.path(&options::DATABASE_PASSWORD_FILE) {
            return read_secret_file(options::DATABASE_PASSWORD_FILE.name, &path);
        }
        self.secret(&options::DATABASE_PASSWORD)
    }
}

pub fn parse_bool(option: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            option: option.to_string(),
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

/// Value-or-file indirection: a value naming an existing path is replaced
/// by the trimmed contents of that file
pub fn resolve_secret(option: &'static str, value: &str) -> Result<Secret> {
    let path = Path::new(value);
    if !value.is_empty() && path.exists() {
        return read_secret_file(option, path);
    }
    Ok(Secret::new(value))
}

fn read_secret_file(option: &'static str, path: &Path) -> Result<Secret> {
    debug!("Reading secret for '{}' from {:?}", option, path);
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::SecretFile {
        option,
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Secret::new(contents.trim()))
}
