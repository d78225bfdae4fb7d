//! Backup manager - binds a service to a store and runs one operation

use crate::config::{options, Resolver};
use crate::error::{Error, Result};
use crate::services::{self, Service, ServiceKind};
use crate::stores::{self, Store, StoreKind};
use crate::utils::CommandExecutor;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Backup,
    Restore,
}

impl Action {
    pub const ALL: [Action; 2] = [Action::Backup, Action::Restore];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Backup => "backup",
            Action::Restore => "restore",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One runnable combination of action, service and store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operation {
    pub action: Action,
    pub service: ServiceKind,
    pub store: StoreKind,
}

impl Operation {
    pub fn new(action: Action, service: ServiceKind, store: StoreKind) -> Self {
        Self {
            action,
            service,
            store,
        }
    }

    /// Resolve configuration, build both backends and run the operation
    ///
    /// Returns the local artifact path: the one produced by a backup, or the
    /// one fetched for a restore.
    pub fn run(&self, resolver: &Resolver, executor: Arc<dyn CommandExecutor>) -> Result<PathBuf> {
        let start_time = Instant::now();
        info!("Starting {}", self);

        let service = services::build(self.service, resolver, executor)?;
        let store = stores::build(self.store, resolver)?;

        let result = match self.action {
            Action::Backup => run_backup(service.as_ref(), store.as_ref()),
            Action::Restore => {
                let key = resolver.value(&options::RESTORE_KEY);
                run_restore(service.as_ref(), store.as_ref(), key.as_deref())
            }
        };

        let duration = start_time.elapsed().as_secs();
        match &result {
            Ok(path) => info!("Finished {} in {}s ({:?})", self, duration, path),
            Err(e) => error!("{} failed after {}s: {}", self, duration, e),
        }

        result
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} via {}", self.action, self.service, self.store)
    }
}

/// Every action for every service against every store
pub fn operations() -> Vec<Operation> {
    let mut ops = Vec::with_capacity(Action::ALL.len() * ServiceKind::ALL.len() * StoreKind::ALL.len());
    for action in Action::ALL {
        for service in ServiceKind::ALL {
            for store in StoreKind::ALL {
                ops.push(Operation::new(action, service, store));
            }
        }
    }
    ops
}

/// Capture an artifact and hand it to the store
pub fn run_backup(service: &dyn Service, store: &dyn Store) -> Result<PathBuf> {
    let artifact = service.backup()?;
    info!("{} produced {:?}", service.name(), artifact);

    store.upload(&artifact)?;
    info!("Uploaded {:?} to {}", artifact, store.name());

    Ok(artifact)
}

/// Fetch an artifact from the store and restore the service from it
///
/// Without an explicit key the newest artifact for the service is used.
pub fn run_restore(service: &dyn Service, store: &dyn Store, key: Option<&str>) -> Result<PathBuf> {
    let key = match key {
        Some(key) => key.to_string(),
        None => {
            let prefix = service.artifact_prefix();
            let latest = store.latest(&prefix)?.ok_or_else(|| {
                Error::transfer(store.name(), prefix.as_str(), "no artifact found for restore")
            })?;
            info!("No restore key given, using newest artifact {}", latest);
            latest
        }
    };

    let local = store.fetch(&key)?;
    info!("Fetched {} from {} to {:?}", key, store.name(), local);

    service.restore(&local)?;
    info!("{} restored from {:?}", service.name(), local);

    Ok(local)
}
