//! S3-compatible object store
//!
//! The AWS SDK is async while the backup pipeline is strictly sequential, so
//! the store owns a current-thread runtime and blocks on every call.

use super::{file_name, Store};
use crate::artifact;
use crate::config::ObjectStoreConfig;
use crate::error::{Error, Result};
use aws_config::SdkConfig;
use aws_sdk_s3 as s3;
use s3::config::{BehaviorVersion, Credentials, Region};
use s3::error::DisplayErrorContext;
use s3::primitives::ByteStream;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::{debug, info};

const STORE: &str = "object-store";

pub struct ObjectStore {
    config: ObjectStoreConfig,
    client: s3::Client,
    runtime: Runtime,
}

impl ObjectStore {
    pub fn new(config: ObjectStoreConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::transfer(STORE, &config.bucket, e))?;

        let sdk_config = runtime.block_on(load_sdk_config(&config));
        let client = s3::Client::from_conf(client_config(&sdk_config, &config));

        Ok(Self {
            config,
            client,
            runtime,
        })
    }

    /// Object key for an artifact name
    fn object_key(&self, name: &str) -> String {
        format!("{}{}", self.config.prefix, name)
    }
}

/// Shared SDK settings: region, optional endpoint and credentials
async fn load_sdk_config(config: &ObjectStoreConfig) -> SdkConfig {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

    if !config.endpoint.is_empty() {
        loader = loader.endpoint_url(&config.endpoint);
    }

    if !config.access_key.is_empty() && !config.secret_key.is_empty() {
        loader = loader.credentials_provider(Credentials::new(
            &config.access_key,
            config.secret_key.expose(),
            None,
            None,
            "s3-backup",
        ));
    } else {
        debug!("No static credentials configured, using the default provider chain");
    }

    loader.load().await
}

fn client_config(sdk_config: &SdkConfig, config: &ObjectStoreConfig) -> s3::Config {
    s3::config::Builder::from(sdk_config)
        .force_path_style(config.force_path_style)
        .build()
}

/// Artifact names of the listed keys that live under `prefix`
fn names_under_prefix<'a>(
    prefix: &'a str,
    keys: &'a [String],
) -> impl Iterator<Item = &'a str> + 'a {
    keys.iter().filter_map(move |key| key.strip_prefix(prefix))
}

impl Store for ObjectStore {
    fn name(&self) -> &'static str {
        STORE
    }

    fn upload(&self, artifact: &Path) -> Result<()> {
        let name = file_name(artifact).ok_or_else(|| {
            Error::transfer(STORE, artifact.display().to_string(), "artifact has no file name")
        })?;
        let key = self.object_key(&name);

        info!(
            "Uploading {:?} to bucket {} with key {}",
            artifact, self.config.bucket, key
        );

        self.runtime.block_on(async {
            let body = ByteStream::from_path(artifact)
                .await
                .map_err(|e| Error::transfer(STORE, &key, e))?;

            self.client
                .put_object()
                .bucket(&self.config.bucket)
                .key(&key)
                .body(body)
                .send()
                .await
                .map_err(|e| Error::transfer(STORE, &key, DisplayErrorContext(&e)))?;

            Ok::<_, Error>(())
        })?;

        info!("Uploaded {} to bucket {}", key, self.config.bucket);
        Ok(())
    }

    fn fetch(&self, name: &str) -> Result<PathBuf> {
        let key = self.object_key(name);
        let local_name = file_name(Path::new(name))
            .ok_or_else(|| Error::transfer(STORE, &key, "key has no file name"))?;
        let dest = self.config.save_dir.join(local_name);

        fs::create_dir_all(&self.config.save_dir).map_err(|e| Error::transfer(STORE, &key, e))?;

        info!(
            "Downloading {} from bucket {} to {:?}",
            key, self.config.bucket, dest
        );

        let bytes = self.runtime.block_on(async {
            let mut object = self
                .client
                .get_object()
                .bucket(&self.config.bucket)
                .key(&key)
                .send()
                .await
                .map_err(|e| Error::transfer(STORE, &key, DisplayErrorContext(&e)))?;

            let mut file = File::create(&dest).map_err(|e| Error::transfer(STORE, &key, e))?;
            let mut total = 0usize;
            while let Some(chunk) = object
                .body
                .try_next()
                .await
                .map_err(|e| Error::transfer(STORE, &key, e))?
            {
                file.write_all(&chunk)
                    .map_err(|e| Error::transfer(STORE, &key, e))?;
                total += chunk.len();
            }
            file.sync_all().map_err(|e| Error::transfer(STORE, &key, e))?;

            Ok::<_, Error>(total)
        })?;

        info!("Downloaded {} bytes from {}", bytes, key);
        Ok(dest)
    }

    fn latest(&self, logical: &str) -> Result<Option<String>> {
        let prefix = self.object_key(&artifact::prefix_for(logical));

        let keys = self.runtime.block_on(async {
            let mut keys = Vec::new();
            let mut pages = self
                .client
                .list_objects_v2()
                .bucket(&self.config.bucket)
                .prefix(&prefix)
                .into_paginator()
                .send();

            while let Some(page) = pages.next().await {
                let page = page.map_err(|e| Error::transfer(STORE, &prefix, DisplayErrorContext(&e)))?;
                keys.extend(page.contents().iter().filter_map(|o| o.key().map(str::to_string)));
            }

            Ok::<_, Error>(keys)
        })?;

        debug!("Found {} objects under {}", keys.len(), prefix);

        let names = names_under_prefix(&self.config.prefix, &keys);
        Ok(artifact::newest(logical, names).map(str::to_string))
    }
}
