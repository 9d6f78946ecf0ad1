use crate::error::locator::LocatorError;
use crate::locator::{OpenedResource, ResourceLocator};
use crate::virtual_path::ResourceLocation;

use common::ErrorLocation;

use std::io::ErrorKind;
use std::panic::Location;
use std::path::{Component, Path, PathBuf};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::{debug, warn};
use url::Url;

const FILE_SCHEME: &str = "file";

/// Serves locations under `app_base` from a directory on disk.
///
/// `file:` URIs are served only when they point inside `root`.
/// Paths containing `..` are reported as not found.
#[derive(Debug, Clone)]
pub struct FsResourceLocator {
    root: PathBuf,
    app_base: String,
}

impl FsResourceLocator {
    pub fn new(root: impl Into<PathBuf>, app_base: impl Into<String>) -> Self {
        let mut app_base = app_base.into();
        if !app_base.ends_with('/') {
            app_base.push('/');
        }
        Self {
            root: root.into(),
            app_base,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a location to a file under `root`, or `None` when it is outside.
    pub fn map_location(&self, location: &str) -> Option<PathBuf> {
        if let Some(relative) = location.strip_prefix(self.app_base.as_str()) {
            return join_confined(&self.root, relative);
        }

        let url = Url::parse(location).ok()?;
        if url.scheme() != FILE_SCHEME {
            return None;
        }
        // Drops query and fragment; accepts an empty or `localhost` host.
        let absolute = url.to_file_path().ok()?;
        let relative = absolute.strip_prefix(&self.root).ok()?;
        join_confined(&self.root, &relative.to_string_lossy())
    }

    /// Log every file and directory under `root` at debug level.
    pub fn log_tree(&self) {
        if !self.root.exists() {
            debug!("Path does not exist: {}", self.root.display());
            return;
        }
        debug!("Listing files under {}", self.root.display());
        log_directory(&self.root, "");
    }
}

impl ResourceLocator for FsResourceLocator {
    fn open<'a>(
        &'a self,
        location: &'a ResourceLocation,
    ) -> BoxFuture<'a, Result<OpenedResource, LocatorError>> {
        async move {
            let path = self
                .map_location(location.as_str())
                .ok_or_else(|| LocatorError::NotFound {
                    resource: location.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })?;

            let file = tokio::fs::File::open(&path)
                .await
                .map_err(|e| io_error(location, e))?;
            let metadata = file.metadata().await.map_err(|e| io_error(location, e))?;

            if metadata.is_dir() {
                return Err(LocatorError::NotFound {
                    resource: location.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            Ok(OpenedResource::new(Box::new(file)).with_length(metadata.len()))
        }
        .boxed()
    }
}

#[track_caller]
fn io_error(resource: &ResourceLocation, error: std::io::Error) -> LocatorError {
    match error.kind() {
        ErrorKind::NotFound => LocatorError::NotFound {
            resource: resource.to_string(),
            location: ErrorLocation::from(Location::caller()),
        },
        _ => LocatorError::Io {
            resource: resource.to_string(),
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        },
    }
}

fn join_confined(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative.trim_start_matches('/'));
    let mut joined = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => joined.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(joined)
}

fn log_directory(dir: &Path, relative: &str) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to list {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        let child_relative = if relative.is_empty() {
            name
        } else {
            format!("{relative}/{name}")
        };
        let path = entry.path();
        if path.is_dir() {
            debug!("Dir: {child_relative}/");
            log_directory(&path, &child_relative);
        } else {
            debug!("File: {child_relative}");
        }
    }
}
