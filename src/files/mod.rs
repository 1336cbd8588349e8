// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! File collaborator: reading programs, saving units and making workspaces.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub trait FileStore: Send + Sync {
    /// Read the text at a local path or `file://` URI.
    fn load(&self, location: &str) -> io::Result<String>;

    /// Write `text` to `path`, creating missing parent directories.
    fn save(&self, path: &Path, text: &str) -> io::Result<()>;

    /// Create a fresh directory whose name starts with `prefix`.
    /// The caller owns it and is responsible for removing it.
    fn create_temp_dir(&self, prefix: &str) -> io::Result<PathBuf>;
}

#[derive(Debug, Clone, Default)]
pub struct LocalFileStore;

impl LocalFileStore {
    fn local_path(location: &str) -> io::Result<PathBuf> {
        if let Some(rest) = location.strip_prefix("file://") {
            // file://host/path and file:///path both name /path on this machine
            let path = match rest.find('/') {
                Some(0) => rest,
                Some(index) => &rest[index..],
                None => "",
            };
            if path.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("'{}' does not name a file", location),
                ));
            }
            return Ok(PathBuf::from(path));
        }
        match location.split_once("://") {
            Some((scheme, _)) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("cannot load '{}': the '{}' scheme is not supported", location, scheme),
            )),
            None => Ok(PathBuf::from(location)),
        }
    }
}

impl FileStore for LocalFileStore {
    fn load(&self, location: &str) -> io::Result<String> {
        fs::read_to_string(Self::local_path(location)?)
    }

    fn save(&self, path: &Path, text: &str) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)
    }

    fn create_temp_dir(&self, prefix: &str) -> io::Result<PathBuf> {
        Ok(tempfile::Builder::new().prefix(prefix).tempdir()?.keep())
    }
}
