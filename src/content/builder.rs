//! Content-addressed site building.
//!
//! A [`DedupCache`] lives for exactly one load pass. Every file read during
//! the pass is interned by its SHA-256 digest, so identical bytes anywhere in
//! the root (across paths, schemes and hosts) share one plain buffer, one gzip
//! buffer and one pair of entity tags.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use axum::body::Bytes;
use flate2::{write::GzEncoder, Compression};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::content::path::site_path;
use crate::content::resource::{Content, Resource};
use crate::content::site::{SchemeSet, Site};

/// Error type for building content.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The content root itself could not be listed.
    #[error("cannot list root {path:?}: {source}")]
    ListRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file or directory inside the root could not be read.
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed.
    #[error("cannot walk content tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// The blocking load task did not complete.
    #[error("load task failed: {0}")]
    Task(String),
}

/// Load-pass statistics after deduplication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentStats {
    pub files: usize,
    pub plain_bytes: usize,
    pub gzip_bytes: usize,
}

/// Build-time map from content digest to already computed content.
#[derive(Debug, Default)]
pub struct DedupCache {
    entries: HashMap<[u8; 32], Content>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared content for `bytes`, computing gzip and tags only
    /// the first time these bytes are seen. A failed compression leaves the
    /// cache untouched.
    pub fn intern(&mut self, bytes: Vec<u8>) -> io::Result<Content> {
        let digest: [u8; 32] = Sha256::digest(&bytes).into();

        match self.entries.entry(digest) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let gzip = compress(&bytes)?;
                let gzip_digest = Sha256::digest(&gzip);
                let content = Content {
                    plain: Bytes::from(bytes),
                    gzip: Bytes::from(gzip),
                    etag: format!("\"{}\"", hex::encode(digest)).into(),
                    gzip_etag: format!("\"{}\"", hex::encode(gzip_digest)).into(),
                };
                Ok(entry.insert(content).clone())
            }
        }
    }

    /// Number of distinct contents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> ContentStats {
        self.entries.values().fold(
            ContentStats {
                files: self.entries.len(),
                ..Default::default()
            },
            |mut stats, content| {
                stats.plain_bytes += content.plain.len();
                stats.gzip_bytes += content.gzip.len();
                stats
            },
        )
    }
}

fn compress(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::best());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// Read `path` and build an in-memory resource published at `site_path`.
pub fn build_resource(
    path: &Path,
    site_path: impl Into<String>,
    config: Arc<SiteConfig>,
    cache: &mut DedupCache,
    loaded: SystemTime,
) -> Result<Resource, LoadError> {
    let read_err = |source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    };
    let bytes = fs::read(path).map_err(read_err)?;
    let content = cache.intern(bytes).map_err(read_err)?;
    Ok(Resource::from_content(site_path, content, config, loaded))
}

/// Builds one [`Site`] from a host directory.
pub struct SiteBuilder<'a> {
    dir: PathBuf,
    config: Arc<SiteConfig>,
    cache: &'a mut DedupCache,
    loaded: SystemTime,
    http: HashMap<String, Arc<Resource>>,
    https: HashMap<String, Arc<Resource>>,
}

impl<'a> SiteBuilder<'a> {
    pub fn new(
        dir: impl Into<PathBuf>,
        config: Arc<SiteConfig>,
        cache: &'a mut DedupCache,
        loaded: SystemTime,
    ) -> Self {
        Self {
            dir: dir.into(),
            config,
            cache,
            loaded,
            http: HashMap::new(),
            https: HashMap::new(),
        }
    }

    /// Walk every scheme directory of the host.
    pub fn add_scheme_dirs(&mut self) -> Result<(), LoadError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| LoadError::Read {
            path: self.dir.clone(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| LoadError::Read {
                path: self.dir.clone(),
                source,
            })?;
            let is_dir = entry
                .file_type()
                .map_err(|source| LoadError::Read {
                    path: entry.path(),
                    source,
                })?
                .is_dir();
            if !is_dir {
                continue;
            }

            let name = entry.file_name();
            let Some(schemes) = SchemeSet::from_dir_name(&name.to_string_lossy()) else {
                continue;
            };
            self.add_tree(&entry.path(), schemes)?;
        }

        Ok(())
    }

    /// Publish every file below `root` under `schemes`.
    pub fn add_tree(&mut self, root: &Path, schemes: SchemeSet) -> Result<(), LoadError> {
        for entry in WalkDir::new(root) {
            let entry = entry?;
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let site_path = site_path(relative);
            self.add_path(entry.path(), site_path, schemes)?;
        }
        Ok(())
    }

    /// Publish one path. Directories resolve to their default file and are
    /// skipped when it is missing.
    pub fn add_path(
        &mut self,
        disk_path: &Path,
        site_path: String,
        schemes: SchemeSet,
    ) -> Result<(), LoadError> {
        let metadata = fs::metadata(disk_path).map_err(|source| LoadError::Read {
            path: disk_path.to_path_buf(),
            source,
        })?;

        let file_path = if metadata.is_dir() {
            let index = disk_path.join(&self.config.general.default_file);
            match fs::metadata(&index) {
                Ok(m) if !m.is_dir() => index,
                _ => return Ok(()),
            }
        } else {
            disk_path.to_path_buf()
        };

        let resource = build_resource(
            &file_path,
            site_path.clone(),
            self.config.clone(),
            self.cache,
            self.loaded,
        )?;
        let resource = Arc::new(resource);

        match schemes {
            SchemeSet::Http => {
                self.http.insert(site_path, resource);
            }
            SchemeSet::Https => {
                self.https.insert(site_path, resource);
            }
            SchemeSet::Both => {
                self.http.insert(site_path.clone(), resource.clone());
                self.https.insert(site_path, resource);
            }
        }

        Ok(())
    }

    pub fn build(self) -> Site {
        Site::new(self.http, self.https, self.config, self.dir)
    }
}
