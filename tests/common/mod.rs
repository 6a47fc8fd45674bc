//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::response::Response;
use tempfile::TempDir;

use vhost_static::http::{AccessLog, AccessRecord};
use vhost_static::SiteRegistry;

/// A throwaway content root.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write `content` at `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) -> &Self {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    pub fn remove(&self, relative: &str) -> &Self {
        fs::remove_file(self.path(relative)).unwrap();
        self
    }

    /// A registry over this root, already loaded.
    pub fn registry(&self, default_host: &str) -> Arc<SiteRegistry> {
        let registry = Arc::new(SiteRegistry::new(self.root(), default_host));
        registry.load().unwrap();
        registry
    }
}

/// Text that gzip shrinks well.
pub fn compressible(len: usize) -> Vec<u8> {
    b"static content compresses nicely. "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

/// Bytes gzip cannot shrink.
pub fn incompressible(len: usize) -> Vec<u8> {
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

pub async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub fn request(method: &str, host: &str, uri: &str) -> axum::http::request::Builder {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("host", host)
}

pub fn get(host: &str, uri: &str) -> axum::http::Request<Body> {
    request("GET", host, uri).body(Body::empty()).unwrap()
}

/// Collects access records in memory.
#[derive(Debug, Default)]
pub struct MemoryAccessLog {
    records: Mutex<Vec<AccessRecord>>,
}

impl MemoryAccessLog {
    pub fn records(&self) -> Vec<AccessRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl AccessLog for MemoryAccessLog {
    fn record(&self, record: &AccessRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}
