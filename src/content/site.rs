//! Per-host content and policy.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::SiteConfig;
use crate::content::resource::Resource;

/// Scheme of an inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schemes a content subtree is published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeSet {
    Http,
    Https,
    Both,
}

impl SchemeSet {
    /// Map a scheme directory name to the schemes it serves.
    ///
    /// `fancy` and unknown directories are not published.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        match name {
            "http" => Some(SchemeSet::Http),
            "https" => Some(SchemeSet::Https),
            "common" => Some(SchemeSet::Both),
            _ => None,
        }
    }

    pub fn includes(&self, scheme: Scheme) -> bool {
        matches!(
            (self, scheme),
            (SchemeSet::Both, _)
                | (SchemeSet::Http, Scheme::Http)
                | (SchemeSet::Https, Scheme::Https)
        )
    }
}

/// Name of the per-host directory streamed from disk.
pub const FANCY_DIR: &str = "fancy";

/// One virtual host: its resources per scheme and its policy.
///
/// A published `Site` is never modified; a reload builds a new one.
#[derive(Debug)]
pub struct Site {
    http: HashMap<String, Arc<Resource>>,
    https: HashMap<String, Arc<Resource>>,
    config: Arc<SiteConfig>,
    dir: PathBuf,
}

impl Site {
    pub(crate) fn new(
        http: HashMap<String, Arc<Resource>>,
        https: HashMap<String, Arc<Resource>>,
        config: Arc<SiteConfig>,
        dir: PathBuf,
    ) -> Self {
        Self {
            http,
            https,
            config,
            dir,
        }
    }

    /// All resources served under `scheme`.
    pub fn resources(&self, scheme: Scheme) -> &HashMap<String, Arc<Resource>> {
        match scheme {
            Scheme::Http => &self.http,
            Scheme::Https => &self.https,
        }
    }

    /// Exact lookup of a cleaned path.
    pub fn get(&self, scheme: Scheme, path: &str) -> Option<&Arc<Resource>> {
        self.resources(scheme).get(path)
    }

    pub fn config(&self) -> &Arc<SiteConfig> {
        &self.config
    }

    /// The host's directory under the content root.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory holding disk-streamed files.
    pub fn fancy_dir(&self) -> PathBuf {
        self.dir.join(FANCY_DIR)
    }
}
