//! The process-wide site registry.

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use arc_swap::ArcSwap;
use axum::http::StatusCode;

use crate::config::{load_site_config, SiteConfig};
use crate::content::builder::build_resource;
use crate::content::path::clean;
use crate::content::{ContentStats, DedupCache, LoadError, Resource, Scheme, Site, SiteBuilder};
use crate::observability::metrics;
use crate::registry::status::{HostStatus, StatusSnapshot};

/// Per-host policy file name.
pub const SITE_CONFIG_FILE: &str = "config.toml";

/// Root-level file served when no site has the requested path.
pub const NO_SUCH_FILE_PAGE: &str = "404.html";

/// Root-level file served when the host is unknown.
pub const NO_SUCH_HOST_PAGE: &str = "403.html";

/// One complete, immutable snapshot of every site.
#[derive(Debug, Default)]
pub struct Generation {
    sites: HashMap<String, Arc<Site>>,
    no_such_host: Option<Arc<Resource>>,
    no_such_file: Option<Arc<Resource>>,
    stats: ContentStats,
    loaded_at: Option<SystemTime>,
}

impl Generation {
    pub fn site(&self, host: &str) -> Option<&Arc<Site>> {
        self.sites.get(host)
    }

    pub fn sites(&self) -> &HashMap<String, Arc<Site>> {
        &self.sites
    }

    pub fn stats(&self) -> ContentStats {
        self.stats
    }

    pub fn loaded_at(&self) -> Option<SystemTime> {
        self.loaded_at
    }
}

/// The resource chosen for a request and the status to serve it with.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub resource: Arc<Resource>,
    pub status: StatusCode,
}

impl Fetched {
    fn new(resource: Arc<Resource>, status: StatusCode) -> Self {
        Self { resource, status }
    }
}

/// Maps hosts to sites and owns hot reload.
///
/// The current [`Generation`] sits behind an `ArcSwap`: readers take one
/// snapshot per call, and [`load`](Self::load) builds a complete new
/// generation without holding anything before publishing it with a single
/// store. Concurrent loads are allowed; the last store wins.
#[derive(Debug)]
pub struct SiteRegistry {
    root: PathBuf,
    default_host: String,
    development: AtomicBool,
    current: ArcSwap<Generation>,
}

impl SiteRegistry {
    /// Create an empty registry. Nothing is served until [`load`](Self::load)
    /// succeeds.
    pub fn new(root: impl Into<PathBuf>, default_host: &str) -> Self {
        Self {
            root: root.into(),
            default_host: normalize_host(default_host),
            development: AtomicBool::new(false),
            current: ArcSwap::from_pointee(Generation::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Toggle reload-before-every-request.
    pub fn set_development_mode(&self, active: bool) {
        self.development.store(active, Ordering::Relaxed);
    }

    pub fn development_mode(&self) -> bool {
        self.development.load(Ordering::Relaxed)
    }

    /// The current generation.
    pub fn generation(&self) -> Arc<Generation> {
        self.current.load_full()
    }

    /// Rebuild every site from disk and publish the result.
    ///
    /// On error the current generation stays in place.
    pub fn load(&self) -> Result<(), LoadError> {
        let start = Instant::now();
        tracing::info!(root = ?self.root, "Reloading root");

        let generation = match self.build_generation() {
            Ok(generation) => generation,
            Err(e) => {
                metrics::record_reload(false, start);
                return Err(e);
            }
        };

        let stats = generation.stats;
        let hosts = generation.sites.len();
        self.current.store(Arc::new(generation));

        metrics::record_reload(true, start);
        metrics::record_content(&stats);
        tracing::info!(
            hosts,
            files = stats.files,
            plain_bytes = stats.plain_bytes,
            gzip_bytes = stats.gzip_bytes,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Root loaded"
        );
        Ok(())
    }

    /// Run [`load`](Self::load) on the blocking pool.
    pub async fn reload(self: &Arc<Self>) -> Result<(), LoadError> {
        let registry = Arc::clone(self);
        tokio::task::spawn_blocking(move || registry.load())
            .await
            .map_err(|e| LoadError::Task(e.to_string()))?
    }

    fn build_generation(&self) -> Result<Generation, LoadError> {
        let list_err = |source| LoadError::ListRoot {
            path: self.root.clone(),
            source,
        };
        let entries = fs::read_dir(&self.root).map_err(list_err)?;

        let loaded = SystemTime::now();
        let default_config = Arc::new(SiteConfig::default());
        let mut cache = DedupCache::new();
        let mut generation = Generation {
            loaded_at: Some(loaded),
            ..Default::default()
        };

        for entry in entries {
            let entry = entry.map_err(list_err)?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            let metadata = fs::metadata(&path).map_err(|source| LoadError::Read {
                path: path.clone(),
                source,
            })?;

            if !metadata.is_dir() {
                let slot = match name.as_str() {
                    NO_SUCH_FILE_PAGE => &mut generation.no_such_file,
                    NO_SUCH_HOST_PAGE => &mut generation.no_such_host,
                    _ => continue,
                };
                let resource = build_resource(
                    &path,
                    format!("/{}", name),
                    default_config.clone(),
                    &mut cache,
                    loaded,
                )?;
                *slot = Some(Arc::new(resource));
                continue;
            }

            let config = read_site_config(&name, &path);
            let mut builder = SiteBuilder::new(&path, config, &mut cache, loaded);
            builder.add_scheme_dirs()?;
            let site = builder.build();

            tracing::debug!(
                host = %name,
                http = site.resources(Scheme::Http).len(),
                https = site.resources(Scheme::Https).len(),
                "Site built"
            );
            generation.sites.insert(normalize_host(&name), Arc::new(site));
        }

        generation.stats = cache.stats();
        Ok(generation)
    }

    /// Resolve a request to a resource. Never fails: unknown hosts and paths
    /// resolve to fallback pages.
    pub fn fetch(&self, scheme: Scheme, host: &str, path: &str) -> Fetched {
        if self.development_mode() {
            if let Err(e) = self.load() {
                tracing::warn!(error = %e, "Development reload failed, serving current generation");
            }
        }

        let generation = self.current.load_full();

        let host = normalize_host(host);
        let site = match generation
            .site(&host)
            .or_else(|| generation.site(&self.default_host))
        {
            Some(site) => site,
            None => {
                let resource = generation
                    .no_such_host
                    .clone()
                    .unwrap_or_else(Resource::no_such_host);
                return Fetched::new(resource, StatusCode::FORBIDDEN);
            }
        };

        let path = clean(path);

        let found = match fancy_relative(site.config(), &path) {
            Some(relative) => open_fancy(site, &path, relative),
            None => site.get(scheme, &path).cloned(),
        };
        if let Some(resource) = found {
            return Fetched::new(resource, StatusCode::OK);
        }

        let resource = site
            .get(scheme, &format!("/{}", NO_SUCH_FILE_PAGE))
            .cloned()
            .or_else(|| generation.no_such_file.clone())
            .unwrap_or_else(Resource::no_such_file);
        Fetched::new(resource, StatusCode::NOT_FOUND)
    }

    /// Describe the current generation.
    pub fn status(&self) -> StatusSnapshot {
        let generation = self.current.load_full();

        let mut hosts: Vec<HostStatus> = generation
            .sites
            .iter()
            .map(|(host, site)| HostStatus {
                host: host.clone(),
                http_resources: site.resources(Scheme::Http).len(),
                https_resources: site.resources(Scheme::Https).len(),
            })
            .collect();
        hosts.sort_by(|a, b| a.host.cmp(&b.host));

        let stats = generation.stats;
        StatusSnapshot {
            hosts,
            root: self.root.clone(),
            default_host: self.default_host.clone(),
            development: self.development_mode(),
            custom_no_such_host: generation.no_such_host.is_some(),
            custom_no_such_file: generation.no_such_file.is_some(),
            files: stats.files,
            plain_bytes: stats.plain_bytes,
            gzip_bytes: stats.gzip_bytes,
            loaded_at: generation.loaded_at.map(httpdate::fmt_http_date),
        }
    }
}

fn read_site_config(host: &str, dir: &Path) -> Arc<SiteConfig> {
    match load_site_config(&dir.join(SITE_CONFIG_FILE)) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::warn!(host = %host, error = %e, "Cannot read site configuration, using default");
            Arc::new(SiteConfig::default())
        }
    }
}

/// The fancy-directory relative path for a cleaned request path, when it
/// falls under the fancy prefix. The prefix is kept: `/f/a.mp4` maps to
/// `fancy/f/a.mp4`. The prefix only matches whole path segments.
fn fancy_relative<'p>(config: &SiteConfig, path: &'p str) -> Option<&'p str> {
    let prefix = config.general.fancy_folder.as_str();
    if prefix.is_empty() || path.len() <= prefix.len() {
        return None;
    }
    let rest = path.strip_prefix(prefix)?;
    if !prefix.ends_with('/') && !rest.starts_with('/') {
        return None;
    }
    Some(path.trim_start_matches('/'))
}

fn open_fancy(site: &Site, path: &str, relative: &str) -> Option<Arc<Resource>> {
    let disk_path = site.fancy_dir().join(relative);

    let opened = File::open(&disk_path).and_then(|file| {
        let metadata = file.metadata()?;
        Ok((file, metadata))
    });

    match opened {
        Ok((file, metadata)) if metadata.is_file() => Some(Arc::new(Resource::from_disk(
            path,
            file,
            &metadata,
            site.config().clone(),
        ))),
        Ok(_) => {
            tracing::debug!(path = ?disk_path, "Fancy path is not a regular file");
            None
        }
        Err(e) => {
            tracing::debug!(path = ?disk_path, error = %e, "Cannot open fancy file");
            None
        }
    }
}

/// Lowercase a host and strip any port.
pub fn normalize_host(host: &str) -> String {
    let host = if let Some(rest) = host.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else {
        match host.rsplit_once(':') {
            Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
                name
            }
            _ => host,
        }
    };
    host.to_ascii_lowercase()
}
