//! Immutable, servable content units.

use std::fs::{File, Metadata};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::body::Bytes;

use crate::config::SiteConfig;
use crate::content::path::extension;
use crate::content::policy;

/// Where a resource's bytes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Built during a load pass and held in memory.
    Memory,
    /// Opened from the host's fancy directory for a single request.
    Disk,
}

/// Content shared between every resource with identical bytes.
///
/// Cloning is cheap: buffers and tags are reference counted.
#[derive(Debug, Clone)]
pub struct Content {
    pub plain: Bytes,
    pub gzip: Bytes,
    pub etag: Arc<str>,
    pub gzip_etag: Arc<str>,
}

/// The body source of a [`Resource`].
#[derive(Debug)]
pub enum Payload {
    Memory { plain: Bytes, gzip: Option<Bytes> },
    Disk(File),
}

/// One servable entity with its precomputed headers.
///
/// Resources never change after construction; a new version of a file is a
/// new `Resource`.
#[derive(Debug)]
pub struct Resource {
    path: String,
    payload: Payload,
    content_type: String,
    cache_control: String,
    last_modified: SystemTime,
    etag: Arc<str>,
    gzip_etag: Arc<str>,
    gzip_permitted: bool,
    origin: Origin,
    config: Arc<SiteConfig>,
}

impl Resource {
    /// Build an in-memory resource from (possibly shared) content.
    ///
    /// Policy decides whether the gzip variant is kept.
    pub(crate) fn from_content(
        path: impl Into<String>,
        content: Content,
        config: Arc<SiteConfig>,
        loaded: SystemTime,
    ) -> Self {
        let path = path.into();
        let ext = extension(&path);

        let gzip_permitted = policy::attach_gzip(
            &config,
            Origin::Memory,
            ext,
            content.plain.len(),
            content.gzip.len(),
        );
        let cache_control = policy::cache_control(&config, Origin::Memory, ext);
        let content_type = content_type_for(&path);

        Self {
            payload: Payload::Memory {
                plain: content.plain,
                gzip: gzip_permitted.then_some(content.gzip),
            },
            content_type,
            cache_control,
            last_modified: truncate_to_secs(loaded),
            etag: content.etag,
            gzip_etag: content.gzip_etag,
            gzip_permitted,
            origin: Origin::Memory,
            config,
            path,
        }
    }

    /// Wrap an open file for streaming.
    ///
    /// Tags are derived from modification time and size, so the file is
    /// never read here.
    pub(crate) fn from_disk(
        path: impl Into<String>,
        file: File,
        metadata: &Metadata,
        config: Arc<SiteConfig>,
    ) -> Self {
        let path = path.into();
        let ext = extension(&path);
        let modified = metadata.modified().unwrap_or(UNIX_EPOCH);
        let secs = modified
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let size = metadata.len();

        Self {
            payload: Payload::Disk(file),
            content_type: content_type_for(&path),
            cache_control: policy::cache_control(&config, Origin::Disk, ext),
            last_modified: truncate_to_secs(modified),
            etag: format!("W/\"{:x}-{:x}i\"", secs, size).into(),
            gzip_etag: format!("W/\"{:x}-{:x}g\"", secs, size).into(),
            gzip_permitted: policy::may_compress(&config, Origin::Disk, ext, size),
            origin: Origin::Disk,
            config,
            path,
        }
    }

    fn builtin(path: &str, body: &'static str, etag: &str) -> Self {
        Self {
            path: path.to_string(),
            payload: Payload::Memory {
                plain: Bytes::from_static(body.as_bytes()),
                gzip: None,
            },
            content_type: "text/plain; charset=utf-8".to_string(),
            cache_control: policy::NO_CACHE.to_string(),
            last_modified: truncate_to_secs(SystemTime::now()),
            etag: etag.into(),
            gzip_etag: etag.into(),
            gzip_permitted: false,
            origin: Origin::Memory,
            config: Arc::new(SiteConfig::default()),
        }
    }

    /// Built-in resource served for unknown hosts.
    pub fn no_such_host() -> Arc<Resource> {
        static RESOURCE: OnceLock<Arc<Resource>> = OnceLock::new();
        RESOURCE
            .get_or_init(|| Arc::new(Self::builtin("/403.html", "no such host", "W/\"no-such-host\"")))
            .clone()
    }

    /// Built-in resource served for unknown paths.
    pub fn no_such_file() -> Arc<Resource> {
        static RESOURCE: OnceLock<Arc<Resource>> = OnceLock::new();
        RESOURCE
            .get_or_init(|| Arc::new(Self::builtin("/404.html", "no such file", "W/\"no-such-file\"")))
            .clone()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Plain bytes of an in-memory resource.
    pub fn plain(&self) -> Option<&Bytes> {
        match &self.payload {
            Payload::Memory { plain, .. } => Some(plain),
            Payload::Disk(_) => None,
        }
    }

    /// Precomputed gzip bytes, present only when gzip is permitted.
    pub fn gzip(&self) -> Option<&Bytes> {
        match &self.payload {
            Payload::Memory { gzip, .. } => gzip.as_ref(),
            Payload::Disk(_) => None,
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn cache_control(&self) -> &str {
        &self.cache_control
    }

    pub fn last_modified(&self) -> SystemTime {
        self.last_modified
    }

    /// Entity tag of the plain variant.
    pub fn etag(&self) -> &str {
        &self.etag
    }

    /// Entity tag of the gzip variant.
    pub fn gzip_etag(&self) -> &str {
        &self.gzip_etag
    }

    pub fn gzip_permitted(&self) -> bool {
        self.gzip_permitted
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn is_from_disk(&self) -> bool {
        self.origin == Origin::Disk
    }

    pub fn config(&self) -> &Arc<SiteConfig> {
        &self.config
    }
}

/// Content-Type for a path, by extension.
pub fn content_type_for(path: &str) -> String {
    match mime_guess::from_path(path).first() {
        Some(mime) if mime.type_() == mime_guess::mime::TEXT => {
            format!("{}; charset=utf-8", mime.essence_str())
        }
        Some(mime) => mime.essence_str().to_string(),
        None => "text/plain; charset=utf-8".to_string(),
    }
}

/// HTTP dates carry whole seconds; comparisons must too.
fn truncate_to_secs(time: SystemTime) -> SystemTime {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    UNIX_EPOCH + Duration::from_secs(secs)
}
