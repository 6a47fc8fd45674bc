//! Cache and compression policy evaluation.

use crate::config::SiteConfig;
use crate::content::resource::Origin;

/// Cache-Control value for resources that must be revalidated every time.
pub const NO_CACHE: &str = "public, max-age=0, no-cache";

/// Cache-Control directive for a resource with extension `ext`.
///
/// Each origin can be forced to no-cache (disk-streamed resources are by
/// default); otherwise the per-extension table applies, then the default
/// duration.
pub fn cache_control(config: &SiteConfig, origin: Origin, ext: &str) -> String {
    let disabled = match origin {
        Origin::Disk => config.cache.no_cache_from_disk,
        Origin::Memory => config.cache.no_cache_from_mem,
    };
    if disabled {
        return NO_CACHE.to_string();
    }

    let secs = config
        .cache
        .times
        .get(ext)
        .copied()
        .unwrap_or(config.cache.default_secs);

    if secs == 0 {
        NO_CACHE.to_string()
    } else {
        format!("public, max-age={}", secs)
    }
}

/// Checks every gzip condition except the size win.
///
/// Used directly for disk streams, whose compressed size is unknown.
pub fn may_compress(config: &SiteConfig, origin: Origin, ext: &str, plain_len: u64) -> bool {
    let compression = &config.compression;

    let disabled = match origin {
        Origin::Memory => compression.no_compress_from_mem,
        Origin::Disk => compression.no_compress_from_disk,
    };

    !disabled
        && plain_len >= compression.min_size() as u64
        && !compression.is_blacklisted(ext)
}

/// Whether a precomputed gzip variant should be attached.
///
/// Compression must win by at least `min_ratio`:
/// `gzip_len * min_ratio < plain_len`.
pub fn attach_gzip(
    config: &SiteConfig,
    origin: Origin,
    ext: &str,
    plain_len: usize,
    gzip_len: usize,
) -> bool {
    may_compress(config, origin, ext, plain_len as u64)
        && (gzip_len as f64) * config.compression.min_ratio() < plain_len as f64
}
