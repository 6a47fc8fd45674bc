//! Registry loading, fallback and reload tests.

use std::fs;
use std::sync::Arc;

use axum::http::StatusCode;
use vhost_static::content::{Payload, Scheme};
use vhost_static::SiteRegistry;

mod common;
use common::{compressible, incompressible, Fixture};

#[test]
fn test_identical_bytes_share_content() {
    let fixture = Fixture::new();
    fixture
        .write("example.com/http/index.html", "hi")
        .write("example.com/https/index.html", "hi");
    let registry = fixture.registry("");

    let http = registry.fetch(Scheme::Http, "example.com", "/");
    let https = registry.fetch(Scheme::Https, "example.com", "/index.html");

    assert_eq!(http.status, StatusCode::OK);
    assert_eq!(https.status, StatusCode::OK);
    assert_eq!(http.resource.etag(), https.resource.etag());
    assert_eq!(
        http.resource.plain().unwrap().as_ptr(),
        https.resource.plain().unwrap().as_ptr()
    );
    assert_eq!(http.resource.plain().unwrap().as_ref(), b"hi");
}

#[test]
fn test_dedup_spans_hosts() {
    let fixture = Fixture::new();
    let css = compressible(4096);
    fixture
        .write("a.com/common/site.css", &css)
        .write("b.com/http/style/main.css", &css)
        .write("b.com/http/other.txt", "different");
    let registry = fixture.registry("");

    let a = registry.fetch(Scheme::Https, "a.com", "/site.css");
    let b = registry.fetch(Scheme::Http, "b.com", "/style/main.css");

    assert_eq!(a.resource.plain().unwrap().as_ptr(), b.resource.plain().unwrap().as_ptr());
    assert_eq!(a.resource.gzip_etag(), b.resource.gzip_etag());

    let stats = registry.generation().stats();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.plain_bytes, css.len() + "different".len());
}

#[test]
fn test_common_dir_publishes_both_schemes() {
    let fixture = Fixture::new();
    fixture
        .write("example.com/common/shared.txt", "both")
        .write("example.com/http/only-http.txt", "http");
    let registry = fixture.registry("");

    assert_eq!(registry.fetch(Scheme::Http, "example.com", "/shared.txt").status, StatusCode::OK);
    assert_eq!(registry.fetch(Scheme::Https, "example.com", "/shared.txt").status, StatusCode::OK);
    assert_eq!(registry.fetch(Scheme::Http, "example.com", "/only-http.txt").status, StatusCode::OK);
    assert_eq!(
        registry.fetch(Scheme::Https, "example.com", "/only-http.txt").status,
        StatusCode::NOT_FOUND
    );
}

#[test]
fn test_gzip_attached_only_when_it_pays() {
    let fixture = Fixture::new();
    fixture
        .write("example.com/http/big.html", compressible(8192))
        .write("example.com/http/random.bin", incompressible(8192))
        .write("example.com/http/small.html", compressible(100))
        .write("example.com/http/image.zip", compressible(8192))
        .write(
            "example.com/config.toml",
            "[compression]\nblacklist = [\".zip\"]\n",
        );
    let registry = fixture.registry("");

    let fetch = |path| registry.fetch(Scheme::Http, "example.com", path).resource;

    let big = fetch("/big.html");
    assert!(big.gzip_permitted());
    assert!(big.gzip().unwrap().len() < big.plain().unwrap().len());

    for path in ["/random.bin", "/small.html", "/image.zip"] {
        let resource = fetch(path);
        assert!(!resource.gzip_permitted(), "{} should not be compressed", path);
        assert!(resource.gzip().is_none());
    }
}

#[test]
fn test_reload_is_idempotent() {
    let fixture = Fixture::new();
    fixture
        .write("example.com/http/index.html", compressible(2048))
        .write("other.org/common/a.txt", "a");
    let registry = fixture.registry("");

    let before = registry.fetch(Scheme::Http, "example.com", "/");
    let hosts_before: Vec<_> = registry.status().hosts.into_iter().map(|h| h.host).collect();

    registry.load().unwrap();

    let after = registry.fetch(Scheme::Http, "example.com", "/");
    let hosts_after: Vec<_> = registry.status().hosts.into_iter().map(|h| h.host).collect();

    assert_eq!(before.resource.etag(), after.resource.etag());
    assert_eq!(before.resource.gzip_etag(), after.resource.gzip_etag());
    assert_eq!(before.resource.gzip_permitted(), after.resource.gzip_permitted());
    assert_eq!(hosts_before, hosts_after);
    assert_eq!(hosts_after, vec!["example.com".to_string(), "other.org".to_string()]);
}

#[test]
fn test_unknown_host_without_default_is_forbidden() {
    let fixture = Fixture::new();
    fixture.write("example.com/http/index.html", "hi");
    let registry = fixture.registry("");

    let fetched = registry.fetch(Scheme::Http, "unknown.net", "/");
    assert_eq!(fetched.status, StatusCode::FORBIDDEN);
    assert_eq!(fetched.resource.plain().unwrap().as_ref(), b"no such host");
    assert_eq!(fetched.resource.cache_control(), "public, max-age=0, no-cache");
}

#[test]
fn test_unknown_host_uses_custom_403() {
    let fixture = Fixture::new();
    fixture
        .write("example.com/http/index.html", "hi")
        .write("403.html", "<h1>go away</h1>");
    let registry = fixture.registry("");

    let fetched = registry.fetch(Scheme::Https, "unknown.net", "/anything");
    assert_eq!(fetched.status, StatusCode::FORBIDDEN);
    assert_eq!(fetched.resource.plain().unwrap().as_ref(), b"<h1>go away</h1>");
    assert!(registry.status().custom_no_such_host);
}

#[test]
fn test_unknown_host_falls_back_to_default_host() {
    let fixture = Fixture::new();
    fixture.write("example.com/http/index.html", "home");
    let registry = fixture.registry("example.com");

    let fetched = registry.fetch(Scheme::Http, "unknown.net", "/");
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.resource.plain().unwrap().as_ref(), b"home");

    let fetched = registry.fetch(Scheme::Http, "", "/");
    assert_eq!(fetched.status, StatusCode::OK);
}

#[test]
fn test_host_matching_ignores_case_and_port() {
    let fixture = Fixture::new();
    fixture.write("example.com/http/index.html", "home");
    let registry = fixture.registry("");

    let fetched = registry.fetch(Scheme::Http, "EXAMPLE.com:8080", "/");
    assert_eq!(fetched.status, StatusCode::OK);
}

#[test]
fn test_not_found_precedence() {
    let fixture = Fixture::new();
    fixture
        .write("own.com/http/index.html", "own")
        .write("own.com/http/404.html", "own 404")
        .write("plain.com/http/index.html", "plain")
        .write("404.html", "global 404");
    let registry = fixture.registry("");

    let own = registry.fetch(Scheme::Http, "own.com", "/missing");
    assert_eq!(own.status, StatusCode::NOT_FOUND);
    assert_eq!(own.resource.plain().unwrap().as_ref(), b"own 404");

    let plain = registry.fetch(Scheme::Http, "plain.com", "/missing");
    assert_eq!(plain.status, StatusCode::NOT_FOUND);
    assert_eq!(plain.resource.plain().unwrap().as_ref(), b"global 404");

    fixture.remove("404.html");
    registry.load().unwrap();

    let builtin = registry.fetch(Scheme::Http, "plain.com", "/missing");
    assert_eq!(builtin.status, StatusCode::NOT_FOUND);
    assert_eq!(builtin.resource.plain().unwrap().as_ref(), b"no such file");
}

#[test]
fn test_paths_are_cleaned() {
    let fixture = Fixture::new();
    fixture
        .write("example.com/http/index.html", "home")
        .write("example.com/http/docs/guide.html", "guide");
    let registry = fixture.registry("");

    for path in ["/../index.html", "/docs/../index.html", "//index.html", "/./docs/guide.html"] {
        let fetched = registry.fetch(Scheme::Http, "example.com", path);
        assert_eq!(fetched.status, StatusCode::OK, "{}", path);
    }
}

#[test]
fn test_directory_without_default_file_is_skipped() {
    let fixture = Fixture::new();
    fixture
        .write("example.com/http/index.html", "home")
        .write("example.com/http/docs/readme.txt", "readme")
        .write("example.com/http/blog/index.html", "blog");
    let registry = fixture.registry("");

    assert_eq!(registry.fetch(Scheme::Http, "example.com", "/docs").status, StatusCode::NOT_FOUND);
    assert_eq!(registry.fetch(Scheme::Http, "example.com", "/docs/readme.txt").status, StatusCode::OK);

    let blog = registry.fetch(Scheme::Http, "example.com", "/blog");
    assert_eq!(blog.status, StatusCode::OK);
    assert_eq!(blog.resource.plain().unwrap().as_ref(), b"blog");
}

#[test]
fn test_site_policy_applies() {
    let fixture = Fixture::new();
    fixture
        .write("example.com/http/home.html", "home")
        .write("example.com/http/style.css", "body {}")
        .write(
            "example.com/config.toml",
            r#"
            [general]
            default_file = "home.html"

            [cache]
            default_secs = 60

            [cache.times]
            ".css" = 10
            "#,
        );
    let registry = fixture.registry("");

    let home = registry.fetch(Scheme::Http, "example.com", "/");
    assert_eq!(home.status, StatusCode::OK);
    assert_eq!(home.resource.cache_control(), "public, max-age=60");

    let css = registry.fetch(Scheme::Http, "example.com", "/style.css");
    assert_eq!(css.resource.cache_control(), "public, max-age=10");
    assert_eq!(css.resource.content_type(), "text/css; charset=utf-8");
}

#[test]
fn test_invalid_policy_falls_back_to_defaults() {
    let fixture = Fixture::new();
    fixture
        .write("example.com/http/index.html", "home")
        .write("example.com/config.toml", "[cache\ndefault_secs = ");
    let registry = fixture.registry("");

    let fetched = registry.fetch(Scheme::Http, "example.com", "/");
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.resource.cache_control(), "public, max-age=3600");
}

#[test]
fn test_development_mode_sees_new_files() {
    let fixture = Fixture::new();
    fixture.write("example.com/http/index.html", "home");
    let registry = fixture.registry("");
    registry.set_development_mode(true);

    assert_eq!(registry.fetch(Scheme::Http, "example.com", "/new.html").status, StatusCode::NOT_FOUND);

    fixture.write("example.com/http/new.html", "new");

    let fetched = registry.fetch(Scheme::Http, "example.com", "/new.html");
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.resource.plain().unwrap().as_ref(), b"new");
}

#[test]
fn test_production_mode_needs_reload() {
    let fixture = Fixture::new();
    fixture.write("example.com/http/index.html", "home");
    let registry = fixture.registry("");

    fixture.write("example.com/http/new.html", "new");
    assert_eq!(registry.fetch(Scheme::Http, "example.com", "/new.html").status, StatusCode::NOT_FOUND);

    registry.load().unwrap();
    assert_eq!(registry.fetch(Scheme::Http, "example.com", "/new.html").status, StatusCode::OK);
}

#[test]
fn test_failed_load_keeps_previous_generation() {
    let fixture = Fixture::new();
    fixture.write("root/example.com/http/index.html", "home");
    let registry = Arc::new(SiteRegistry::new(fixture.path("root"), ""));
    registry.load().unwrap();

    fs::remove_dir_all(fixture.path("root")).unwrap();
    assert!(registry.load().is_err());

    let fetched = registry.fetch(Scheme::Http, "example.com", "/");
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.resource.plain().unwrap().as_ref(), b"home");
}

#[test]
fn test_fancy_folder_streams_from_disk() {
    let fixture = Fixture::new();
    fixture
        .write("example.com/http/index.html", "home")
        .write("example.com/fancy/f/videos/clip.mp4", compressible(4096))
        .write("example.com/fancy/f/tiny.txt", "tiny")
        .write("example.com/fancy/stripped.mp4", "wrong layout");
    let registry = fixture.registry("");

    let fetched = registry.fetch(Scheme::Http, "example.com", "/f/videos/clip.mp4");
    assert_eq!(fetched.status, StatusCode::OK);
    let resource = &fetched.resource;
    assert!(resource.is_from_disk());
    assert!(matches!(resource.payload(), Payload::Disk(_)));
    assert_eq!(resource.cache_control(), "public, max-age=0, no-cache");
    assert!(resource.etag().starts_with("W/\"") && resource.etag().ends_with("i\""));
    assert!(resource.gzip_etag().ends_with("g\""));
    assert!(resource.gzip_permitted());

    let tiny = registry.fetch(Scheme::Http, "example.com", "/f/tiny.txt");
    assert!(tiny.resource.is_from_disk());
    assert!(!tiny.resource.gzip_permitted());

    let missing = registry.fetch(Scheme::Http, "example.com", "/f/missing.mp4");
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    // Files live under the full request path, prefix included.
    let stripped = registry.fetch(Scheme::Http, "example.com", "/f/stripped.mp4");
    assert_eq!(stripped.status, StatusCode::NOT_FOUND);

    let escape = registry.fetch(Scheme::Http, "example.com", "/f/../../index.html");
    assert_eq!(escape.status, StatusCode::OK);
    assert!(!escape.resource.is_from_disk());
}

#[test]
fn test_fancy_prefix_without_trailing_slash() {
    let fixture = Fixture::new();
    fixture
        .write("example.com/http/index.html", "home")
        .write("example.com/fancy/file.zip", "unrelated")
        .write("example.com/fancy/big/file.zip", "archive")
        .write("example.com/config.toml", "[general]\nfancy_folder = \"/big\"\n");
    let registry = fixture.registry("");

    let sibling = registry.fetch(Scheme::Http, "example.com", "/bigfile.zip");
    assert_eq!(sibling.status, StatusCode::NOT_FOUND);
    assert!(!sibling.resource.is_from_disk());

    let inside = registry.fetch(Scheme::Http, "example.com", "/big/file.zip");
    assert_eq!(inside.status, StatusCode::OK);
    assert!(inside.resource.is_from_disk());
}

#[test]
fn test_fancy_files_cacheable_when_policy_allows() {
    let fixture = Fixture::new();
    fixture
        .write("example.com/http/index.html", "home")
        .write("example.com/fancy/f/clip.mp4", "clip")
        .write(
            "example.com/config.toml",
            r#"
            [cache]
            default_secs = 120
            no_cache_from_disk = false
            "#,
        );
    let registry = fixture.registry("");

    let fetched = registry.fetch(Scheme::Http, "example.com", "/f/clip.mp4");
    assert_eq!(fetched.status, StatusCode::OK);
    assert!(fetched.resource.is_from_disk());
    assert_eq!(fetched.resource.cache_control(), "public, max-age=120");
}

#[test]
fn test_status_snapshot() {
    let fixture = Fixture::new();
    fixture
        .write("b.com/common/index.html", "b")
        .write("a.com/http/index.html", "a")
        .write("404.html", "gone");
    let registry = fixture.registry("a.com");

    let status = registry.status();
    assert_eq!(status.hosts.len(), 2);
    assert_eq!(status.hosts[0].host, "a.com");
    assert_eq!(status.hosts[0].http_resources, 2);
    assert_eq!(status.hosts[0].https_resources, 0);
    assert_eq!(status.hosts[1].https_resources, 2);
    assert_eq!(status.default_host, "a.com");
    assert!(status.custom_no_such_file);
    assert!(!status.custom_no_such_host);
    assert!(status.loaded_at.is_some());
    assert!(status.to_string().starts_with("Sites (2):"));
}

#[tokio::test]
async fn test_async_reload() {
    let fixture = Fixture::new();
    fixture.write("example.com/http/index.html", "v1");
    let registry = fixture.registry("");

    fixture.write("example.com/http/index.html", "v2");
    registry.reload().await.unwrap();

    let fetched = registry.fetch(Scheme::Http, "example.com", "/");
    assert_eq!(fetched.resource.plain().unwrap().as_ref(), b"v2");
}
