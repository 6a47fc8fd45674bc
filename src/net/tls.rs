//! TLS material for the HTTPS listener.

use std::io;
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::HttpsListenerConfig;

/// Load the certificate chain and private key named by `config`.
pub async fn load_tls_config(config: &HttpsListenerConfig) -> Result<RustlsConfig, io::Error> {
    for (what, path) in [("Certificate", &config.cert), ("Private key", &config.key)] {
        if !Path::new(path).exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} file not found: {:?}", what, path),
            ));
        }
    }

    RustlsConfig::from_pem_file(&config.cert, &config.key).await
}
